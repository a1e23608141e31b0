use crate::frame::Flags;

/// Computes the frame-level TRACING/WARNING flags every request-encoding entry point accepts.
/// The CUSTOM_PAYLOAD flag is set separately by whoever actually attaches a payload.
pub fn prepare_flags(with_tracing: bool, with_warnings: bool) -> Flags {
    let mut flags = Flags::empty();
    if with_tracing {
        flags.insert(Flags::TRACING);
    }
    if with_warnings {
        flags.insert(Flags::WARNING);
    }
    flags
}

use crate::frame::{Direction, Flags, Frame, Opcode, Version};

// OPTIONS has an empty body; it exists purely to provoke a SUPPORTED response (and doubles as
// the heartbeat probe once the connection is `ready`).

impl Frame {
    pub fn new_req_options(version: Version) -> Frame {
        Frame::new(
            version,
            Direction::Request,
            Flags::empty(),
            Opcode::Options,
            vec![],
            None,
            vec![],
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_req_options_has_empty_body() {
        let frame = Frame::new_req_options(Version::V4);
        assert_eq!(frame.opcode, Opcode::Options);
        assert!(frame.body.is_empty());
    }
}

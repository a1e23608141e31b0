use std::fmt::Debug;
use std::sync::Arc;

use crate::error;
use crate::load_balancing::NodeDistance;
use crate::retry::ReconnectionPolicy;
use crate::transport::CdrsTransport;

/// Owns the single live connection to one node, reconnecting per `ReconnectionPolicy` when it
/// breaks. `Session` never talks to a `TransportTcp`/`TransportRustls` directly - only through
/// this trait, so load balancing and retry code stay transport-agnostic (§4.4).
pub trait ConnectionManager<T: CdrsTransport>: Debug + NodeDistance + Send + Sync {
    /// Returns the current connection, reconnecting first if it's broken or hasn't been
    /// established yet. `reconnection_policy` governs the backoff between attempts; callers that
    /// want a single best-effort attempt pass `NeverReconnectionPolicy`.
    async fn connection(
        &self,
        reconnection_policy: &dyn ReconnectionPolicy,
    ) -> error::Result<Arc<T>>;
}

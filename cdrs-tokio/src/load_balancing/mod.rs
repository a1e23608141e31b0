//! Policies that pick which node's `ConnectionManager` serves the next request (§4.5).

mod dc_aware_round_robin;
mod random;
mod round_robin;
mod token_aware;
mod whitelist;

pub use dc_aware_round_robin::{DcAwareRoundRobin, NodeDistance};
pub use random::Random;
pub use round_robin::RoundRobin;
pub use token_aware::TokenAwareRoundRobin;
pub use whitelist::{Blacklist, Whitelist};

use std::sync::Arc;

use cassandra_protocol::consistency::Consistency;
use cassandra_protocol::token::Token;

/// A cluster-wide strategy for choosing which node to route the next request to. `CM` is the
/// `ConnectionManager` type each strategy is built over; strategies hold an `Arc<CM>` per node so
/// cloning one out is cheap and the same node can be shared across concurrent requests.
///
/// Implementations use interior mutability (atomics, locks) since `Session` only ever calls
/// these through a shared reference.
pub trait LoadBalancingStrategy<CM> {
    /// Called once with the initial node list, and again whenever the control connection
    /// observes a topology change.
    fn init(&mut self, cluster: Vec<Arc<CM>>);

    /// Picks the next node to try, per the policy's internal rotation/weighting. `None` means the
    /// policy has no nodes to offer (empty cluster).
    fn next(&self) -> Option<Arc<CM>>;

    /// Like `next`, but gives token-aware policies a routing key's token to route straight to the
    /// owning replica (§4.5), and gives DC-aware policies the request's consistency level so they
    /// can decide whether falling back to a remote DC is even allowed (§4.5's
    /// `allow_remote_for_local_cl`). Policies that care about neither ignore both arguments and
    /// defer to `next`; this default is what every such policy gets for free.
    fn next_for_request(&self, _token: Option<Token>, _consistency: Consistency) -> Option<Arc<CM>> {
        self.next()
    }

    /// Number of nodes currently known to the policy.
    fn size(&self) -> usize;

    /// Finds a specific node the policy knows about, e.g. to target a request at one host.
    fn find<F>(&self, filter: F) -> Option<Arc<CM>>
    where
        F: FnMut(&Arc<CM>) -> bool;

    /// Every node currently known to the policy, e.g. to fan a PREPARE out to all of them
    /// (§4.8's prepare-on-all-hosts).
    fn all(&self) -> Vec<Arc<CM>>;
}

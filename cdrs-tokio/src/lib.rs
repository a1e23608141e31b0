//! Async Cassandra driver: connection pooling, load balancing, retries and cluster topology
//! tracking built on top of the wire-level `cassandra-protocol` crate.

pub mod authenticators;
pub mod cluster;
pub mod error;
pub mod events;
pub mod execution_profile;
pub mod load_balancing;
pub mod metrics;
pub mod query;
pub mod retry;
pub mod speculative_execution;
pub mod transport;

/// Re-exported so callers don't need a direct `cassandra-protocol` dependency for the common
/// wire-level types (matches the teacher's convention of re-exporting the protocol crate's
/// modules under its own namespace).
pub mod compression {
    pub use cassandra_protocol::compression::*;
}

pub mod frame {
    pub use cassandra_protocol::frame::*;
}

pub mod types {
    pub use cassandra_protocol::types::*;
}

pub mod consistency {
    pub use cassandra_protocol::consistency::*;
}

pub use cassandra_protocol::frame::Version;

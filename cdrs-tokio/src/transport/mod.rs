//! The connection abstraction (called "transport" throughout, matching the teacher): a socket
//! plus a stream-id multiplexer plus the startup state machine (§4.1).

pub mod stream_id_manager;
pub mod tcp;

#[cfg(feature = "rust-tls")]
pub mod rustls;

use std::fmt::Debug;
use std::net::SocketAddr;

use cassandra_protocol::frame::Frame;

use crate::error;

pub use tcp::TransportTcp;

#[cfg(feature = "rust-tls")]
pub use self::rustls::TransportRustls;

/// What a request handler, pool, and control connection all need from a live connection,
/// independent of whether it's plain TCP or TLS-wrapped.
pub trait CdrsTransport: Debug + Sized {
    /// Writes a request frame, assigning it a stream id, and awaits its matching response.
    async fn write_frame(&self, frame: &Frame) -> error::Result<Frame>;

    /// True once the connection has failed irrecoverably (socket error, protocol violation,
    /// decoder desync) and must be replaced rather than reused.
    fn is_broken(&self) -> bool;

    fn address(&self) -> SocketAddr;

    /// Keyspace last set via a successful `USE` on this connection, if any.
    fn keyspace(&self) -> Option<String>;

    fn set_keyspace(&self, keyspace: Option<String>);

    /// Number of stream ids currently in flight; used by the pool to pick the least-busy
    /// connection.
    fn in_flight(&self) -> usize;
}

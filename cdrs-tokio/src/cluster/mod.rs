//! Cluster-level plumbing: per-node configuration, connection managers, topology tracking and
//! the `Session` built on top of all three (§4.4-§4.9).

pub mod config;
pub mod connection_manager;
pub mod connection_pool;
pub mod control_connection;
pub mod session;
pub mod session_pager;
pub mod tcp_connection_manager;
pub mod topology;

#[cfg(feature = "rust-tls")]
pub mod rustls_connection_manager;

pub use config::{
    ClusterTcpConfig, GenericClusterConfig, GetRetryPolicy, KeyspaceHolder, NodeAddress,
    NodeTcpConfig, NodeTcpConfigBuilder,
};
pub use connection_manager::ConnectionManager;
pub use control_connection::ControlConnection;
pub use session::{connect_generic_static, Session, SessionBuilder, TcpSessionBuilder};
pub use session_pager::SessionPager;
pub use tcp_connection_manager::TcpConnectionManager;
pub use topology::{Host, HostMap, HostState};

#[cfg(feature = "rust-tls")]
pub use config::{ClusterRustlsConfig, NodeRustlsConfig, NodeRustlsConfigBuilder};
#[cfg(feature = "rust-tls")]
pub use rustls_connection_manager::RustlsConnectionManager;
#[cfg(feature = "rust-tls")]
pub use session::RustlsSessionBuilder;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::lookup_host;
use tokio::sync::mpsc::Sender;

use crate::authenticators::{NoneAuthenticatorProvider, SaslAuthenticatorProvider};
use crate::cluster::connection_manager::ConnectionManager;
use crate::error;
use crate::frame::events::SimpleServerEvent;
use crate::frame::frame_event::ServerEvent;
use crate::retry::RetryPolicy;
use crate::transport::CdrsTransport;

/// Shared, mutable keyspace state for every connection manager belonging to one `Session` (§4.4):
/// a `USE` issued on one connection is re-applied to every other connection (existing and future)
/// so subsequent queries see a consistent keyspace regardless of which node answers them.
#[derive(Debug, Default)]
pub struct KeyspaceHolder {
    current_keyspace: Mutex<Option<String>>,
}

impl KeyspaceHolder {
    pub fn current_keyspace(&self) -> Option<String> {
        self.current_keyspace.lock().unwrap().clone()
    }

    pub fn update_keyspace(&self, keyspace: &str) {
        *self.current_keyspace.lock().unwrap() = Some(keyspace.to_string());
    }
}

/// Something a `Session` exposes so `request_handler`/`query::utils::send_frame` can look up the
/// active retry policy without the caller threading it through every call.
pub trait GetRetryPolicy {
    fn retry_policy(&self) -> &dyn RetryPolicy;
}

/// A node address as given to a config builder: either already resolved, or a hostname resolved
/// lazily at `build()` time (may expand to several `SocketAddr`s, e.g. a round-robin DNS record).
#[derive(Debug, Clone)]
pub enum NodeAddress {
    Resolved(SocketAddr),
    Hostname(String),
}

impl From<SocketAddr> for NodeAddress {
    fn from(addr: SocketAddr) -> Self {
        NodeAddress::Resolved(addr)
    }
}

impl From<&str> for NodeAddress {
    fn from(hostname: &str) -> Self {
        NodeAddress::Hostname(hostname.to_string())
    }
}

impl NodeAddress {
    async fn resolve(&self) -> error::Result<Vec<SocketAddr>> {
        match self {
            NodeAddress::Resolved(addr) => Ok(vec![*addr]),
            NodeAddress::Hostname(hostname) => lookup_host(hostname)
                .await
                .map(|addrs| addrs.collect())
                .map_err(error::Error::Io),
        }
    }
}

/// Per-node configuration for a plain-TCP connection.
#[derive(Clone)]
pub struct NodeTcpConfig {
    pub addr: SocketAddr,
    pub authenticator_provider: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
    pub event_sender: Option<Sender<ServerEvent>>,
}

impl std::fmt::Debug for NodeTcpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTcpConfig")
            .field("addr", &self.addr)
            .finish()
    }
}

pub struct NodeTcpConfigBuilder {
    addresses: Vec<NodeAddress>,
    authenticator_provider: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
    event_sender: Option<Sender<ServerEvent>>,
}

impl Default for NodeTcpConfigBuilder {
    fn default() -> Self {
        NodeTcpConfigBuilder {
            addresses: Vec::new(),
            authenticator_provider: Arc::new(NoneAuthenticatorProvider),
            event_sender: None,
        }
    }
}

impl NodeTcpConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_address(mut self, address: NodeAddress) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn with_authenticator_provider(
        mut self,
        provider: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
    ) -> Self {
        self.authenticator_provider = provider;
        self
    }

    pub fn with_event_sender(mut self, sender: Sender<ServerEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    pub async fn build(self) -> error::Result<ClusterTcpConfig> {
        let mut nodes = Vec::new();

        for address in &self.addresses {
            for addr in address.resolve().await? {
                nodes.push(NodeTcpConfig {
                    addr,
                    authenticator_provider: self.authenticator_provider.clone(),
                    event_sender: self.event_sender.clone(),
                });
            }
        }

        Ok(ClusterTcpConfig(nodes))
    }
}

/// A resolved list of TCP node configs, ready to be turned into `TcpConnectionManager`s.
#[derive(Clone)]
pub struct ClusterTcpConfig(pub Vec<NodeTcpConfig>);

/// Event kinds a session can `REGISTER` for; re-exported at this level so callers configuring a
/// session don't need a direct `cassandra-protocol` dependency just for this enum.
pub type EventKind = SimpleServerEvent;

/// Abstraction over `ClusterTcpConfig`/`ClusterRustlsConfig` for `connect_generic_static`: given
/// one address, produces the matching `ConnectionManager`.
pub trait GenericClusterConfig<T: CdrsTransport, CM: ConnectionManager<T>> {
    type Address;

    async fn create_manager(&self, address: Self::Address) -> error::Result<CM>;
}

#[cfg(feature = "rust-tls")]
mod rustls_config {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use rustls_pki_types::ServerName;
    use tokio::sync::mpsc::Sender;

    use crate::authenticators::{NoneAuthenticatorProvider, SaslAuthenticatorProvider};
    use crate::error;
    use crate::frame::frame_event::ServerEvent;

    use super::NodeAddress;

    /// Per-node configuration for a TLS connection.
    #[derive(Clone)]
    pub struct NodeRustlsConfig {
        pub addr: SocketAddr,
        pub dns_name: ServerName<'static>,
        pub client_config: Arc<tokio_rustls::rustls::ClientConfig>,
        pub authenticator_provider: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
        pub event_sender: Option<Sender<ServerEvent>>,
    }

    impl std::fmt::Debug for NodeRustlsConfig {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("NodeRustlsConfig")
                .field("addr", &self.addr)
                .finish()
        }
    }

    pub struct NodeRustlsConfigBuilder {
        dns_name: ServerName<'static>,
        client_config: Arc<tokio_rustls::rustls::ClientConfig>,
        addresses: Vec<NodeAddress>,
        authenticator_provider: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
        event_sender: Option<Sender<ServerEvent>>,
    }

    impl NodeRustlsConfigBuilder {
        pub fn new(dns_name: ServerName<'static>, client_config: Arc<tokio_rustls::rustls::ClientConfig>) -> Self {
            NodeRustlsConfigBuilder {
                dns_name,
                client_config,
                addresses: Vec::new(),
                authenticator_provider: Arc::new(NoneAuthenticatorProvider),
                event_sender: None,
            }
        }

        pub fn with_node_address(mut self, address: NodeAddress) -> Self {
            self.addresses.push(address);
            self
        }

        pub fn with_authenticator_provider(
            mut self,
            provider: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
        ) -> Self {
            self.authenticator_provider = provider;
            self
        }

        pub fn with_event_sender(mut self, sender: Sender<ServerEvent>) -> Self {
            self.event_sender = Some(sender);
            self
        }

        pub async fn build(self) -> error::Result<ClusterRustlsConfig> {
            let mut nodes = Vec::new();

            for address in &self.addresses {
                for addr in address.resolve().await? {
                    nodes.push(NodeRustlsConfig {
                        addr,
                        dns_name: self.dns_name.clone(),
                        client_config: self.client_config.clone(),
                        authenticator_provider: self.authenticator_provider.clone(),
                        event_sender: self.event_sender.clone(),
                    });
                }
            }

            Ok(ClusterRustlsConfig(nodes))
        }
    }

    #[derive(Clone)]
    pub struct ClusterRustlsConfig(pub Vec<NodeRustlsConfig>);
}

#[cfg(feature = "rust-tls")]
pub use rustls_config::{ClusterRustlsConfig, NodeRustlsConfig, NodeRustlsConfigBuilder};

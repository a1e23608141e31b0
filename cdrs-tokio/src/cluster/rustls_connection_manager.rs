use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use cassandra_protocol::compression::Compression;
use cassandra_protocol::frame::events::SimpleServerEvent;
use cassandra_protocol::frame::Version;
use tokio_rustls::TlsConnector;

use crate::cluster::config::{KeyspaceHolder, NodeRustlsConfig};
use crate::cluster::connection_manager::ConnectionManager;
use crate::cluster::connection_pool::ConnectionPool;
use crate::error;
use crate::load_balancing::NodeDistance;
use crate::metrics::Metrics;
use crate::retry::ReconnectionPolicy;
use crate::transport::TransportRustls;

fn all_event_kinds() -> Vec<SimpleServerEvent> {
    vec![
        SimpleServerEvent::TopologyChange,
        SimpleServerEvent::StatusChange,
        SimpleServerEvent::SchemaChange,
    ]
}

/// TLS analogue of `TcpConnectionManager`, sharing the same per-slot lazy-establish/arc-swap-
/// replace pattern, pooled the same way (§4.4).
#[derive(Debug)]
pub struct RustlsConnectionManager {
    config: NodeRustlsConfig,
    keyspace_holder: Arc<KeyspaceHolder>,
    compression: Compression,
    version: Version,
    tcp_nodelay: bool,
    metrics: Arc<Metrics>,
    pool: ConnectionPool<TransportRustls>,
}

impl RustlsConnectionManager {
    pub fn new(
        config: NodeRustlsConfig,
        keyspace_holder: Arc<KeyspaceHolder>,
        compression: Compression,
        version: Version,
        tcp_nodelay: bool,
        metrics: Arc<Metrics>,
        connections_per_node: usize,
    ) -> Self {
        RustlsConnectionManager {
            config,
            keyspace_holder,
            compression,
            version,
            tcp_nodelay,
            metrics,
            pool: ConnectionPool::new(connections_per_node),
        }
    }

    async fn establish(
        &self,
        slot: &ArcSwapOption<TransportRustls>,
    ) -> error::Result<Arc<TransportRustls>> {
        let event_types = if self.config.event_sender.is_some() {
            all_event_kinds()
        } else {
            Vec::new()
        };
        let connector = TlsConnector::from(self.config.client_config.clone());
        let transport = TransportRustls::new(
            self.config.addr,
            self.config.dns_name.clone(),
            connector,
            self.version,
            self.compression,
            self.tcp_nodelay,
            self.keyspace_holder.current_keyspace(),
            Some(self.config.authenticator_provider.clone()),
            event_types,
            self.config.event_sender.clone(),
        )
        .await?;

        let transport = Arc::new(transport);
        if slot.swap(Some(transport.clone())).is_some() {
            self.metrics.connection_closed();
        }
        self.metrics.connection_opened();
        Ok(transport)
    }
}

impl NodeDistance for RustlsConnectionManager {
    fn addr(&self) -> SocketAddr {
        self.config.addr
    }
}

impl ConnectionManager<TransportRustls> for RustlsConnectionManager {
    async fn connection(
        &self,
        reconnection_policy: &dyn ReconnectionPolicy,
    ) -> error::Result<Arc<TransportRustls>> {
        self.pool
            .connection(reconnection_policy, |slot| self.establish(slot))
            .await
    }
}

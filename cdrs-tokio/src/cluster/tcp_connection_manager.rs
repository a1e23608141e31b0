use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use cassandra_protocol::compression::Compression;
use cassandra_protocol::frame::events::SimpleServerEvent;
use cassandra_protocol::frame::Version;

use crate::cluster::config::{KeyspaceHolder, NodeTcpConfig};
use crate::cluster::connection_manager::ConnectionManager;
use crate::cluster::connection_pool::ConnectionPool;
use crate::error;
use crate::load_balancing::NodeDistance;
use crate::metrics::Metrics;
use crate::retry::ReconnectionPolicy;
use crate::transport::TransportTcp;

fn all_event_kinds() -> Vec<SimpleServerEvent> {
    vec![
        SimpleServerEvent::TopologyChange,
        SimpleServerEvent::StatusChange,
        SimpleServerEvent::SchemaChange,
    ]
}

/// One node's pool of plain-TCP connections (§4.4), each lazily established and transparently
/// replaced on breakage. `arc-swap` lets concurrent callers read a slot's current connection
/// without blocking each other; reconnection is serialized per slot by only swapping in a
/// freshly-built transport once it succeeds.
#[derive(Debug)]
pub struct TcpConnectionManager {
    config: NodeTcpConfig,
    keyspace_holder: Arc<KeyspaceHolder>,
    compression: Compression,
    version: Version,
    tcp_nodelay: bool,
    metrics: Arc<Metrics>,
    pool: ConnectionPool<TransportTcp>,
}

impl TcpConnectionManager {
    pub fn new(
        config: NodeTcpConfig,
        keyspace_holder: Arc<KeyspaceHolder>,
        compression: Compression,
        version: Version,
        tcp_nodelay: bool,
        metrics: Arc<Metrics>,
        connections_per_node: usize,
    ) -> Self {
        TcpConnectionManager {
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
        slot: &ArcSwapOption<TransportTcp>,
    ) -> error::Result<Arc<TransportTcp>> {
        let event_types = if self.config.event_sender.is_some() {
            all_event_kinds()
        } else {
            Vec::new()
        };
        let transport = TransportTcp::new(
            self.config.addr,
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

impl NodeDistance for TcpConnectionManager {
    fn addr(&self) -> SocketAddr {
        self.config.addr
    }
}

impl ConnectionManager<TransportTcp> for TcpConnectionManager {
    async fn connection(
        &self,
        reconnection_policy: &dyn ReconnectionPolicy,
    ) -> error::Result<Arc<TransportTcp>> {
        self.pool
            .connection(reconnection_policy, |slot| self.establish(slot))
            .await
    }
}

//! Singleton connection that discovers cluster topology from `system.local`/`system.peers` and
//! keeps the host map current from pushed `TOPOLOGY_CHANGE`/`STATUS_CHANGE`/`SCHEMA_CHANGE`
//! events (§4.6). Independent of per-request timeouts: a schema rebuild can legitimately take
//! longer than an application query is allowed to.

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::Duration;

use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use cassandra_protocol::frame::frame_event::{ServerEvent, TopologyChangeType};
use cassandra_protocol::frame::frame_result::Row;
use cassandra_protocol::frame::{Frame, Version};
use cassandra_protocol::query::utils::prepare_flags;
use cassandra_protocol::query::{Query, QueryParamsBuilder};

use crate::cluster::connection_manager::ConnectionManager;
use crate::cluster::topology::{Host, HostMap, HostState};
use crate::error;
use crate::retry::ReconnectionPolicy;
use crate::transport::CdrsTransport;

const SELECT_LOCAL: &str =
    "SELECT data_center, rack, tokens, schema_version, release_version, host_id FROM system.local WHERE key='local'";
const SELECT_PEERS: &str = "SELECT peer, rpc_address, data_center, rack, tokens, schema_version, release_version, host_id FROM system.peers";

/// Discovers and tracks cluster topology over one dedicated connection.
pub struct ControlConnection<T: CdrsTransport + Send + Sync + 'static, CM: ConnectionManager<T>> {
    connection_manager: Arc<CM>,
    hosts: Arc<StdRwLock<HostMap>>,
    version: Version,
    listen_addr_to_host: Arc<StdRwLock<Vec<(SocketAddr, SocketAddr)>>>,
    _transport: PhantomData<T>,
}

impl<T: CdrsTransport + Send + Sync + 'static, CM: ConnectionManager<T>> ControlConnection<T, CM> {
    /// Connects, runs the discovery queries and returns the control connection with an already
    /// populated host map. Call [`Self::spawn_event_loop`] afterwards to keep it current.
    pub async fn init(
        connection_manager: Arc<CM>,
        version: Version,
        reconnection_policy: &dyn ReconnectionPolicy,
    ) -> error::Result<Self> {
        let control = ControlConnection {
            connection_manager,
            hosts: Arc::new(StdRwLock::new(HostMap::default())),
            version,
            listen_addr_to_host: Arc::new(StdRwLock::new(Vec::new())),
            _transport: PhantomData,
        };

        control.refresh_topology(reconnection_policy).await?;
        Ok(control)
    }

    /// Snapshot of the current host map.
    pub fn hosts(&self) -> HostMap {
        self.hosts.read().unwrap().clone()
    }

    /// Resolves a peer's `peer` column (its listen address) to the `rpc_address` the driver
    /// actually connects through, for event handlers that only receive the listen address.
    pub fn rpc_address_for_listen_addr(&self, listen_addr: &SocketAddr) -> Option<SocketAddr> {
        self.listen_addr_to_host
            .read()
            .unwrap()
            .iter()
            .find(|(listen, _)| listen == listen_addr)
            .map(|(_, rpc)| *rpc)
    }

    /// Spawns a background task that consumes `event_receiver` and applies topology/status/schema
    /// changes to the host map as they arrive. Dropping the returned handle does not stop the
    /// task; abort it explicitly if that's needed.
    pub fn spawn_event_loop(
        self: &Arc<Self>,
        mut event_receiver: Receiver<ServerEvent>,
        reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
    ) -> JoinHandle<()>
    where
        CM: 'static,
        T: 'static,
    {
        let control = self.clone();
        tokio::spawn(async move {
            while let Some(event) = event_receiver.recv().await {
                control.handle_event(event, reconnection_policy.as_ref()).await;
            }
        })
    }

    async fn handle_event(&self, event: ServerEvent, reconnection_policy: &dyn ReconnectionPolicy) {
        match event {
            ServerEvent::TopologyChange { change_type, addr } => match change_type {
                TopologyChangeType::NewNode | TopologyChangeType::RemovedNode => {
                    if let Err(err) = self.refresh_topology(reconnection_policy).await {
                        warn!(error = %err, %addr, "failed to refresh topology after topology change event");
                    }
                }
            },
            ServerEvent::StatusChange { change_type, addr } => {
                let state = match change_type {
                    cassandra_protocol::frame::frame_event::StatusChangeType::Up => HostState::Up,
                    cassandra_protocol::frame::frame_event::StatusChangeType::Down => {
                        HostState::Down
                    }
                };
                self.hosts.write().unwrap().set_state(&addr, state);

                if state == HostState::Up {
                    if let Err(err) = self.refresh_topology(reconnection_policy).await {
                        warn!(error = %err, %addr, "failed to refresh host row after UP event");
                    }
                }
            }
            ServerEvent::SchemaChange(change) => {
                // Schema metadata snapshotting itself isn't modeled yet; the minimal, honest
                // behavior is to just note the change happened rather than silently drop it.
                tracing::debug!(?change, "schema change observed");
            }
        }
    }

    async fn refresh_topology(
        &self,
        reconnection_policy: &dyn ReconnectionPolicy,
    ) -> error::Result<()> {
        let transport = self.connection_manager.connection(reconnection_policy).await?;

        let local_host = self.query_local(transport.as_ref()).await?;
        let peer_hosts = self.query_peers(transport.as_ref()).await?;

        let mut hosts = HostMap::default();
        if let Some(host) = local_host {
            hosts.upsert(host);
        }
        for host in peer_hosts {
            hosts.upsert(host);
        }

        *self.hosts.write().unwrap() = hosts;
        Ok(())
    }

    async fn query_local(&self, transport: &T) -> error::Result<Option<Host>> {
        let rows = self.run_query(transport, SELECT_LOCAL).await?;
        let Some(rows) = rows else {
            return Ok(None);
        };

        let addr = transport.address();
        rows.rows
            .iter()
            .next()
            .map(|row| Self::row_to_host(&rows.metadata, row, addr))
            .transpose()
    }

    async fn query_peers(&self, transport: &T) -> error::Result<Vec<Host>> {
        let rows = self.run_query(transport, SELECT_PEERS).await?;
        let Some(rows) = rows else {
            return Ok(Vec::new());
        };

        let mut hosts = Vec::with_capacity(rows.rows.len());
        let mut listen_index = Vec::with_capacity(rows.rows.len());

        for row in &rows.rows {
            let rpc_address = Row::decode_inet(&cell(&rows.metadata, row, "rpc_address"))?;
            let peer = Row::decode_inet(&cell(&rows.metadata, row, "peer"))?;

            let ip = match rpc_address.or(peer) {
                Some(ip) => ip,
                None => {
                    warn!("system.peers row with no rpc_address or peer; skipping");
                    continue;
                }
            };

            let addr = SocketAddr::new(ip, transport.address().port());
            if let Some(peer_ip) = peer {
                listen_index.push((SocketAddr::new(peer_ip, addr.port()), addr));
            }

            hosts.push(Self::row_to_host(&rows.metadata, row, addr)?);
        }

        *self.listen_addr_to_host.write().unwrap() = listen_index;
        Ok(hosts)
    }

    async fn run_query(
        &self,
        transport: &T,
        query: &str,
    ) -> error::Result<Option<cassandra_protocol::frame::frame_result::BodyResResultRows>> {
        let params = QueryParamsBuilder::new().finalize();
        let flags = prepare_flags(false, false);
        let frame = Frame::new_query(
            self.version,
            Query {
                query: query.to_string(),
                params,
            },
            flags,
        );

        let response = transport.write_frame(&frame).await?;
        let body = response.body()?;
        if let Some(error) = body.clone().into_error() {
            return Err(error::Error::Server(error));
        }

        Ok(body.into_rows())
    }

    fn row_to_host(
        metadata: &cassandra_protocol::frame::frame_result::RowsMetadata,
        row: &Row,
        addr: SocketAddr,
    ) -> error::Result<Host> {
        let datacenter = Row::decode_text(&cell(metadata, row, "data_center"))?;
        let rack = Row::decode_text(&cell(metadata, row, "rack"))?;
        let release_version = Row::decode_text(&cell(metadata, row, "release_version"))?;
        let host_id =
            Row::decode_uuid(&cell(metadata, row, "host_id"))?.unwrap_or_else(Uuid::nil);
        let tokens = Row::decode_text_collection(&cell(metadata, row, "tokens"))?
            .into_iter()
            .filter_map(|token| token.parse().ok())
            .collect();

        Ok(Host {
            addr,
            host_id,
            datacenter,
            rack,
            tokens,
            release_version,
            state: HostState::Up,
        })
    }

    /// Polls `system.local`/`system.peers` until every known host reports the same
    /// `schema_version`, or `max_wait` elapses (§4.9). A timeout is not an error: the caller's
    /// mutation already completed, this is purely an optional convenience wait.
    pub async fn wait_for_schema_agreement(
        &self,
        reconnection_policy: &dyn ReconnectionPolicy,
        max_wait: Duration,
    ) -> error::Result<bool> {
        let deadline = tokio::time::Instant::now() + max_wait;

        loop {
            let transport = self.connection_manager.connection(reconnection_policy).await?;
            let local_version = self.schema_version(transport.as_ref(), SELECT_LOCAL).await?;
            let peer_versions = self
                .schema_versions(transport.as_ref(), SELECT_PEERS)
                .await?;

            let agrees = local_version
                .map(|local| peer_versions.iter().all(|v| v == &local))
                .unwrap_or(false);

            if agrees {
                return Ok(true);
            }

            if tokio::time::Instant::now() >= deadline {
                warn!("schema agreement wait timed out");
                return Ok(false);
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    async fn schema_version(&self, transport: &T, query: &str) -> error::Result<Option<Uuid>> {
        let rows = self.run_query(transport, query).await?;
        let Some(rows) = rows else {
            return Ok(None);
        };

        match rows.rows.first() {
            Some(row) => Row::decode_uuid(&cell(&rows.metadata, row, "schema_version")),
            None => Ok(None),
        }
    }

    async fn schema_versions(&self, transport: &T, query: &str) -> error::Result<Vec<Uuid>> {
        let rows = self.run_query(transport, query).await?;
        let Some(rows) = rows else {
            return Ok(Vec::new());
        };

        rows.rows
            .iter()
            .filter_map(|row| {
                Row::decode_uuid(&cell(&rows.metadata, row, "schema_version")).transpose()
            })
            .collect()
    }
}

fn cell(
    metadata: &cassandra_protocol::frame::frame_result::RowsMetadata,
    row: &Row,
    name: &str,
) -> Option<Vec<u8>> {
    row.get_by_name(metadata, name).cloned().flatten()
}

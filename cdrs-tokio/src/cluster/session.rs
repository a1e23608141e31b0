use std::collections::HashMap;
use std::marker::PhantomData;
#[cfg(feature = "rust-tls")]
use std::net;
use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::mpsc::channel as std_channel;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc::channel;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use cassandra_protocol::consistency::Consistency;
use cassandra_protocol::token::{murmur3_token, Token};

use crate::authenticators::SaslAuthenticatorProvider;
use crate::cluster::connection_manager::ConnectionManager;
use crate::cluster::control_connection::ControlConnection;
#[cfg(feature = "rust-tls")]
use crate::cluster::rustls_connection_manager::RustlsConnectionManager;
use crate::cluster::tcp_connection_manager::TcpConnectionManager;
#[cfg(feature = "rust-tls")]
use crate::cluster::ClusterRustlsConfig;
#[cfg(feature = "rust-tls")]
use crate::cluster::NodeRustlsConfigBuilder;
use crate::cluster::{ClusterTcpConfig, GenericClusterConfig, GetRetryPolicy, KeyspaceHolder};
use crate::cluster::{NodeTcpConfigBuilder, SessionPager};
use crate::compression::Compression;
use crate::error;
use crate::events::{new_listener, EventStream, EventStreamNonBlocking, Listener};
use crate::execution_profile::ExecutionProfile;
use crate::frame::events::SimpleServerEvent;
use crate::frame::frame_result::BodyResResultPrepared;
use crate::frame::{Frame, Version};
use crate::load_balancing::LoadBalancingStrategy;
use crate::metrics::Metrics;
use crate::query::utils::{prepare_flags, send_frame_routed};
use crate::query::{
    PreparedQuery, Query, QueryBatch, QueryParams, QueryParamsBuilder, QueryValues,
};
use crate::retry::{
    DefaultRetryPolicy, ExponentialReconnectionPolicy, NeverReconnectionPolicy, ReconnectionPolicy,
    RetryPolicy,
};
use crate::speculative_execution::{NoSpeculativeExecutionPolicy, SpeculativeExecutionPolicy};
#[cfg(feature = "rust-tls")]
use crate::transport::TransportRustls;
use crate::transport::{CdrsTransport, TransportTcp};

static NEVER_RECONNECTION_POLICY: NeverReconnectionPolicy = NeverReconnectionPolicy;

/// CQL binary protocol version spoken by a session absent any explicit `with_version` override.
pub const DEFAULT_PROTOCOL_VERSION: Version = Version::V4;

/// Per-request timeout applied absent an explicit `with_request_timeout` override (§5).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of requests a session admits concurrently absent an explicit
/// `with_request_queue_size` override (§4.7). Submissions beyond this fail fast with
/// `Error::RequestQueueFull` rather than queuing unboundedly.
pub const DEFAULT_REQUEST_QUEUE_SIZE: usize = 8192;

/// Whether a successful PREPARE is opportunistically fanned out to every other known host (§4.8)
/// absent an explicit `with_prepare_on_all_nodes` override.
pub const DEFAULT_PREPARE_ON_ALL_NODES: bool = true;

fn routing_token(routing_key: &Option<Vec<u8>>) -> Option<Token> {
    routing_key.as_deref().map(murmur3_token)
}

/// Re-issues a PREPARE for `query` against every node in `nodes` (§4.8's prepare-on-all-hosts).
/// Runs in the background after the originating PREPARE already succeeded on its own node, so a
/// failure here is merely logged rather than surfaced to the caller.
async fn prepare_on_hosts<T, CM>(nodes: &[Arc<CM>], version: Version, query: &str)
where
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
{
    let flags = prepare_flags(false, false);
    let frame = Frame::new_req_prepare(version, query.to_string(), flags);

    for node in nodes {
        let connection = match node.connection(&NEVER_RECONNECTION_POLICY).await {
            Ok(connection) => connection,
            Err(err) => {
                tracing::warn!(error = %err, "failed to establish connection while preparing on all nodes");
                continue;
            }
        };

        if let Err(err) = connection.write_frame(&frame).await {
            tracing::warn!(error = %err, query, "failed to prepare statement on node");
        }
    }
}

/// CDRS session that holds a pool of connections to nodes.
pub struct Session<
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
    LB: LoadBalancingStrategy<CM> + Send + Sync,
> {
    load_balancing: LB,
    compression: Compression,
    version: Version,
    tcp_nodelay: bool,
    retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
    request_timeout: Duration,
    speculative_execution_policy: Box<dyn SpeculativeExecutionPolicy>,
    metrics: Arc<Metrics>,
    execution_profiles: HashMap<String, Arc<ExecutionProfile>>,
    request_mailbox: Arc<Semaphore>,
    prepare_on_all_nodes: bool,
    prepared_statements: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    _transport: PhantomData<T>,
    _connection_manager: PhantomData<CM>,
}

impl<
        'a,
        T: CdrsTransport + Send + Sync + 'static,
        CM: ConnectionManager<T> + 'static,
        LB: LoadBalancingStrategy<CM> + Send + Sync,
    > Session<T, CM, LB>
{
    /// Basing on current session returns new `SessionPager` that can be used
    /// for performing paged queries.
    pub fn paged(&'a self, page_size: i32) -> SessionPager<'a, T, CM, LB> {
        SessionPager::new(self, page_size)
    }

    /// The protocol version negotiated for this session's connections.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The timeout applied to every request (§5), including all of its retries and speculative
    /// sub-attempts.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// The session's connection/request counters (§4.6).
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// The policy governing whether idempotent requests get additional parallel attempts (§4.3).
    pub fn speculative_execution_policy(&self) -> &dyn SpeculativeExecutionPolicy {
        self.speculative_execution_policy.as_ref()
    }

    /// Admits one request into the session's bounded request queue (§4.7's mailbox), or fails
    /// fast with `Error::RequestQueueFull` once `request_queue_size` concurrent requests are
    /// already in flight. The returned permit is held for the lifetime of the request's dispatch.
    pub(crate) fn try_admit_request(&self) -> error::Result<tokio::sync::OwnedSemaphorePermit> {
        self.request_mailbox
            .clone()
            .try_acquire_owned()
            .map_err(|_| {
                self.metrics.request_rejected();
                error::Error::RequestQueueFull
            })
    }

    /// Resolves a request's named execution profile (§3), if any. `None` leaves the request on
    /// the session's own defaults; `Some(name)` not found in the session's profile map fails the
    /// request rather than silently falling back.
    fn execution_profile(&self, name: &Option<String>) -> error::Result<Option<Arc<ExecutionProfile>>> {
        match name {
            None => Ok(None),
            Some(name) => self
                .execution_profiles
                .get(name)
                .cloned()
                .map(Some)
                .ok_or(error::Error::ExecutionProfileInvalid),
        }
    }

    /// Executes given prepared query with query parameters and optional tracing, and warnings.
    pub async fn exec_with_params_tw(
        &self,
        prepared: &PreparedQuery,
        query_parameters: QueryParams,
        with_tracing: bool,
        with_warnings: bool,
    ) -> error::Result<Frame> {
        let flags = prepare_flags(with_tracing, with_warnings);
        let options_frame = Frame::new_req_execute(
            self.version,
            prepared
                .id
                .read()
                .expect("Cannot read prepared query id!")
                .deref(),
            &query_parameters,
            flags,
        );

        let token = routing_token(&query_parameters.routing_key);
        let consistency = query_parameters.consistency;
        let profile = self.execution_profile(&query_parameters.execution_profile)?;
        let mut result = send_frame_routed(
            self,
            options_frame,
            query_parameters.is_idempotent,
            token,
            consistency,
            profile.clone(),
        )
        .await;

        if let Err(error::Error::Server(error)) = &result {
            if error.is_unprepared() {
                if let Ok(new) = self.prepare_raw(&prepared.query).await {
                    *prepared
                        .id
                        .write()
                        .expect("Cannot write prepared query id!") = new.id.clone();
                    let flags = prepare_flags(with_tracing, with_warnings);
                    let options_frame =
                        Frame::new_req_execute(self.version, &new.id, &query_parameters, flags);
                    result = send_frame_routed(
                        self,
                        options_frame,
                        query_parameters.is_idempotent,
                        token,
                        consistency,
                        profile,
                    )
                    .await;
                }
            }
        }
        result
    }

    /// Executes given prepared query with query parameters.
    pub async fn exec_with_params(
        &self,
        prepared: &PreparedQuery,
        query_parameters: QueryParams,
    ) -> error::Result<Frame> {
        self.exec_with_params_tw(prepared, query_parameters, false, false)
            .await
    }

    /// Executes given prepared query with query values and optional tracing, and warnings.
    pub async fn exec_with_values_tw<V: Into<QueryValues> + Sync + Send>(
        &self,
        prepared: &PreparedQuery,
        values: V,
        with_tracing: bool,
        with_warnings: bool,
    ) -> error::Result<Frame> {
        let query_params_builder = QueryParamsBuilder::new();
        let query_params = query_params_builder.values(values.into()).finalize();
        self.exec_with_params_tw(prepared, query_params, with_tracing, with_warnings)
            .await
    }

    /// Executes given prepared query with query values.
    pub async fn exec_with_values<V: Into<QueryValues> + Sync + Send>(
        &self,
        prepared: &PreparedQuery,
        values: V,
    ) -> error::Result<Frame> {
        self.exec_with_values_tw(prepared, values, false, false)
            .await
    }

    /// Executes given prepared query with optional tracing and warnings.
    pub async fn exec_tw(
        &self,
        prepared: &PreparedQuery,
        with_tracing: bool,
        with_warnings: bool,
    ) -> error::Result<Frame> {
        let query_params = QueryParamsBuilder::new().finalize();
        self.exec_with_params_tw(prepared, query_params, with_tracing, with_warnings)
            .await
    }

    /// Executes given prepared query.
    pub async fn exec(&self, prepared: &PreparedQuery) -> error::Result<Frame>
    where
        Self: Sync,
    {
        self.exec_tw(prepared, false, false).await
    }

    /// Prepares a query for execution. Along with query itself, the
    /// method takes `with_tracing` and `with_warnings` flags to get
    /// tracing information and warnings. Returns the raw prepared
    /// query result. On success, records the statement in the session's cluster-scoped prepared
    /// cache and, if `prepare_on_all_nodes` is set, opportunistically re-issues the same PREPARE
    /// on every other known host in the background (§4.8) - the completion of this future is
    /// tied only to the first, already-successful PREPARE above.
    pub async fn prepare_raw_tw<Q: ToString + Sync + Send>(
        &self,
        query: Q,
        with_tracing: bool,
        with_warnings: bool,
    ) -> error::Result<BodyResResultPrepared> {
        let query = query.to_string();
        let flags = prepare_flags(with_tracing, with_warnings);

        let query_frame = Frame::new_req_prepare(self.version, query.clone(), flags);

        let result = send_frame_routed(self, query_frame, false, None, Consistency::default(), None)
            .await
            .and_then(|response| response.body().map_err(Into::into))
            .and_then(|body| {
                body.into_prepared()
                    .ok_or_else(|| "CDRS BUG: cannot convert frame into prepared".into())
            });

        if let Ok(prepared) = &result {
            self.prepared_statements
                .write()
                .expect("prepared statement cache lock poisoned")
                .insert(query.clone(), prepared.id.clone());

            if self.prepare_on_all_nodes {
                let version = self.version;
                let nodes = self.load_balancing.all();
                tokio::spawn(async move {
                    prepare_on_hosts(&nodes, version, &query).await;
                });
            }
        }

        result
    }

    /// Prepares query without additional tracing information and warnings.
    /// Returns the raw prepared query result.
    pub async fn prepare_raw<Q: ToString + Sync + Send>(
        &self,
        query: Q,
    ) -> error::Result<BodyResResultPrepared> {
        self.prepare_raw_tw(query, false, false).await
    }

    /// Prepares a query for execution. Along with query itself,
    /// the method takes `with_tracing` and `with_warnings` flags
    /// to get tracing information and warnings. Returns the prepared
    /// query.
    pub async fn prepare_tw<Q: ToString + Sync + Send>(
        &self,
        query: Q,
        with_tracing: bool,
        with_warnings: bool,
    ) -> error::Result<PreparedQuery> {
        let s = query.to_string();
        self.prepare_raw_tw(query, with_tracing, with_warnings)
            .await
            .map(|x| PreparedQuery {
                id: RwLock::new(x.id),
                query: s,
            })
    }

    /// It prepares query without additional tracing information and warnings.
    /// Returns the prepared query.
    pub async fn prepare<Q: ToString + Sync + Send>(&self, query: Q) -> error::Result<PreparedQuery>
    where
        Self: Sync,
    {
        self.prepare_tw(query, false, false).await
    }

    /// Executes batch query with optional tracing and warnings.
    pub async fn batch_with_params_tw(
        &self,
        batch: QueryBatch,
        with_tracing: bool,
        with_warnings: bool,
    ) -> error::Result<Frame> {
        let flags = prepare_flags(with_tracing, with_warnings);
        let is_idempotent = batch.is_idempotent;
        let token = routing_token(&batch.routing_key);
        let consistency = batch.consistency;
        let profile = self.execution_profile(&batch.execution_profile)?;

        let query_frame = Frame::new_req_batch(self.version, batch, flags);

        send_frame_routed(self, query_frame, is_idempotent, token, consistency, profile).await
    }

    /// Executes batch query.
    pub async fn batch_with_params(&self, batch: QueryBatch) -> error::Result<Frame> {
        self.batch_with_params_tw(batch, false, false).await
    }

    /// Executes a query with parameters and ability to trace it and see warnings.
    pub async fn query_with_params_tw<Q: ToString + Send>(
        &self,
        query: Q,
        query_params: QueryParams,
        with_tracing: bool,
        with_warnings: bool,
    ) -> error::Result<Frame> {
        let is_idempotent = query_params.is_idempotent;
        let token = routing_token(&query_params.routing_key);
        let consistency = query_params.consistency;
        let profile = self.execution_profile(&query_params.execution_profile)?;
        let query = Query {
            query: query.to_string(),
            params: query_params,
        };

        let flags = prepare_flags(with_tracing, with_warnings);

        let query_frame = Frame::new_query(self.version, query, flags);

        send_frame_routed(self, query_frame, is_idempotent, token, consistency, profile).await
    }

    /// Executes a query.
    pub async fn query<Q: ToString + Send>(&self, query: Q) -> error::Result<Frame> {
        self.query_tw(query, false, false).await
    }

    /// Executes a query with ability to trace it and see warnings.
    pub async fn query_tw<Q: ToString + Send>(
        &self,
        query: Q,
        with_tracing: bool,
        with_warnings: bool,
    ) -> error::Result<Frame> {
        let query_params = QueryParamsBuilder::new().finalize();
        self.query_with_params_tw(query, query_params, with_tracing, with_warnings)
            .await
    }

    /// Executes a query with bounded values (either with or without names).
    pub async fn query_with_values<Q: ToString + Send, V: Into<QueryValues> + Send>(
        &self,
        query: Q,
        values: V,
    ) -> error::Result<Frame> {
        self.query_with_values_tw(query, values, false, false).await
    }

    /// Executes a query with bounded values (either with or without names)
    /// and ability to see warnings, trace a request and default parameters.
    pub async fn query_with_values_tw<Q: ToString + Send, V: Into<QueryValues> + Send>(
        &self,
        query: Q,
        values: V,
        with_tracing: bool,
        with_warnings: bool,
    ) -> error::Result<Frame> {
        let query_params_builder = QueryParamsBuilder::new();
        let query_params = query_params_builder.values(values.into()).finalize();
        self.query_with_params_tw(query, query_params, with_tracing, with_warnings)
            .await
    }

    /// Executes a query with query params without warnings and tracing.
    pub async fn query_with_params<Q: ToString + Send>(
        &self,
        query: Q,
        query_params: QueryParams,
    ) -> error::Result<Frame> {
        self.query_with_params_tw(query, query_params, false, false)
            .await
    }

    /// Returns connection from a load balancer.
    pub async fn load_balanced_connection(&self) -> Option<error::Result<Arc<T>>> {
        self.load_balanced_connection_for_request(None, Consistency::default())
            .await
    }

    /// Like `load_balanced_connection`, but lets a token-aware policy route straight to the
    /// replica owning `token` (§4.5), and a DC-aware policy decide whether `consistency`
    /// even allows falling back to a remote datacenter.
    pub async fn load_balanced_connection_for_request(
        &self,
        token: Option<Token>,
        consistency: Consistency,
    ) -> Option<error::Result<Arc<T>>> {
        // when using a load balancer with > 1 node, don't use reconnection policy for a given node,
        // but jump to the next one

        let connection_manager = {
            if self.load_balancing.size() < 2 {
                self.load_balancing.next_for_request(token, consistency)
            } else {
                None
            }
        };

        if let Some(connection_manager) = connection_manager {
            let connection = connection_manager
                .connection(self.reconnection_policy.deref())
                .await;

            return match connection {
                Ok(connection) => Some(Ok(connection)),
                Err(error) => Some(Err(error)),
            };
        }

        // Bounded by the policy's node count: every node gets at most one attempt per call, so a
        // cluster that's entirely unreachable returns an error instead of looping forever.
        let attempts = self.load_balancing.size();
        let mut connection_manager = self.load_balancing.next_for_request(token, consistency);

        for _ in 0..attempts {
            let current = connection_manager.take().or_else(|| self.load_balancing.next())?;

            let connection = current.connection(&NEVER_RECONNECTION_POLICY).await;
            if let Ok(connection) = connection {
                return Some(Ok(connection));
            }
        }

        None
    }

    /// Returns connection to the desired node.
    pub async fn node_connection(&self, node: &SocketAddr) -> Option<error::Result<Arc<T>>> {
        let connection_manager = self.load_balancing.find(|cm| cm.addr() == *node)?;

        Some(
            connection_manager
                .connection(self.reconnection_policy.deref())
                .await,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn new(
        load_balancing: LB,
        compression: Compression,
        version: Version,
        tcp_nodelay: bool,
        retry_policy: Box<dyn RetryPolicy + Send + Sync>,
        reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
        request_timeout: Duration,
        speculative_execution_policy: Box<dyn SpeculativeExecutionPolicy>,
        metrics: Arc<Metrics>,
        execution_profiles: HashMap<String, Arc<ExecutionProfile>>,
        request_queue_size: usize,
        prepare_on_all_nodes: bool,
    ) -> Self {
        Session {
            load_balancing,
            compression,
            version,
            tcp_nodelay,
            retry_policy,
            reconnection_policy,
            request_timeout,
            speculative_execution_policy,
            metrics,
            execution_profiles,
            request_mailbox: Arc::new(Semaphore::new(request_queue_size.max(1))),
            prepare_on_all_nodes,
            prepared_statements: Arc::new(RwLock::new(HashMap::new())),
            _transport: Default::default(),
            _connection_manager: Default::default(),
        }
    }
}

impl<
        T: CdrsTransport + 'static,
        CM: ConnectionManager<T>,
        LB: LoadBalancingStrategy<CM> + Send + Sync,
    > GetRetryPolicy for Session<T, CM, LB>
{
    fn retry_policy(&self) -> &dyn RetryPolicy {
        self.retry_policy.as_ref()
    }
}

/// Workaround for <https://github.com/rust-lang/rust/issues/63033>
#[repr(transparent)]
pub struct RetryPolicyWrapper(pub Box<dyn RetryPolicy + Send + Sync>);

#[repr(transparent)]
pub struct ReconnectionPolicyWrapper(pub Box<dyn ReconnectionPolicy + Send + Sync>);

/// This function uses a user-supplied connection configuration to initialize all the
/// connections in the session. It can be used to supply your own transport and load
/// balancing mechanisms in order to support unusual node discovery mechanisms
/// or configuration needs.
///
/// The config object supplied differs from the ClusterTcpConfig and ClusterRustlsConfig
/// objects in that it is not expected to include an address. Instead the same configuration
/// will be applied to all connections across the cluster.
#[allow(clippy::too_many_arguments)]
pub async fn connect_generic_static<T, C, A, CM, LB>(
    config: &C,
    initial_nodes: &[A],
    mut load_balancing: LB,
    compression: Compression,
    version: Version,
    retry_policy: RetryPolicyWrapper,
    reconnection_policy: ReconnectionPolicyWrapper,
) -> error::Result<Session<T, CM, LB>>
where
    A: Clone,
    T: CdrsTransport + 'static,
    CM: ConnectionManager<T>,
    C: GenericClusterConfig<T, CM, Address = A>,
    LB: LoadBalancingStrategy<CM> + Sized + Send + Sync,
{
    let mut nodes = Vec::with_capacity(initial_nodes.len());

    for node in initial_nodes {
        let connection_manager = config.create_manager(node.clone()).await?;
        nodes.push(Arc::new(connection_manager));
    }

    load_balancing.init(nodes);

    Ok(Session {
        load_balancing,
        compression,
        version,
        tcp_nodelay: true,
        retry_policy: retry_policy.0,
        reconnection_policy: reconnection_policy.0,
        request_timeout: DEFAULT_REQUEST_TIMEOUT,
        speculative_execution_policy: Box::new(NoSpeculativeExecutionPolicy),
        metrics: Arc::new(Metrics::new()),
        execution_profiles: HashMap::new(),
        request_mailbox: Arc::new(Semaphore::new(DEFAULT_REQUEST_QUEUE_SIZE)),
        prepare_on_all_nodes: DEFAULT_PREPARE_ON_ALL_NODES,
        prepared_statements: Arc::new(RwLock::new(HashMap::new())),
        _transport: Default::default(),
        _connection_manager: Default::default(),
    })
}

// `connect_generic_static` takes connection managers from a user-supplied `GenericClusterConfig`,
// which doesn't have a hook for this session's `Metrics`, so managers built that way don't share
// its counters; the counters above still track every request made through the resulting session.

/// Creates new session that will perform queries without any compression. `Compression` type
/// can be changed at any time.
/// As a parameter it takes:
/// * cluster config
/// * load balancing strategy (cannot be changed during `Session` life time).
#[deprecated(note = "Use SessionBuilder instead.")]
pub async fn new<LB>(
    node_configs: &ClusterTcpConfig,
    load_balancing: LB,
    retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
) -> error::Result<Session<TransportTcp, TcpConnectionManager, LB>>
where
    LB: LoadBalancingStrategy<TcpConnectionManager> + Send + Sync,
{
    Ok(TcpSessionBuilder::new(load_balancing, node_configs.clone())
        .with_retry_policy(retry_policy)
        .with_reconnection_policy(reconnection_policy)
        .build())
}

/// Creates new session that will perform queries with Snappy compression. `Compression` type
/// can be changed at any time.
/// As a parameter it takes:
/// * cluster config
/// * load balancing strategy (cannot be changed during `Session` life time).
#[deprecated(note = "Use SessionBuilder instead.")]
pub async fn new_snappy<LB>(
    node_configs: &ClusterTcpConfig,
    load_balancing: LB,
    retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
) -> error::Result<Session<TransportTcp, TcpConnectionManager, LB>>
where
    LB: LoadBalancingStrategy<TcpConnectionManager> + Send + Sync,
{
    Ok(TcpSessionBuilder::new(load_balancing, node_configs.clone())
        .with_compression(Compression::Snappy)
        .with_retry_policy(retry_policy)
        .with_reconnection_policy(reconnection_policy)
        .build())
}

/// Creates new session that will perform queries with LZ4 compression. `Compression` type
/// can be changed at any time.
/// As a parameter it takes:
/// * cluster config
/// * load balancing strategy (cannot be changed during `Session` life time).
#[deprecated(note = "Use SessionBuilder instead.")]
pub async fn new_lz4<LB>(
    node_configs: &ClusterTcpConfig,
    load_balancing: LB,
    retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
) -> error::Result<Session<TransportTcp, TcpConnectionManager, LB>>
where
    LB: LoadBalancingStrategy<TcpConnectionManager> + Send + Sync,
{
    Ok(TcpSessionBuilder::new(load_balancing, node_configs.clone())
        .with_compression(Compression::Lz4)
        .with_retry_policy(retry_policy)
        .with_reconnection_policy(reconnection_policy)
        .build())
}

/// Creates new TLS session that will perform queries without any compression. `Compression` type
/// can be changed at any time.
/// As a parameter it takes:
/// * cluster config
/// * load balancing strategy (cannot be changed during `Session` life time).
#[cfg(feature = "rust-tls")]
#[deprecated(note = "Use SessionBuilder instead.")]
pub async fn new_tls<LB>(
    node_configs: &ClusterRustlsConfig,
    load_balancing: LB,
    retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
) -> error::Result<Session<TransportRustls, RustlsConnectionManager, LB>>
where
    LB: LoadBalancingStrategy<RustlsConnectionManager> + Send + Sync,
{
    Ok(
        RustlsSessionBuilder::new(load_balancing, node_configs.clone())
            .with_retry_policy(retry_policy)
            .with_reconnection_policy(reconnection_policy)
            .build(),
    )
}

/// Creates new TLS session that will perform queries with Snappy compression. `Compression` type
/// can be changed at any time.
/// As a parameter it takes:
/// * cluster config
/// * load balancing strategy (cannot be changed during `Session` life time).
#[cfg(feature = "rust-tls")]
#[deprecated(note = "Use SessionBuilder instead.")]
pub async fn new_snappy_tls<LB>(
    node_configs: &ClusterRustlsConfig,
    load_balancing: LB,
    retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
) -> error::Result<Session<TransportRustls, RustlsConnectionManager, LB>>
where
    LB: LoadBalancingStrategy<RustlsConnectionManager> + Send + Sync,
{
    Ok(
        RustlsSessionBuilder::new(load_balancing, node_configs.clone())
            .with_compression(Compression::Snappy)
            .with_retry_policy(retry_policy)
            .with_reconnection_policy(reconnection_policy)
            .build(),
    )
}

/// Creates new TLS session that will perform queries with LZ4 compression. `Compression` type
/// can be changed at any time.
/// As a parameter it takes:
/// * cluster config
/// * load balancing strategy (cannot be changed during `Session` life time).
#[cfg(feature = "rust-tls")]
#[deprecated(note = "Use SessionBuilder instead.")]
pub async fn new_lz4_tls<LB>(
    node_configs: &ClusterRustlsConfig,
    load_balancing: LB,
    retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
) -> error::Result<Session<TransportRustls, RustlsConnectionManager, LB>>
where
    LB: LoadBalancingStrategy<RustlsConnectionManager> + Send + Sync,
{
    Ok(
        RustlsSessionBuilder::new(load_balancing, node_configs.clone())
            .with_compression(Compression::Lz4)
            .with_retry_policy(retry_policy)
            .with_reconnection_policy(reconnection_policy)
            .build(),
    )
}

impl<
        T: CdrsTransport + 'static,
        CM: ConnectionManager<T>,
        LB: LoadBalancingStrategy<CM> + Send + Sync,
    > Session<T, CM, LB>
{
    /// Returns new event listener.
    pub async fn listen(
        &self,
        node: SocketAddr,
        authenticator: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
        events: Vec<SimpleServerEvent>,
    ) -> error::Result<(Listener, EventStream)> {
        let keyspace_holder = Arc::new(KeyspaceHolder::default());
        let (event_sender, event_receiver) = channel(256);
        let config = NodeTcpConfigBuilder::new()
            .with_node_address(node.into())
            .with_authenticator_provider(authenticator)
            .with_event_sender(event_sender)
            .build()
            .await?;
        let connection_manager = TcpConnectionManager::new(
            config
                .0
                .into_iter()
                .next()
                .ok_or_else(|| error::Error::General("Empty node list!".into()))?,
            keyspace_holder,
            self.compression,
            self.version,
            self.tcp_nodelay,
            self.metrics.clone(),
            1,
        );
        let transport = connection_manager
            .connection(&NeverReconnectionPolicy)
            .await?;

        let query_frame = Frame::new_req_register(self.version, events);
        transport.write_frame(&query_frame).await?;

        let (sender, receiver) = std_channel();
        Ok((
            new_listener(sender, event_receiver),
            EventStream::new(receiver),
        ))
    }

    #[cfg(feature = "rust-tls")]
    pub async fn listen_tls(
        &self,
        node: net::SocketAddr,
        authenticator: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
        events: Vec<SimpleServerEvent>,
        dns_name: rustls_pki_types::ServerName<'static>,
        config: Arc<tokio_rustls::rustls::ClientConfig>,
    ) -> error::Result<(Listener, EventStream)> {
        let keyspace_holder = Arc::new(KeyspaceHolder::default());
        let (event_sender, event_receiver) = channel(256);
        let config = NodeRustlsConfigBuilder::new(dns_name, config)
            .with_node_address(node.into())
            .with_authenticator_provider(authenticator)
            .with_event_sender(event_sender)
            .build()
            .await?;
        let connection_manager = RustlsConnectionManager::new(
            config
                .0
                .into_iter()
                .next()
                .ok_or_else(|| error::Error::General("Empty node list!".into()))?,
            keyspace_holder,
            self.compression,
            self.version,
            self.tcp_nodelay,
            self.metrics.clone(),
            1,
        );
        let transport = connection_manager
            .connection(&NeverReconnectionPolicy)
            .await?;

        let query_frame = Frame::new_req_register(self.version, events);
        transport.write_frame(&query_frame).await?;

        let (sender, receiver) = std_channel();
        Ok((
            new_listener(sender, event_receiver),
            EventStream::new(receiver),
        ))
    }

    pub async fn listen_non_blocking(
        &self,
        node: SocketAddr,
        authenticator: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
        events: Vec<SimpleServerEvent>,
    ) -> error::Result<(Listener, EventStreamNonBlocking)> {
        self.listen(node, authenticator, events).await.map(|l| {
            let (listener, stream) = l;
            (listener, stream.into())
        })
    }

    #[cfg(feature = "rust-tls")]
    pub async fn listen_tls_blocking(
        &self,
        node: net::SocketAddr,
        authenticator: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
        events: Vec<SimpleServerEvent>,
        dns_name: rustls_pki_types::ServerName<'static>,
        config: Arc<tokio_rustls::rustls::ClientConfig>,
    ) -> error::Result<(Listener, EventStreamNonBlocking)> {
        self.listen_tls(node, authenticator, events, dns_name, config)
            .await
            .map(|l| {
                let (listener, stream) = l;
                (listener, stream.into())
            })
    }

    /// Opens a dedicated connection to `node`, runs the `system.local`/`system.peers` discovery
    /// queries and registers for topology/status/schema events, then spawns a background task
    /// that keeps the returned control connection's host map current as those events arrive.
    pub async fn init_control_connection(
        &self,
        node: SocketAddr,
        authenticator: Arc<dyn SaslAuthenticatorProvider + Send + Sync>,
    ) -> error::Result<(Arc<ControlConnection<TransportTcp, TcpConnectionManager>>, JoinHandle<()>)>
    {
        let keyspace_holder = Arc::new(KeyspaceHolder::default());
        let (event_sender, event_receiver) = channel(256);
        let config = NodeTcpConfigBuilder::new()
            .with_node_address(node.into())
            .with_authenticator_provider(authenticator)
            .with_event_sender(event_sender)
            .build()
            .await?;
        let connection_manager = Arc::new(TcpConnectionManager::new(
            config
                .0
                .into_iter()
                .next()
                .ok_or_else(|| error::Error::General("Empty node list!".into()))?,
            keyspace_holder,
            self.compression,
            self.version,
            self.tcp_nodelay,
            self.metrics.clone(),
            1,
        ));

        let control =
            ControlConnection::init(connection_manager, self.version, &NEVER_RECONNECTION_POLICY)
                .await?;
        let control = Arc::new(control);
        let event_loop = control.spawn_event_loop(
            event_receiver,
            Box::new(ExponentialReconnectionPolicy::default()),
        );

        Ok((control, event_loop))
    }
}

struct SessionConfig<CM, LB: LoadBalancingStrategy<CM> + Send + Sync> {
    compression: Compression,
    version: Version,
    tcp_nodelay: bool,
    load_balancing: LB,
    retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
    request_timeout: Duration,
    speculative_execution_policy: Box<dyn SpeculativeExecutionPolicy>,
    metrics: Arc<Metrics>,
    execution_profiles: HashMap<String, Arc<ExecutionProfile>>,
    connections_per_node: usize,
    request_queue_size: usize,
    prepare_on_all_nodes: bool,
    _connection_manager: PhantomData<CM>,
}

impl<CM, LB: LoadBalancingStrategy<CM> + Send + Sync> SessionConfig<CM, LB> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        compression: Compression,
        version: Version,
        tcp_nodelay: bool,
        load_balancing: LB,
        retry_policy: Box<dyn RetryPolicy + Send + Sync>,
        reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
    ) -> Self {
        SessionConfig {
            compression,
            version,
            tcp_nodelay,
            load_balancing,
            retry_policy,
            reconnection_policy,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            speculative_execution_policy: Box::new(NoSpeculativeExecutionPolicy),
            metrics: Arc::new(Metrics::new()),
            execution_profiles: HashMap::new(),
            connections_per_node: 1,
            request_queue_size: DEFAULT_REQUEST_QUEUE_SIZE,
            prepare_on_all_nodes: DEFAULT_PREPARE_ON_ALL_NODES,
            _connection_manager: Default::default(),
        }
    }
}

/// Builder for easy `Session` creation. Requires static `LoadBalancingStrategy`, but otherwise, other
/// configuration parameters can be dynamically set. Use concrete implementers to create specific
/// sessions.
pub trait SessionBuilder<
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
    LB: LoadBalancingStrategy<CM> + Send + Sync,
>
{
    /// Sets new compression.
    fn with_compression(self, compression: Compression) -> Self;

    /// Set new retry policy.
    fn with_retry_policy(self, retry_policy: Box<dyn RetryPolicy + Send + Sync>) -> Self;

    /// Set new reconnection policy.
    fn with_reconnection_policy(
        self,
        reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
    ) -> Self;

    /// Sets the CQL binary protocol version to negotiate with every node.
    fn with_version(self, version: Version) -> Self;

    /// Sets NODELAY for given session connections.
    fn with_tcp_nodelay(self, tcp_nodelay: bool) -> Self;

    /// Sets the per-request timeout (§5), applied to every attempt including retries and
    /// speculative sub-attempts. Defaults to `DEFAULT_REQUEST_TIMEOUT`.
    fn with_request_timeout(self, request_timeout: Duration) -> Self;

    /// Sets the speculative execution policy (§4.3). Defaults to `NoSpeculativeExecutionPolicy`.
    fn with_speculative_execution_policy(
        self,
        speculative_execution_policy: Box<dyn SpeculativeExecutionPolicy>,
    ) -> Self;

    /// Registers a named execution profile (§3), resolvable from a request via
    /// `QueryParamsBuilder::execution_profile`/`BatchQueryBuilder::execution_profile`.
    fn with_execution_profile(self, name: impl Into<String>, profile: ExecutionProfile) -> Self;

    /// Sets the number of connections maintained per node (§4.4's per-host connection pool).
    /// Defaults to 1. Requests pick the least-busy connection in the pool.
    fn with_connections_per_node(self, connections_per_node: usize) -> Self;

    /// Sets the session's bounded request queue size (§4.7's mailbox). Defaults to
    /// `DEFAULT_REQUEST_QUEUE_SIZE`. Requests submitted once this many are already in flight fail
    /// fast with `Error::RequestQueueFull` rather than queuing unboundedly.
    fn with_request_queue_size(self, request_queue_size: usize) -> Self;

    /// Controls whether a successful PREPARE is opportunistically fanned out, in the background,
    /// to every other known host (§4.8). Defaults to `DEFAULT_PREPARE_ON_ALL_NODES`.
    fn with_prepare_on_all_nodes(self, prepare_on_all_nodes: bool) -> Self;

    /// Builds the resulting session.
    fn build(self) -> Session<T, CM, LB>;
}

/// Builder for non-TLS sessions.
pub struct TcpSessionBuilder<LB: LoadBalancingStrategy<TcpConnectionManager> + Send + Sync> {
    config: SessionConfig<TcpConnectionManager, LB>,
    node_configs: ClusterTcpConfig,
}

impl<LB: LoadBalancingStrategy<TcpConnectionManager> + Send + Sync> TcpSessionBuilder<LB> {
    /// Creates a new builder with default session configuration.
    pub fn new(load_balancing: LB, node_configs: ClusterTcpConfig) -> Self {
        TcpSessionBuilder {
            config: SessionConfig::new(
                Compression::None,
                DEFAULT_PROTOCOL_VERSION,
                true,
                load_balancing,
                Box::new(DefaultRetryPolicy::default()),
                Box::new(ExponentialReconnectionPolicy::default()),
            ),
            node_configs,
        }
    }
}

impl<LB: LoadBalancingStrategy<TcpConnectionManager> + Send + Sync>
    SessionBuilder<TransportTcp, TcpConnectionManager, LB> for TcpSessionBuilder<LB>
{
    fn with_compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    fn with_retry_policy(mut self, retry_policy: Box<dyn RetryPolicy + Send + Sync>) -> Self {
        self.config.retry_policy = retry_policy;
        self
    }

    fn with_reconnection_policy(
        mut self,
        reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
    ) -> Self {
        self.config.reconnection_policy = reconnection_policy;
        self
    }

    fn with_version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    fn with_tcp_nodelay(mut self, tcp_nodelay: bool) -> Self {
        self.config.tcp_nodelay = tcp_nodelay;
        self
    }

    fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.config.request_timeout = request_timeout;
        self
    }

    fn with_speculative_execution_policy(
        mut self,
        speculative_execution_policy: Box<dyn SpeculativeExecutionPolicy>,
    ) -> Self {
        self.config.speculative_execution_policy = speculative_execution_policy;
        self
    }

    fn with_execution_profile(mut self, name: impl Into<String>, profile: ExecutionProfile) -> Self {
        self.config
            .execution_profiles
            .insert(name.into(), Arc::new(profile));
        self
    }

    fn with_connections_per_node(mut self, connections_per_node: usize) -> Self {
        self.config.connections_per_node = connections_per_node;
        self
    }

    fn with_request_queue_size(mut self, request_queue_size: usize) -> Self {
        self.config.request_queue_size = request_queue_size;
        self
    }

    fn with_prepare_on_all_nodes(mut self, prepare_on_all_nodes: bool) -> Self {
        self.config.prepare_on_all_nodes = prepare_on_all_nodes;
        self
    }

    fn build(mut self) -> Session<TransportTcp, TcpConnectionManager, LB> {
        let keyspace_holder = Arc::new(KeyspaceHolder::default());
        let mut nodes = Vec::with_capacity(self.node_configs.0.len());

        for node_config in self.node_configs.0 {
            let connection_manager = TcpConnectionManager::new(
                node_config,
                keyspace_holder.clone(),
                self.config.compression,
                self.config.version,
                self.config.tcp_nodelay,
                self.config.metrics.clone(),
                self.config.connections_per_node,
            );
            nodes.push(Arc::new(connection_manager));
        }

        self.config.load_balancing.init(nodes);

        Session::new(
            self.config.load_balancing,
            self.config.compression,
            self.config.version,
            self.config.tcp_nodelay,
            self.config.retry_policy,
            self.config.reconnection_policy,
            self.config.request_timeout,
            self.config.speculative_execution_policy,
            self.config.metrics,
            self.config.execution_profiles,
            self.config.request_queue_size,
            self.config.prepare_on_all_nodes,
        )
    }
}

#[cfg(feature = "rust-tls")]
/// Builder for TLS sessions.
pub struct RustlsSessionBuilder<LB: LoadBalancingStrategy<RustlsConnectionManager> + Send + Sync> {
    config: SessionConfig<RustlsConnectionManager, LB>,
    node_configs: ClusterRustlsConfig,
}

#[cfg(feature = "rust-tls")]
impl<LB: LoadBalancingStrategy<RustlsConnectionManager> + Send + Sync> RustlsSessionBuilder<LB> {
    /// Creates a new builder with default session configuration.
    pub fn new(load_balancing: LB, node_configs: ClusterRustlsConfig) -> Self {
        RustlsSessionBuilder {
            config: SessionConfig::new(
                Compression::None,
                DEFAULT_PROTOCOL_VERSION,
                true,
                load_balancing,
                Box::new(DefaultRetryPolicy::default()),
                Box::new(ExponentialReconnectionPolicy::default()),
            ),
            node_configs,
        }
    }
}

#[cfg(feature = "rust-tls")]
impl<LB: LoadBalancingStrategy<RustlsConnectionManager> + Send + Sync>
    SessionBuilder<TransportRustls, RustlsConnectionManager, LB> for RustlsSessionBuilder<LB>
{
    fn with_compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    fn with_retry_policy(mut self, retry_policy: Box<dyn RetryPolicy + Send + Sync>) -> Self {
        self.config.retry_policy = retry_policy;
        self
    }

    fn with_reconnection_policy(
        mut self,
        reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
    ) -> Self {
        self.config.reconnection_policy = reconnection_policy;
        self
    }

    fn with_version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    fn with_tcp_nodelay(mut self, tcp_nodelay: bool) -> Self {
        self.config.tcp_nodelay = tcp_nodelay;
        self
    }

    fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.config.request_timeout = request_timeout;
        self
    }

    fn with_speculative_execution_policy(
        mut self,
        speculative_execution_policy: Box<dyn SpeculativeExecutionPolicy>,
    ) -> Self {
        self.config.speculative_execution_policy = speculative_execution_policy;
        self
    }

    fn with_execution_profile(mut self, name: impl Into<String>, profile: ExecutionProfile) -> Self {
        self.config
            .execution_profiles
            .insert(name.into(), Arc::new(profile));
        self
    }

    fn with_connections_per_node(mut self, connections_per_node: usize) -> Self {
        self.config.connections_per_node = connections_per_node;
        self
    }

    fn with_request_queue_size(mut self, request_queue_size: usize) -> Self {
        self.config.request_queue_size = request_queue_size;
        self
    }

    fn with_prepare_on_all_nodes(mut self, prepare_on_all_nodes: bool) -> Self {
        self.config.prepare_on_all_nodes = prepare_on_all_nodes;
        self
    }

    fn build(mut self) -> Session<TransportRustls, RustlsConnectionManager, LB> {
        let keyspace_holder = Arc::new(KeyspaceHolder::default());
        let mut nodes = Vec::with_capacity(self.node_configs.0.len());

        for node_config in self.node_configs.0 {
            let connection_manager = RustlsConnectionManager::new(
                node_config,
                keyspace_holder.clone(),
                self.config.compression,
                self.config.version,
                self.config.tcp_nodelay,
                self.config.metrics.clone(),
                self.config.connections_per_node,
            );
            nodes.push(Arc::new(connection_manager));
        }

        self.config.load_balancing.init(nodes);

        Session::new(
            self.config.load_balancing,
            self.config.compression,
            self.config.version,
            self.config.tcp_nodelay,
            self.config.retry_policy,
            self.config.reconnection_policy,
            self.config.request_timeout,
            self.config.speculative_execution_policy,
            self.config.metrics,
            self.config.execution_profiles,
            self.config.request_queue_size,
            self.config.prepare_on_all_nodes,
        )
    }
}

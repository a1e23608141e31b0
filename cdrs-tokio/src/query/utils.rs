use std::sync::Arc;
use std::time::Instant;

use cassandra_protocol::consistency::Consistency;
use cassandra_protocol::frame::frame_error::ErrorBody;
use cassandra_protocol::frame::Frame;
use cassandra_protocol::query::Query;
use cassandra_protocol::token::Token;

pub use cassandra_protocol::query::utils::prepare_flags;

use crate::cluster::config::GetRetryPolicy;
use crate::cluster::connection_manager::ConnectionManager;
use crate::cluster::session::Session;
use crate::error;
use crate::execution_profile::ExecutionProfile;
use crate::load_balancing::LoadBalancingStrategy;
use crate::retry::{RetryDecision, RetryPolicy, RetrySession};
use crate::transport::CdrsTransport;

/// Sends `frame` over a load-balanced connection, retrying per the session's `RetryPolicy` when
/// the server reports a recoverable error (§4.3). Unprepared-statement retries are handled one
/// level up, by the caller, since only it knows how to re-prepare and resend.
pub async fn send_frame<T, CM, LB>(
    session: &Session<T, CM, LB>,
    frame: Frame,
    is_idempotent: bool,
) -> error::Result<Frame>
where
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
    LB: LoadBalancingStrategy<CM> + Send + Sync,
{
    send_frame_routed(
        session,
        frame,
        is_idempotent,
        None,
        Consistency::default(),
        None,
    )
    .await
}

/// As `send_frame`, but with an explicit routing token (§4.5) computed from the request's
/// partition key, letting a token-aware load-balancing policy send straight to the owning
/// replica, and an explicit consistency level so a DC-aware policy can decide whether it's even
/// allowed to fall back to a remote datacenter. Also applies the per-request timeout (§5) and
/// speculative execution (§4.3) around the whole attempt, both resolved from `profile` when
/// given (execution profile -> cluster default, per §3's request wrapper) rather than always
/// the session's own.
pub async fn send_frame_routed<T, CM, LB>(
    session: &Session<T, CM, LB>,
    frame: Frame,
    is_idempotent: bool,
    routing_token: Option<Token>,
    consistency: Consistency,
    profile: Option<Arc<ExecutionProfile>>,
) -> error::Result<Frame>
where
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
    LB: LoadBalancingStrategy<CM> + Send + Sync,
{
    let _permit = session.try_admit_request()?;

    let request_timeout = profile
        .as_ref()
        .map(|profile| profile.request_timeout)
        .unwrap_or_else(|| session.request_timeout());
    let metrics = session.metrics();
    metrics.request_started();
    let started = Instant::now();

    let attempt = attempt_with_speculation(
        session,
        &frame,
        is_idempotent,
        routing_token,
        consistency,
        profile,
    );

    let result = match tokio::time::timeout(request_timeout, attempt).await {
        Ok(result) => result,
        Err(_) => {
            metrics.timeout();
            Err(error::Error::RequestTimedOut)
        }
    };

    if result.is_err() {
        metrics.error();
    }
    metrics.request_completed(started.elapsed().as_micros() as u64);

    result
}

/// Races the primary attempt against additional speculative attempts (§4.3's "Speculative
/// execution" paragraph), each started after the speculative policy's delay if the primary
/// hasn't completed yet. Only ever speculates on idempotent requests. The first terminal
/// response wins; the rest are simply dropped (their connections stay open for reuse, so no
/// explicit cancellation of the wire-level request is needed).
async fn attempt_with_speculation<T, CM, LB>(
    session: &Session<T, CM, LB>,
    frame: &Frame,
    is_idempotent: bool,
    routing_token: Option<Token>,
    consistency: Consistency,
    profile: Option<Arc<ExecutionProfile>>,
) -> error::Result<Frame>
where
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
    LB: LoadBalancingStrategy<CM> + Send + Sync,
{
    use futures::stream::FuturesUnordered;
    use futures::StreamExt;

    let speculative_execution_policy: &dyn SpeculativeExecutionPolicy = profile
        .as_ref()
        .map(|profile| profile.speculative_execution_policy.as_ref())
        .unwrap_or_else(|| session.speculative_execution_policy());
    let retry_policy: &dyn RetryPolicy = profile
        .as_ref()
        .map(|profile| profile.retry_policy.as_ref() as &dyn RetryPolicy)
        .unwrap_or_else(|| session.retry_policy());
    let keyspace = profile.as_ref().and_then(|profile| profile.keyspace.clone());

    let plan = if is_idempotent {
        speculative_execution_policy.plan()
    } else {
        None
    };

    let Some((extra_attempts, delay)) = plan else {
        return send_frame_once(
            session,
            frame,
            is_idempotent,
            routing_token,
            consistency,
            retry_policy,
            keyspace.as_deref(),
        )
        .await;
    };

    let mut attempts = FuturesUnordered::new();
    attempts.push(Box::pin(send_frame_once(
        session,
        frame,
        is_idempotent,
        routing_token,
        consistency,
        retry_policy,
        keyspace.as_deref(),
    )));

    let mut last_err = None;

    for _ in 0..extra_attempts {
        tokio::select! {
            biased;
            result = attempts.next() => {
                match result {
                    Some(Ok(response)) => return Ok(response),
                    Some(Err(err)) => last_err = Some(err),
                    None => break,
                }
            }
            _ = tokio::time::sleep(delay) => {
                session.metrics().speculative_execution();
                attempts.push(Box::pin(send_frame_once(
                    session,
                    frame,
                    is_idempotent,
                    routing_token,
                    consistency,
                    retry_policy,
                    keyspace.as_deref(),
                )));
            }
        }
    }

    while let Some(result) = attempts.next().await {
        match result {
            Ok(response) => return Ok(response),
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err.unwrap_or(error::Error::NoHostsAvailable))
}

async fn send_frame_once<T, CM, LB>(
    session: &Session<T, CM, LB>,
    frame: &Frame,
    is_idempotent: bool,
    routing_token: Option<Token>,
    consistency: Consistency,
    retry_policy: &dyn RetryPolicy,
    keyspace: Option<&str>,
) -> error::Result<Frame>
where
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
    LB: LoadBalancingStrategy<CM> + Send + Sync,
{
    let mut retry_count = 0;

    loop {
        let connection = session
            .load_balanced_connection_for_request(routing_token, consistency)
            .await
            .ok_or(error::Error::NoHostsAvailable)??;

        if let Some(keyspace) = keyspace {
            switch_keyspace(session, connection.as_ref(), keyspace).await?;
        }

        let result = connection.write_frame(frame).await.and_then(|response| {
            response
                .body()
                .map(|body| (response.clone(), body))
                .map_err(Into::into)
        });

        let error = match result {
            Ok((response, body)) => match body.into_error() {
                Some(error) => error,
                None => return Ok(response),
            },
            Err(err) => {
                let decision =
                    retry_policy.on_request_error(RetrySession { retry_count }, is_idempotent);
                match decision {
                    RetryDecision::Retry(_) => {
                        retry_count += 1;
                        continue;
                    }
                    RetryDecision::Ignore | RetryDecision::Rethrow => return Err(err),
                }
            }
        };

        let session_ctx = RetrySession { retry_count };
        let decision = retry_decision_for(&error, session_ctx, is_idempotent, retry_policy);

        match decision {
            RetryDecision::Retry(_) => {
                retry_count += 1;
            }
            RetryDecision::Ignore | RetryDecision::Rethrow => {
                return Err(error::Error::Server(error))
            }
        }
    }
}

/// Switches `connection`'s active keyspace to the execution profile's, if it isn't already
/// there. Mirrors the `USE` statement `TransportTcp`/`TransportRustls` send during startup when
/// a session-wide keyspace is configured (§4.1's startup table).
async fn switch_keyspace<T, CM, LB>(
    session: &Session<T, CM, LB>,
    connection: &T,
    keyspace: &str,
) -> error::Result<()>
where
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
    LB: LoadBalancingStrategy<CM> + Send + Sync,
{
    if connection.keyspace().as_deref() == Some(keyspace) {
        return Ok(());
    }

    let use_query = format!("USE \"{}\"", keyspace.replace('"', "\"\""));
    let query = Query {
        query: use_query,
        params: Default::default(),
    };
    let flags = prepare_flags(false, false);
    let frame = Frame::new_query(session.version(), query, flags);

    let response = connection.write_frame(&frame).await?;
    let body = response.body()?;
    if body.into_error().is_some() {
        return Err(error::Error::UnableToSetKeyspace(keyspace.to_string()));
    }

    connection.set_keyspace(Some(keyspace.to_string()));
    Ok(())
}

/// Maps a server `ERROR` body to the matching `RetryPolicy` callback, covering every recoverable
/// kind the spec lists: read timeout, write timeout, unavailable, server error, truncate error,
/// read/write failure, is bootstrapping, overloaded. Anything else (syntax error, unauthorized,
/// invalid, config error, already exists, protocol error, auth error) is never retryable and
/// rethrows without consulting the policy.
fn retry_decision_for(
    error: &ErrorBody,
    session: RetrySession,
    is_idempotent: bool,
    retry_policy: &dyn crate::retry::RetryPolicy,
) -> RetryDecision {
    use cassandra_protocol::frame::frame_error::AdditionalErrorInfo;

    match &error.additional_info {
        AdditionalErrorInfo::ReadTimeout { .. } => {
            retry_policy.on_read_timeout(session, error, is_idempotent)
        }
        AdditionalErrorInfo::WriteTimeout { .. } => {
            retry_policy.on_write_timeout(session, error, is_idempotent)
        }
        AdditionalErrorInfo::Unavailable { .. } => retry_policy.on_unavailable(session, error),
        AdditionalErrorInfo::ReadFailure { .. } => retry_policy.on_read_failure(session, error),
        AdditionalErrorInfo::WriteFailure { .. } => {
            retry_policy.on_write_failure(session, error, is_idempotent)
        }
        AdditionalErrorInfo::Server if error.is_truncate_error() => {
            retry_policy.on_truncate_error(session)
        }
        AdditionalErrorInfo::Server if error.is_bootstrapping() => {
            retry_policy.on_is_bootstrapping(session)
        }
        AdditionalErrorInfo::Server if error.is_overloaded() => {
            retry_policy.on_overloaded(session)
        }
        AdditionalErrorInfo::Server if error.is_server_error() => {
            retry_policy.on_server_error(session, is_idempotent)
        }
        _ => RetryDecision::Rethrow,
    }
}

//! Retry and reconnection policies (§4.3, §4.4).

mod default_retry_policy;
mod exponential_reconnection_policy;
mod fallthrough_retry_policy;

pub use default_retry_policy::DefaultRetryPolicy;
pub use exponential_reconnection_policy::ExponentialReconnectionPolicy;
pub use fallthrough_retry_policy::FallthroughRetryPolicy;

use std::fmt::Debug;
use std::time::Duration;

use cassandra_protocol::frame::frame_error::{AdditionalErrorInfo, ErrorBody};

/// What a request handler should do after a request came back with a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the same request, possibly against a different connection. Recomputes consistency
    /// if given.
    Retry(Option<cassandra_protocol::consistency::Consistency>),
    /// Give up and surface the original error to the caller.
    Rethrow,
    /// Swallow the error and return an empty success (only ever produced for idempotent reads
    /// that are allowed to ignore a write timeout).
    Ignore,
}

/// Context passed to a `RetryPolicy` about the request that just failed.
#[derive(Debug, Clone, Copy)]
pub struct RetrySession {
    pub retry_count: usize,
}

/// Decides whether a failed request should be retried, and how. Implementations must be cheap to
/// call repeatedly; `request_handler` calls into this once per attempt. Every documented
/// recoverable error kind (read timeout, write timeout, unavailable, server error, truncate
/// error, read/write failure, is bootstrapping, overloaded) has its own method so a policy can't
/// accidentally fall through to a silent rethrow for a kind it never considered.
pub trait RetryPolicy: Debug {
    fn on_read_timeout(
        &self,
        session: RetrySession,
        error: &ErrorBody,
        is_idempotent: bool,
    ) -> RetryDecision;

    fn on_write_timeout(
        &self,
        session: RetrySession,
        error: &ErrorBody,
        is_idempotent: bool,
    ) -> RetryDecision;

    fn on_unavailable(&self, session: RetrySession, error: &ErrorBody) -> RetryDecision;

    fn on_request_error(&self, session: RetrySession, is_idempotent: bool) -> RetryDecision;

    /// An opaque `SERVER_ERROR`. Nothing is known about whether the write (if any) landed, so the
    /// default policy only retries when the caller told us the request is idempotent.
    fn on_server_error(&self, session: RetrySession, is_idempotent: bool) -> RetryDecision;

    /// `TRUNCATE_ERROR`. TRUNCATE isn't idempotent in the usual sense (it's already idempotent at
    /// the data level), but a retry after a truncate failure risks retrying against a node that's
    /// mid-truncate; the default policy rethrows.
    fn on_truncate_error(&self, session: RetrySession) -> RetryDecision;

    /// `READ_FAILURE`: unlike a timeout, at least one replica actively reported an error (not
    /// just silence).
    fn on_read_failure(&self, session: RetrySession, error: &ErrorBody) -> RetryDecision;

    /// `WRITE_FAILURE`: as `on_read_failure`, but for the write path.
    fn on_write_failure(
        &self,
        session: RetrySession,
        error: &ErrorBody,
        is_idempotent: bool,
    ) -> RetryDecision;

    /// `IS_BOOTSTRAPPING`: the coordinator is still joining the ring and shouldn't have been sent
    /// the request at all. Always safe to retry against a different host.
    fn on_is_bootstrapping(&self, session: RetrySession) -> RetryDecision;

    /// `OVERLOADED`: the coordinator is shedding load. Safe to retry against a different host,
    /// since the request was rejected before being applied anywhere.
    fn on_overloaded(&self, session: RetrySession) -> RetryDecision;
}

/// Narrows a server error body down to the handful of recoverable kinds a `RetryPolicy` cares
/// about.
pub(crate) fn additional_info(error: &ErrorBody) -> &AdditionalErrorInfo {
    &error.additional_info
}

/// Decides how long to wait before attempting to re-establish a broken connection.
pub trait ReconnectionPolicy: Debug {
    /// Resets internal attempt counter and returns the first delay (usually zero or a small base
    /// delay).
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule + Send + Sync>;
}

/// A single reconnection attempt sequence; stateful across calls to `next_delay`.
pub trait ReconnectionSchedule: Debug {
    fn next_delay(&mut self) -> Option<Duration>;
}

/// Reconnects immediately, exactly once - used for ad-hoc connections (listeners, control
/// connection bootstrap) that shouldn't retry on their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverReconnectionPolicy;

impl ReconnectionPolicy for NeverReconnectionPolicy {
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule + Send + Sync> {
        Box::new(NeverSchedule { used: false })
    }
}

#[derive(Debug)]
struct NeverSchedule {
    used: bool,
}

impl ReconnectionSchedule for NeverSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        if self.used {
            None
        } else {
            self.used = true;
            Some(Duration::from_secs(0))
        }
    }
}

/// Always waits the same, fixed amount of time between attempts.
#[derive(Debug, Clone, Copy)]
pub struct ConstantReconnectionPolicy {
    delay: Duration,
}

impl ConstantReconnectionPolicy {
    pub fn new(delay: Duration) -> Self {
        ConstantReconnectionPolicy { delay }
    }
}

impl Default for ConstantReconnectionPolicy {
    fn default() -> Self {
        ConstantReconnectionPolicy::new(Duration::from_secs(1))
    }
}

impl ReconnectionPolicy for ConstantReconnectionPolicy {
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule + Send + Sync> {
        Box::new(ConstantSchedule { delay: self.delay })
    }
}

#[derive(Debug)]
struct ConstantSchedule {
    delay: Duration,
}

impl ReconnectionSchedule for ConstantSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        Some(self.delay)
    }
}

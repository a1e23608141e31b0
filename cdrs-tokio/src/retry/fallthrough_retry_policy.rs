use cassandra_protocol::frame::frame_error::ErrorBody;

use crate::retry::{RetryDecision, RetryPolicy, RetrySession};

/// Never retries; every recoverable error is immediately surfaced to the caller. Useful when the
/// application wants full control over retry behaviour at the call site.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallthroughRetryPolicy;

impl RetryPolicy for FallthroughRetryPolicy {
    fn on_read_timeout(
        &self,
        _session: RetrySession,
        _error: &ErrorBody,
        _is_idempotent: bool,
    ) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_write_timeout(
        &self,
        _session: RetrySession,
        _error: &ErrorBody,
        _is_idempotent: bool,
    ) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_unavailable(&self, _session: RetrySession, _error: &ErrorBody) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_request_error(&self, _session: RetrySession, _is_idempotent: bool) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_server_error(&self, _session: RetrySession, _is_idempotent: bool) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_truncate_error(&self, _session: RetrySession) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_read_failure(&self, _session: RetrySession, _error: &ErrorBody) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_write_failure(
        &self,
        _session: RetrySession,
        _error: &ErrorBody,
        _is_idempotent: bool,
    ) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_is_bootstrapping(&self, _session: RetrySession) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_overloaded(&self, _session: RetrySession) -> RetryDecision {
        RetryDecision::Rethrow
    }
}

use cassandra_protocol::frame::frame_error::{AdditionalErrorInfo, ErrorBody};

use crate::retry::{RetryDecision, RetryPolicy, RetrySession};

/// Retries once on a read/write timeout if enough replicas were reached, retries unavailable on
/// a different node, and retries other request errors on idempotent statements only. Matches the
/// driver's `DefaultRetryPolicy` semantics: it never blindly retries non-idempotent writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRetryPolicy;

impl RetryPolicy for DefaultRetryPolicy {
    fn on_read_timeout(
        &self,
        session: RetrySession,
        error: &ErrorBody,
        _is_idempotent: bool,
    ) -> RetryDecision {
        if session.retry_count > 0 {
            return RetryDecision::Rethrow;
        }

        if let AdditionalErrorInfo::ReadTimeout {
            received,
            block_for,
            ..
        } = &error.additional_info
        {
            if received >= block_for {
                return RetryDecision::Retry(None);
            }
        }

        RetryDecision::Rethrow
    }

    fn on_write_timeout(
        &self,
        session: RetrySession,
        error: &ErrorBody,
        is_idempotent: bool,
    ) -> RetryDecision {
        if session.retry_count > 0 || !is_idempotent {
            return RetryDecision::Rethrow;
        }

        if let AdditionalErrorInfo::WriteTimeout { write_type, .. } = &error.additional_info {
            if write_type == "BATCH_LOG" {
                return RetryDecision::Retry(None);
            }
        }

        RetryDecision::Rethrow
    }

    fn on_unavailable(&self, session: RetrySession, _error: &ErrorBody) -> RetryDecision {
        if session.retry_count == 0 {
            RetryDecision::Retry(None)
        } else {
            RetryDecision::Rethrow
        }
    }

    fn on_request_error(&self, session: RetrySession, is_idempotent: bool) -> RetryDecision {
        if is_idempotent && session.retry_count == 0 {
            RetryDecision::Retry(None)
        } else {
            RetryDecision::Rethrow
        }
    }

    fn on_server_error(&self, session: RetrySession, is_idempotent: bool) -> RetryDecision {
        if is_idempotent && session.retry_count == 0 {
            RetryDecision::Retry(None)
        } else {
            RetryDecision::Rethrow
        }
    }

    fn on_truncate_error(&self, _session: RetrySession) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_read_failure(&self, session: RetrySession, error: &ErrorBody) -> RetryDecision {
        if session.retry_count > 0 {
            return RetryDecision::Rethrow;
        }

        if let AdditionalErrorInfo::ReadFailure {
            received,
            block_for,
            num_failures,
            ..
        } = &error.additional_info
        {
            if *num_failures == 0 && received >= block_for {
                return RetryDecision::Retry(None);
            }
        }

        RetryDecision::Rethrow
    }

    fn on_write_failure(
        &self,
        _session: RetrySession,
        _error: &ErrorBody,
        _is_idempotent: bool,
    ) -> RetryDecision {
        // At least one replica actively rejected the write; retrying risks applying it twice with
        // no way to tell, so this is always surfaced regardless of idempotence.
        RetryDecision::Rethrow
    }

    fn on_is_bootstrapping(&self, session: RetrySession) -> RetryDecision {
        if session.retry_count == 0 {
            RetryDecision::Retry(None)
        } else {
            RetryDecision::Rethrow
        }
    }

    fn on_overloaded(&self, session: RetrySession) -> RetryDecision {
        if session.retry_count == 0 {
            RetryDecision::Retry(None)
        } else {
            RetryDecision::Rethrow
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cassandra_protocol::consistency::Consistency;

    fn session(retry_count: usize) -> RetrySession {
        RetrySession { retry_count }
    }

    #[test]
    fn retries_read_timeout_once_when_enough_replicas_replied() {
        let policy = DefaultRetryPolicy;
        let error = ErrorBody {
            error_code: 0x1200,
            message: String::new(),
            additional_info: AdditionalErrorInfo::ReadTimeout {
                consistency: Consistency::One,
                received: 1,
                block_for: 1,
                data_present: true,
            },
        };

        assert_eq!(
            policy.on_read_timeout(session(0), &error, false),
            RetryDecision::Retry(None)
        );
        assert_eq!(
            policy.on_read_timeout(session(1), &error, false),
            RetryDecision::Rethrow
        );
    }

    #[test]
    fn never_retries_non_idempotent_write_timeout() {
        let policy = DefaultRetryPolicy;
        let error = ErrorBody {
            error_code: 0x1100,
            message: String::new(),
            additional_info: AdditionalErrorInfo::WriteTimeout {
                consistency: Consistency::One,
                received: 0,
                block_for: 1,
                write_type: "SIMPLE".to_string(),
            },
        };

        assert_eq!(
            policy.on_write_timeout(session(0), &error, false),
            RetryDecision::Rethrow
        );
    }
}

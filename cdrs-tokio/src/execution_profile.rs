//! Execution profiles (§3 "Execution profile"): named bundles of request defaults that sit
//! between a per-request override and the cluster-wide default in the request wrapper's
//! resolution order.

use std::time::Duration;

use cassandra_protocol::consistency::Consistency;

use crate::cluster::session::DEFAULT_REQUEST_TIMEOUT;
use crate::retry::{DefaultRetryPolicy, RetryPolicy};
use crate::speculative_execution::{NoSpeculativeExecutionPolicy, SpeculativeExecutionPolicy};

/// A named bundle of consistency/timeout/retry/speculative/keyspace defaults. A request names a
/// profile by string (`QueryParamsBuilder::execution_profile`/`BatchQueryBuilder::execution_profile`);
/// lookup failure fails the request with `error::Error::ExecutionProfileInvalid` rather than
/// silently falling back to the cluster default.
#[derive(Debug)]
pub struct ExecutionProfile {
    pub consistency: Consistency,
    pub serial_consistency: Option<Consistency>,
    pub request_timeout: Duration,
    pub retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    pub speculative_execution_policy: Box<dyn SpeculativeExecutionPolicy>,
    pub keyspace: Option<String>,
}

impl Default for ExecutionProfile {
    fn default() -> Self {
        ExecutionProfile {
            consistency: Consistency::default(),
            serial_consistency: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_policy: Box::new(DefaultRetryPolicy::default()),
            speculative_execution_policy: Box::new(NoSpeculativeExecutionPolicy),
            keyspace: None,
        }
    }
}

/// Mirrors `QueryParamsBuilder`'s chaining style: every setter takes `self` by value.
#[derive(Debug, Default)]
pub struct ExecutionProfileBuilder {
    profile: ExecutionProfile,
}

impl ExecutionProfileBuilder {
    pub fn new() -> Self {
        ExecutionProfileBuilder::default()
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.profile.consistency = consistency;
        self
    }

    pub fn serial_consistency(mut self, consistency: Consistency) -> Self {
        self.profile.serial_consistency = Some(consistency);
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.profile.request_timeout = request_timeout;
        self
    }

    pub fn retry_policy(mut self, retry_policy: Box<dyn RetryPolicy + Send + Sync>) -> Self {
        self.profile.retry_policy = retry_policy;
        self
    }

    pub fn speculative_execution_policy(
        mut self,
        speculative_execution_policy: Box<dyn SpeculativeExecutionPolicy>,
    ) -> Self {
        self.profile.speculative_execution_policy = speculative_execution_policy;
        self
    }

    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.profile.keyspace = Some(keyspace.into());
        self
    }

    pub fn build(self) -> ExecutionProfile {
        self.profile
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_cluster_defaults() {
        let profile = ExecutionProfileBuilder::new().build();
        assert_eq!(profile.consistency, Consistency::default());
        assert_eq!(profile.serial_consistency, None);
        assert_eq!(profile.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(profile.keyspace, None);
    }

    #[test]
    fn builder_overrides_every_field() {
        let profile = ExecutionProfileBuilder::new()
            .consistency(Consistency::All)
            .serial_consistency(Consistency::Serial)
            .request_timeout(Duration::from_secs(1))
            .keyspace("analytics")
            .build();

        assert_eq!(profile.consistency, Consistency::All);
        assert_eq!(profile.serial_consistency, Some(Consistency::Serial));
        assert_eq!(profile.request_timeout, Duration::from_secs(1));
        assert_eq!(profile.keyspace, Some("analytics".to_string()));
    }
}

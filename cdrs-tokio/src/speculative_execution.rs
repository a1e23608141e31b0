//! Speculative execution policies (§4.3 "Speculative execution"): whether, and how, to run
//! additional parallel attempts for a request that hasn't completed yet.

use std::fmt::Debug;
use std::time::Duration;

/// Given to an idempotent request that's still in flight. Only idempotent requests ever consult
/// this - firing a second attempt at a non-idempotent write risks applying it twice.
pub trait SpeculativeExecutionPolicy: Debug + Send + Sync {
    /// `Some((extra_attempts, delay))` runs up to `extra_attempts` additional attempts on
    /// distinct hosts from the same query plan, each started `delay` after the previous one fired
    /// (or after the original attempt) if no terminal response has arrived yet. `None` disables
    /// speculative execution for the request.
    fn plan(&self) -> Option<(usize, Duration)>;
}

/// Never speculates. The default for every session unless a policy is set explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeculativeExecutionPolicy;

impl SpeculativeExecutionPolicy for NoSpeculativeExecutionPolicy {
    fn plan(&self) -> Option<(usize, Duration)> {
        None
    }
}

/// Fires up to `max_speculative_executions` additional attempts, `delay` apart, regardless of
/// how the earlier attempts are progressing. Matches the driver's `ConstantSpeculativeExecutionPolicy`.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSpeculativeExecutionPolicy {
    max_speculative_executions: usize,
    delay: Duration,
}

impl ConstantSpeculativeExecutionPolicy {
    pub fn new(max_speculative_executions: usize, delay: Duration) -> Self {
        ConstantSpeculativeExecutionPolicy {
            max_speculative_executions,
            delay,
        }
    }
}

impl SpeculativeExecutionPolicy for ConstantSpeculativeExecutionPolicy {
    fn plan(&self) -> Option<(usize, Duration)> {
        if self.max_speculative_executions == 0 {
            None
        } else {
            Some((self.max_speculative_executions, self.delay))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_speculation_never_plans() {
        assert_eq!(NoSpeculativeExecutionPolicy.plan(), None);
    }

    #[test]
    fn constant_policy_plans_configured_attempts() {
        let policy = ConstantSpeculativeExecutionPolicy::new(2, Duration::from_millis(50));
        assert_eq!(policy.plan(), Some((2, Duration::from_millis(50))));
    }

    #[test]
    fn zero_attempts_disables_speculation() {
        let policy = ConstantSpeculativeExecutionPolicy::new(0, Duration::from_millis(50));
        assert_eq!(policy.plan(), None);
    }
}

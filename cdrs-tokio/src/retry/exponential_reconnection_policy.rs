use std::time::Duration;

use rand::Rng;

use crate::retry::{ReconnectionPolicy, ReconnectionSchedule};

/// Doubles the delay after every attempt, up to `max_delay`, with up to 15% jitter so a flock of
/// connections broken by the same outage don't all reconnect in lockstep.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialReconnectionPolicy {
    base_delay: Duration,
    max_delay: Duration,
}

impl ExponentialReconnectionPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        ExponentialReconnectionPolicy {
            base_delay,
            max_delay,
        }
    }
}

impl Default for ExponentialReconnectionPolicy {
    fn default() -> Self {
        ExponentialReconnectionPolicy::new(Duration::from_millis(500), Duration::from_secs(60))
    }
}

impl ReconnectionPolicy for ExponentialReconnectionPolicy {
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule + Send + Sync> {
        Box::new(ExponentialSchedule {
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            attempt: 0,
        })
    }
}

#[derive(Debug)]
struct ExponentialSchedule {
    base_delay: Duration,
    max_delay: Duration,
    attempt: u32,
}

impl ReconnectionSchedule for ExponentialSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        let shift = self.attempt.min(31);
        let factor = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
        let raw = self.base_delay.saturating_mul(factor).min(self.max_delay);

        self.attempt = self.attempt.saturating_add(1);

        let jitter_ratio = rand::rng().random_range(0.85..=1.15);
        Some(Duration::from_secs_f64(raw.as_secs_f64() * jitter_ratio))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn delay_grows_and_is_capped() {
        let policy =
            ExponentialReconnectionPolicy::new(Duration::from_millis(100), Duration::from_secs(1));
        let mut schedule = policy.new_schedule();

        schedule.next_delay().unwrap();
        schedule.next_delay().unwrap();

        // Once the exponent saturates the cap, jitter may still push up to 15% past `max_delay`,
        // but never past that.
        for _ in 0..20 {
            let delay = schedule.next_delay().unwrap();
            assert!(delay <= Duration::from_millis(1_150));
        }
    }

    #[test]
    fn jitter_is_symmetric_around_the_unjittered_delay() {
        let policy =
            ExponentialReconnectionPolicy::new(Duration::from_millis(100), Duration::from_secs(60));

        // First attempt's un-jittered delay is exactly `base_delay`; a one-sided jitter
        // implementation would never let the observed delay exceed it.
        let mut saw_above_base = false;
        let mut saw_below_base = false;

        for _ in 0..200 {
            let mut schedule = policy.new_schedule();
            let delay = schedule.next_delay().unwrap();

            assert!(delay >= Duration::from_micros(85_000));
            assert!(delay <= Duration::from_micros(115_000));

            if delay > Duration::from_millis(100) {
                saw_above_base = true;
            }
            if delay < Duration::from_millis(100) {
                saw_below_base = true;
            }
        }

        assert!(saw_above_base, "jitter never scaled the delay up");
        assert!(saw_below_base, "jitter never scaled the delay down");
    }
}

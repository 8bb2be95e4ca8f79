//! Retry policy for units of work aborted by a concurrent writer.
//!
//! Attempts are counted from 1 (the first *retry*). The original attempt is
//! not governed by the policy.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed,
    /// `base * 2^(attempt - 1)`, capped at `max_delay`.
    #[default]
    Exponential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the original attempt (0 = never retry).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
    /// Fraction of the delay (0.0..=1.0) added or removed so that writers
    /// that collided once do not collide again on the same schedule.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(2),
            max_delay: Duration::from_millis(50),
            backoff: Backoff::Exponential,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self::default().with_max_attempts(0)
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            backoff: Backoff::Fixed,
            jitter: 0.0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Whether another retry may follow `attempt` retries already made.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Pause before retry number `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor).min(self.max_delay)
            }
        };

        if self.jitter <= 0.0 {
            return delay;
        }

        // Spread in [-jitter, +jitter), derived from the attempt number so a
        // given policy always produces the same schedule.
        let spread = f64::from(attempt.wrapping_mul(2_654_435_761) % 1000) / 500.0 - 1.0;
        let scaled = delay.as_secs_f64() * (1.0 + self.jitter.min(1.0) * spread);
        Duration::from_secs_f64(scaled.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_doubles_then_caps() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(4));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(32));
        assert_eq!(policy.delay_for_attempt(6), Duration::from_millis(50));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_millis(50));
    }

    #[test]
    fn jitter_stays_within_its_fraction() {
        let policy = RetryPolicy {
            jitter: 0.5,
            ..RetryPolicy::fixed(10, Duration::from_millis(10))
        };
        for attempt in 1..=10 {
            let delay = policy.delay_for_attempt(attempt);
            let off = (delay.as_secs_f64() - 0.010).abs();
            assert!(off <= 0.005 + 1e-9, "attempt {attempt}: {delay:?}");
        }
        assert_eq!(policy.delay_for_attempt(3), policy.delay_for_attempt(3));
    }

    #[test]
    fn retry_budget_is_respected() {
        let policy = RetryPolicy::fixed(2, Duration::from_millis(1));
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert!(!RetryPolicy::no_retry().should_retry(0));
    }
}

//! Retry policy for transient probe failures.
//!
//! Only `Errored` outcomes reach the policy. The default is bounded so a
//! target that fails on every attempt cannot keep the run alive forever.

use std::time::Duration;

/// What to do with a target whose probe errored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Dispatch the target again after `delay`.
    Retry { delay: Duration },
    /// Stop trying and report the target as abandoned.
    GiveUp,
}

/// Bounded retries with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    max_retries: Option<u32>,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 5;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

    /// Retry up to `max_retries` times with the default backoff.
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries: Some(max_retries),
            base_delay: Self::DEFAULT_BASE_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }

    /// Never retry.
    pub const fn none() -> Self {
        Self::new(0)
    }

    /// Retry until the probe stops erroring. A target that always errors
    /// keeps the run alive indefinitely.
    pub const fn unbounded() -> Self {
        Self {
            max_retries: None,
            base_delay: Self::DEFAULT_BASE_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }

    /// Set the backoff: `base * 2^retries`, capped at `max`.
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max.max(base);
        self
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Decide for a target that has already been retried `retries` times.
    pub fn decide(&self, retries: u32) -> RetryDecision {
        match self.max_retries {
            Some(max) if retries >= max => RetryDecision::GiveUp,
            _ => RetryDecision::Retry {
                delay: self.delay_for(retries),
            },
        }
    }

    /// Backoff before retry number `retries + 1`.
    pub fn delay_for(&self, retries: u32) -> Duration {
        let factor = 1u32.checked_shl(retries).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_policy_gives_up() {
        let policy = RetryPolicy::new(2);
        assert!(matches!(policy.decide(0), RetryDecision::Retry { .. }));
        assert!(matches!(policy.decide(1), RetryDecision::Retry { .. }));
        assert_eq!(policy.decide(2), RetryDecision::GiveUp);
    }

    #[test]
    fn test_none_never_retries() {
        assert_eq!(RetryPolicy::none().decide(0), RetryDecision::GiveUp);
    }

    #[test]
    fn test_unbounded_always_retries() {
        let policy = RetryPolicy::unbounded();
        assert!(matches!(policy.decide(10_000), RetryDecision::Retry { .. }));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10)
            .with_backoff(Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(500));
        assert_eq!(policy.delay_for(64), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_backoff() {
        let policy = RetryPolicy::new(1).with_backoff(Duration::ZERO, Duration::ZERO);
        assert_eq!(
            policy.decide(0),
            RetryDecision::Retry {
                delay: Duration::ZERO
            }
        );
    }
}

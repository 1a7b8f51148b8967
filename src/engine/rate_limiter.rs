//! Token bucket pacing for probes.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Caps the number of probes started per second across all workers.
///
/// Clones share one bucket.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<GovLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    /// A limiter allowing `rate` probes per second, or `None` for a rate of 0.
    pub fn per_second(rate: u32) -> Option<Self> {
        NonZeroU32::new(rate).map(|rate| Self {
            limiter: Arc::new(GovLimiter::direct(Quota::per_second(rate))),
        })
    }

    /// Wait until a token is available.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_zero_rate_disables_limiting() {
        assert!(RateLimiter::per_second(0).is_none());
        assert!(RateLimiter::per_second(1).is_some());
    }

    #[tokio::test]
    async fn test_wait_with_high_rate() {
        let limiter = RateLimiter::per_second(1000).unwrap();
        limiter.wait().await;
    }

    #[tokio::test]
    async fn test_clones_share_bucket() {
        // The bucket holds one second of tokens; the third waits for a refill.
        let limiter = RateLimiter::per_second(2).unwrap();
        let shared = limiter.clone();
        let start = Instant::now();
        limiter.wait().await;
        shared.wait().await;
        shared.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(400));
    }
}

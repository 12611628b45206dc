//! Sliding-window rate limiter
//!
//! Admits at most `max_requests` calls in any trailing `window`. A caller
//! that would exceed the limit waits until the oldest admission leaves the
//! window. The lock is held while waiting, so callers are admitted in
//! arrival order.

use std::collections::VecDeque;
use std::time::Duration;

use application::ports::AdmissionPort;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimitAppConfig;

/// Sliding-window admission control for provider requests
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    admitted: Mutex<VecDeque<Instant>>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindowLimiter {
    /// Create a limiter; a zero limit is raised to one
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = usize::try_from(max_requests.max(1)).unwrap_or(usize::MAX);
        Self {
            admitted: Mutex::new(VecDeque::with_capacity(max_requests.min(1024))),
            max_requests,
            window,
        }
    }

    #[must_use]
    pub fn from_config(config: &RateLimitAppConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Wait for admission and record it
    pub async fn acquire(&self) {
        let mut admitted = self.admitted.lock().await;
        self.expire(&mut admitted, Instant::now());

        if admitted.len() >= self.max_requests {
            if let Some(&oldest) = admitted.front() {
                let ready_at = oldest + self.window;
                debug!(
                    wait_ms = u64::try_from(
                        ready_at.saturating_duration_since(Instant::now()).as_millis()
                    )
                    .unwrap_or(u64::MAX),
                    "Rate limit reached, waiting for window to slide"
                );
                tokio::time::sleep_until(ready_at).await;
            }
            self.expire(&mut admitted, Instant::now());
        }

        admitted.push_back(Instant::now());
    }

    /// Admissions currently inside the window
    pub async fn in_window(&self) -> usize {
        let mut admitted = self.admitted.lock().await;
        self.expire(&mut admitted, Instant::now());
        admitted.len()
    }

    fn expire(&self, admitted: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = admitted.front() {
            if now.duration_since(oldest) >= self.window {
                admitted.pop_front();
            } else {
                break;
            }
        }
    }
}

#[async_trait]
impl AdmissionPort for SlidingWindowLimiter {
    async fn admit(&self) {
        self.acquire().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_limit_without_waiting() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_window().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn extra_admission_waits_for_window_to_slide() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(20)).await;
        limiter.acquire().await;

        limiter.acquire().await;

        // The first admission leaves the window at t=60
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(60), "waited {waited:?}");
        assert!(waited < Duration::from_secs(61), "waited {waited:?}");
        assert_eq!(limiter.in_window().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn window_expires_old_admissions() {
        let limiter = SlidingWindowLimiter::new(5, Duration::from_secs(10));
        limiter.acquire().await;
        limiter.acquire().await;

        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(limiter.in_window().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_never_exceed_limit() {
        let limiter = Arc::new(SlidingWindowLimiter::new(4, Duration::from_secs(60)));
        let start = Instant::now();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await;
                    start.elapsed()
                })
            })
            .collect();

        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();

        // Any 5 consecutive admissions must span at least one window
        for pair in times.windows(5) {
            assert!(pair[4] - pair[0] >= Duration::from_secs(60), "{times:?}");
        }
        assert_eq!(times.iter().filter(|t| t.is_zero()).count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_limit_is_treated_as_one() {
        let limiter = SlidingWindowLimiter::new(0, Duration::from_secs(1));
        limiter.acquire().await;
        assert_eq!(limiter.in_window().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn works_through_admission_port() {
        let limiter: Arc<dyn AdmissionPort> =
            Arc::new(SlidingWindowLimiter::from_config(&RateLimitAppConfig::default()));
        limiter.admit().await;
    }
}

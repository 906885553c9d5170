//! Per-host token-bucket rate limiting for outbound requests.
//!
//! Each host gets its own bucket holding up to `burst` tokens that refill at
//! `requests_per_second`. [`RateLimiter::acquire`] waits until a token is
//! available. Timing uses `tokio::time`, so tests can drive it with a paused
//! clock.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Longest single wait before the bucket is re-checked.
const MAX_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket limiter keyed by host name.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_second: f64,
    burst: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// A non-positive `requests_per_second` disables limiting.
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        Self {
            requests_per_second,
            burst: f64::from(burst.max(1)),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.requests_per_second > 0.0
    }

    /// Wait until a request to `host` is allowed, then consume one token.
    pub async fn acquire(&self, host: &str) {
        if !self.is_enabled() {
            return;
        }

        loop {
            let wait = {
                let mut buckets = self.buckets.lock().await;
                let now = Instant::now();
                let bucket = buckets.entry(host.to_string()).or_insert_with(|| Bucket {
                    tokens: self.burst,
                    last_refill: now,
                });

                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                bucket.tokens = (bucket.tokens + elapsed * self.requests_per_second).min(self.burst);
                bucket.last_refill = now;

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }
                Duration::try_from_secs_f64((1.0 - bucket.tokens) / self.requests_per_second)
                    .map_or(MAX_WAIT, |wait| wait.min(MAX_WAIT))
            };

            debug!(%host, ?wait, "Rate limiter delaying request");
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_paces_requests_to_one_host() {
        let limiter = RateLimiter::new(4.0, 1);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire("www.linkedin.com").await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(990), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(1100), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiny_rate_waits_in_capped_steps() {
        let limiter = RateLimiter::new(1e-20, 1);
        limiter.acquire("h").await;

        let second = tokio::time::timeout(Duration::from_secs(600), limiter.acquire("h")).await;
        assert!(second.is_err(), "second token should not be available yet");
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_immediate() {
        let limiter = RateLimiter::new(1.0, 3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire("github.com").await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hosts_are_independent() {
        let limiter = RateLimiter::new(1.0, 1);
        let start = Instant::now();
        limiter.acquire("a.example").await;
        limiter.acquire("b.example").await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire("a.example").await;
        assert!(start.elapsed() >= Duration::from_millis(990));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_never_waits() {
        let limiter = RateLimiter::new(0.0, 1);
        assert!(!limiter.is_enabled());
        let start = Instant::now();
        for _ in 0..100 {
            limiter.acquire("www.linkedin.com").await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

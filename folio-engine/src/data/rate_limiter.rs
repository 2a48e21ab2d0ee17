//! Token bucket limiter for quote requests.
//!
//! Keeps a batch of price lookups under a provider's request budget.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Fixed-point scale for fractional tokens.
const TOKEN_SCALE: u64 = 1000;

/// A token bucket rate limiter.
///
/// Holds up to one second's worth of requests and refills continuously at
/// `requests_per_minute / 60` tokens per second.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    /// Available tokens, scaled by [`TOKEN_SCALE`]
    tokens: AtomicU64,
    /// Scaled tokens added per millisecond
    refill_per_ms: f64,
    last_refill: Mutex<Instant>,
    name: String,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_minute` lookups.
    pub fn new(name: impl Into<String>, requests_per_minute: u32) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        let capacity = ((requests_per_minute as f64 / 60.0).ceil() as u32).max(1);

        Self {
            capacity,
            tokens: AtomicU64::new(capacity as u64 * TOKEN_SCALE),
            refill_per_ms: requests_per_minute as f64 / 60_000.0 * TOKEN_SCALE as f64,
            last_refill: Mutex::new(Instant::now()),
            name: name.into(),
        }
    }

    /// Bucket capacity in whole requests.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Wait until a token is available, then take it.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }

            let wait_ms = (TOKEN_SCALE as f64 / self.refill_per_ms).ceil() as u64;
            let wait = Duration::from_millis(wait_ms.clamp(10, 1000));

            debug!(
                limiter = %self.name,
                wait_ms = wait.as_millis() as u64,
                "Quote budget exhausted, waiting for token"
            );

            tokio::time::sleep(wait).await;
        }
    }

    /// Take a token if one is available.
    pub fn try_acquire(&self) -> bool {
        self.refill();

        self.tokens
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_sub(TOKEN_SCALE)
            })
            .is_ok()
    }

    /// Whole tokens currently available.
    pub fn available(&self) -> u32 {
        self.refill();
        (self.tokens.load(Ordering::Relaxed) / TOKEN_SCALE) as u32
    }

    fn refill(&self) {
        // Another task holding the lock is already refilling.
        let Ok(mut last_refill) = self.last_refill.try_lock() else {
            return;
        };

        let now = Instant::now();
        let elapsed_ms = now.duration_since(*last_refill).as_millis() as f64;
        let added = (elapsed_ms * self.refill_per_ms) as u64;
        if added == 0 {
            return;
        }

        let max_tokens = self.capacity as u64 * TOKEN_SCALE;
        let _ = self
            .tokens
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some((current + added).min(max_tokens))
            });
        *last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_one_second_of_requests() {
        assert_eq!(RateLimiter::new("test", 600).capacity(), 10);
        assert_eq!(RateLimiter::new("test", 30).capacity(), 1);
        assert_eq!(RateLimiter::new("test", 0).capacity(), 1);
    }

    #[test]
    fn test_try_acquire_drains_bucket() {
        let limiter = RateLimiter::new("test", 180);
        assert_eq!(limiter.capacity(), 3);

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_refill() {
        // 6000/min refills one token every 10ms
        let limiter = RateLimiter::new("test", 6000);
        while limiter.try_acquire() {}

        let acquired = tokio::time::timeout(Duration::from_secs(2), limiter.acquire()).await;
        assert!(acquired.is_ok());
    }
}

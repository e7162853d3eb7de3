//! Token-bucket rate limiter guarding the remote completion call.
//!
//! Tokens accrue continuously from elapsed wall-clock time up to the
//! bucket capacity. All consumption happens under one lock, so concurrent
//! callers can never spend the same token twice.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

/// Returned by [`RateLimiter::acquire`] when no token could be obtained
/// within the configured wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limit exceeded")]
pub struct RateLimitExceeded;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    /// `None` waits indefinitely, `Some(ZERO)` never blocks.
    acquire_timeout: Option<Duration>,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// A full bucket holding `capacity` tokens, refilled at `refill_per_sec`.
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        let capacity = f64::from(capacity);
        Self {
            capacity,
            refill_per_sec: refill_per_sec.max(0.0),
            acquire_timeout: None,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// `rpm` requests per minute with a burst of `rpm`.
    pub fn per_minute(rpm: u32) -> Self {
        Self::new(rpm, f64::from(rpm) / 60.0)
    }

    pub fn with_acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    /// Tokens currently available, after accrual.
    pub fn available(&self) -> f64 {
        let mut bucket = self.lock();
        self.refill(&mut bucket);
        bucket.tokens
    }

    /// Take `n` tokens if they are available right now. Never waits.
    pub fn try_consume(&self, n: u32) -> bool {
        let n = f64::from(n);
        let mut bucket = self.lock();
        self.refill(&mut bucket);
        if bucket.tokens >= n {
            bucket.tokens -= n;
            true
        } else {
            false
        }
    }

    /// Take one token, waiting for accrual up to the configured timeout.
    ///
    /// The lock is released while waiting.
    pub async fn acquire(&self) -> Result<(), RateLimitExceeded> {
        let deadline = self.acquire_timeout.map(|t| Instant::now() + t);

        loop {
            let wait = {
                let mut bucket = self.lock();
                self.refill(&mut bucket);
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return Ok(());
                }
                if self.refill_per_sec <= 0.0 {
                    return Err(RateLimitExceeded);
                }
                // Rates near zero overflow `Duration`.
                Duration::try_from_secs_f64((1.0 - bucket.tokens) / self.refill_per_sec)
                    .unwrap_or(Duration::MAX)
            };

            let wait = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(RateLimitExceeded);
                    }
                    wait.min(remaining)
                }
                None => wait,
            };

            debug!(wait_ms = wait.as_millis() as u64, "waiting for rate limit token");
            tokio::time::sleep(wait).await;
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;
    }

    fn lock(&self) -> MutexGuard<'_, Bucket> {
        self.bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn starts_full_and_rejects_when_exhausted() {
        let limiter = RateLimiter::new(3, 0.01);
        assert!(limiter.try_consume(1));
        assert!(limiter.try_consume(1));
        assert!(limiter.try_consume(1));
        assert!(!limiter.try_consume(1));
        assert!(!limiter.try_consume(1));
    }

    #[test]
    fn try_consume_more_than_available_takes_nothing() {
        let limiter = RateLimiter::new(2, 0.0);
        assert!(!limiter.try_consume(3));
        assert!(limiter.try_consume(2));
    }

    #[test]
    fn refills_after_one_interval() {
        // One token every 50ms.
        let limiter = RateLimiter::new(1, 20.0);
        assert!(limiter.try_consume(1));
        assert!(!limiter.try_consume(1));

        std::thread::sleep(Duration::from_millis(70));
        assert!(limiter.try_consume(1));
    }

    #[test]
    fn refill_is_capped_at_capacity() {
        let limiter = RateLimiter::new(2, 1000.0);
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.available() <= 2.0);
    }

    #[test]
    fn concurrent_consumers_never_double_spend() {
        let limiter = RateLimiter::new(10, 0.0);
        let successes = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..50 {
                scope.spawn(|| {
                    if limiter.try_consume(1) {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(successes.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn per_minute_sets_capacity_and_rate() {
        let limiter = RateLimiter::per_minute(60);
        assert_eq!(limiter.capacity(), 60);
        assert!((limiter.refill_per_sec - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn acquire_takes_available_token_immediately() {
        let limiter = RateLimiter::new(1, 0.0).with_acquire_timeout(Some(Duration::ZERO));
        assert!(limiter.acquire().await.is_ok());
        assert_eq!(limiter.acquire().await, Err(RateLimitExceeded));
    }

    #[tokio::test]
    async fn acquire_waits_for_refill() {
        let limiter = RateLimiter::new(1, 50.0);
        assert!(limiter.try_consume(1));

        let started = Instant::now();
        limiter.acquire().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn acquire_gives_up_after_timeout() {
        let limiter =
            RateLimiter::new(1, 0.1).with_acquire_timeout(Some(Duration::from_millis(20)));
        assert!(limiter.try_consume(1));
        assert_eq!(limiter.acquire().await, Err(RateLimitExceeded));
    }

    #[tokio::test]
    async fn acquire_without_refill_fails_fast() {
        let limiter = RateLimiter::new(0, 0.0);
        assert_eq!(limiter.acquire().await, Err(RateLimitExceeded));
    }

    #[tokio::test]
    async fn acquire_with_negligible_refill_times_out() {
        let limiter =
            RateLimiter::new(1, 1e-30).with_acquire_timeout(Some(Duration::from_millis(10)));
        assert!(limiter.try_consume(1));
        assert_eq!(limiter.acquire().await, Err(RateLimitExceeded));
    }
}

//! Token bucket with lazy refill

use super::clock::{Clock, MonotonicClock};
use crate::config::{ConfigError, LimiterConfig};
use crate::error::Cancelled;
use crate::traits::RateLimiter;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Poll interval used by [`TokenBucketLimiter::wait`] unless overridden
pub const DEFAULT_WAIT_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    /// Add `elapsed * rate` tokens, capped at `capacity`. Never removes tokens.
    #[inline]
    fn refill(&mut self, now: Instant, rate: f64, capacity: f64) {
        if now <= self.last_refill {
            return;
        }
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

/// Token bucket rate limiter
///
/// Holds up to `capacity` tokens and refills continuously at `rate` tokens per
/// second. Refill is computed on demand from the time elapsed since the last
/// check, so an idle bucket costs nothing and needs no background task.
/// Token counts are fractional: at 0.5 tokens/s two checks one second apart
/// each add half a token.
///
/// Every check runs refill, test and decrement inside one short critical
/// section, so any number of threads may call [`allow`](Self::allow)
/// concurrently without lost updates or double admission. Callers are served
/// in lock acquisition order; there is no queue.
///
/// # Example
///
/// ```
/// use ratelimit_core::limiter::TokenBucketLimiter;
///
/// let limiter = TokenBucketLimiter::new(30.0, 50)?;
/// assert!(limiter.allow());
/// # Ok::<(), ratelimit_core::ConfigError>(())
/// ```
pub struct TokenBucketLimiter<C = MonotonicClock> {
    rate: f64,
    capacity: u32,
    backoff: Duration,
    clock: C,
    state: Mutex<BucketState>,
}

impl TokenBucketLimiter {
    /// Create a full bucket on the system clock
    ///
    /// # Errors
    /// Returns an error if `rate` is not a positive finite number or
    /// `capacity` is zero.
    pub fn new(rate: f64, capacity: u32) -> Result<Self, ConfigError> {
        Self::try_new(LimiterConfig::new(rate, capacity))
    }

    /// Create a full bucket from a config on the system clock
    pub fn try_new(config: LimiterConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, MonotonicClock)
    }
}

impl<C: Clock> TokenBucketLimiter<C> {
    /// Create a full bucket driven by `clock`
    pub fn with_clock(config: LimiterConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = BucketState {
            tokens: f64::from(config.capacity),
            last_refill: clock.now(),
        };

        Ok(Self {
            rate: config.rate,
            capacity: config.capacity,
            backoff: DEFAULT_WAIT_BACKOFF,
            clock,
            state: Mutex::new(state),
        })
    }

    /// Set the poll interval used by [`wait`](Self::wait)
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Refill rate in tokens per second
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Maximum tokens held
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Poll interval used by [`wait`](Self::wait)
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Take one token if available
    ///
    /// Returns `false` without touching the token count when fewer than one
    /// token is available after refill.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.refill(now, self.rate, f64::from(self.capacity));

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens that a check made now would see, without consuming or
    /// committing the refill
    pub fn available(&self) -> f64 {
        let mut projected = *self.state.lock();
        projected.refill(self.clock.now(), self.rate, f64::from(self.capacity));
        projected.tokens
    }

    /// Wait until a token is taken
    ///
    /// This is a fixed-interval poll: it retries [`allow`](Self::allow) every
    /// [`backoff`](Self::backoff) rather than waking on refill, so admission
    /// latency is quantised to the backoff.
    ///
    /// # Errors
    /// Returns [`Cancelled`] as soon as `cancel` fires, including when it has
    /// already fired on entry.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }

            if self.allow() {
                return Ok(());
            }

            tokio::select! {
                biased;

                () = cancel.cancelled() => return Err(Cancelled),
                () = tokio::time::sleep(self.backoff) => {}
            }
        }
    }
}

#[async_trait]
impl<C: Clock + 'static> RateLimiter for TokenBucketLimiter<C> {
    fn allow(&self) -> bool {
        TokenBucketLimiter::allow(self)
    }

    async fn wait(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        TokenBucketLimiter::wait(self, cancel).await
    }
}

impl<C> std::fmt::Debug for TokenBucketLimiter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucketLimiter")
            .field("rate", &self.rate)
            .field("capacity", &self.capacity)
            .field("tokens", &self.state.lock().tokens)
            .field("backoff", &self.backoff)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::ManualClock;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    fn manual(rate: f64, capacity: u32) -> (TokenBucketLimiter<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let limiter = TokenBucketLimiter::with_clock(LimiterConfig::new(rate, capacity), clock.clone())
            .expect("valid config");
        (limiter, clock)
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(TokenBucketLimiter::new(0.0, 10).is_err());
        assert!(TokenBucketLimiter::new(-3.0, 10).is_err());
        assert!(TokenBucketLimiter::new(f64::NAN, 10).is_err());
        assert!(TokenBucketLimiter::new(5.0, 0).is_err());
    }

    #[test]
    fn test_starts_full() {
        let (limiter, _clock) = manual(1.0, 7);
        assert_eq!(limiter.available(), 7.0);
        assert_eq!(limiter.capacity(), 7);
        assert_eq!(limiter.rate(), 1.0);
    }

    #[test]
    fn test_burst_of_capacity_then_deny() {
        let (limiter, _clock) = manual(10.0, 5);

        for i in 0..5 {
            assert!(limiter.allow(), "call {} should be admitted", i + 1);
        }
        assert!(!limiter.allow(), "call past capacity should be denied");
        assert_eq!(limiter.available(), 0.0);
    }

    #[test]
    fn test_denial_leaves_tokens_unchanged() {
        let (limiter, clock) = manual(2.0, 1);
        assert!(limiter.allow());

        clock.advance(Duration::from_millis(250));
        assert!(!limiter.allow());
        assert!((limiter.available() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_spaced_calls_never_denied() {
        for rate in [1.0, 4.0, 10.0, 30.0] {
            let (limiter, clock) = manual(rate, 1);
            let spacing = Duration::from_nanos((1e9 / rate).ceil() as u64);

            for i in 0..100 {
                assert!(limiter.allow(), "rate {rate}: call {i} was denied");
                clock.advance(spacing);
            }
        }
    }

    #[test]
    fn test_fractional_tokens_accumulate() {
        let (limiter, clock) = manual(0.5, 1);
        assert!(limiter.allow());

        clock.advance(Duration::from_secs(1));
        assert!(!limiter.allow(), "half a token is not enough");

        clock.advance(Duration::from_secs(1));
        assert!(limiter.allow(), "two half tokens make one");
    }

    #[test]
    fn test_idle_refill_is_capped() {
        let (limiter, clock) = manual(10.0, 5);
        for _ in 0..5 {
            assert!(limiter.allow());
        }

        clock.advance(Duration::from_secs(10));
        assert_eq!(limiter.available(), 5.0);

        for _ in 0..5 {
            assert!(limiter.allow());
        }
        assert!(!limiter.allow());
    }

    #[test]
    fn test_available_does_not_commit_refill() {
        let (limiter, clock) = manual(1.0, 3);
        for _ in 0..3 {
            assert!(limiter.allow());
        }

        clock.advance(Duration::from_secs(2));
        assert_eq!(limiter.available(), 2.0);
        assert_eq!(limiter.available(), 2.0);

        assert!(limiter.allow());
        assert_eq!(limiter.available(), 1.0);
    }

    #[test]
    fn test_concurrent_allow_admits_exactly_k() {
        const K: usize = 64;
        let (limiter, _clock) = manual(1.0, 100);
        let admitted = AtomicUsize::new(0);
        let barrier = Barrier::new(K);

        std::thread::scope(|s| {
            for _ in 0..K {
                s.spawn(|| {
                    barrier.wait();
                    if limiter.allow() {
                        admitted.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::Relaxed), K);
        assert_eq!(limiter.available(), 36.0);
    }

    #[test]
    fn test_concurrent_allow_never_over_admits() {
        const THREADS: usize = 16;
        const CALLS: usize = 50;
        let (limiter, _clock) = manual(1.0, 200);
        let limiter = Arc::new(limiter);
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    for _ in 0..CALLS {
                        if limiter.allow() {
                            admitted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 800 attempts against 200 tokens
        assert_eq!(admitted.load(Ordering::Relaxed), 200);
        assert_eq!(limiter.available(), 0.0);
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_with_tokens() {
        let (limiter, _clock) = manual(1.0, 2);
        let cancel = CancellationToken::new();

        limiter.wait(&cancel).await.expect("token available");
        assert_eq!(limiter.available(), 1.0);
    }

    #[tokio::test]
    async fn test_wait_polls_until_refill() {
        let limiter = TokenBucketLimiter::new(200.0, 1)
            .unwrap()
            .with_backoff(Duration::from_millis(1));
        let cancel = CancellationToken::new();
        assert!(limiter.allow());

        let result =
            tokio::time::timeout(Duration::from_secs(2), limiter.wait(&cancel)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_wait_cancelled_while_waiting() {
        let (limiter, _clock) = manual(1.0, 1);
        assert!(limiter.allow());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        // Manual clock never refills, so only cancellation can end the wait
        let result = tokio::time::timeout(Duration::from_secs(2), limiter.wait(&cancel)).await;
        assert_eq!(result.expect("wait should observe cancellation"), Err(Cancelled));
    }

    #[tokio::test]
    async fn test_wait_pre_cancelled() {
        let (limiter, _clock) = manual(1.0, 5);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(limiter.wait(&cancel).await, Err(Cancelled));
        assert_eq!(limiter.available(), 5.0, "no token taken after cancellation");
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let (limiter, _clock) = manual(1.0, 1);
        let limiter: Arc<dyn RateLimiter> = Arc::new(limiter);
        let cancel = CancellationToken::new();

        limiter.wait(&cancel).await.unwrap();
        assert!(!limiter.allow());
    }

    #[test]
    fn test_debug_format() {
        let (limiter, _clock) = manual(2.5, 4);
        let debug = format!("{:?}", limiter);
        assert!(debug.contains("TokenBucketLimiter"));
        assert!(debug.contains("2.5"));
        assert!(debug.contains("capacity: 4"));
    }
}

// src/fetch/limiter.rs
// =============================================================================
// A token bucket rate limiter.
//
// How it works:
// - The bucket holds up to `burst` tokens and starts full
// - Tokens drip back in continuously at `rate` tokens per second
// - Each request takes one token
// - No token available? Reserve the next one (the balance goes negative)
//   and sleep until it has dripped in
//
// Compared to "N requests per fixed window", this gives smooth long-run
// throughput while still letting a short burst through immediately.
//
// All state sits behind one mutex, so only one admission decision is made
// at a time even when many tasks share the same bucket. The token count is
// never exposed; callers can only ask to be admitted.
//
// Rust concepts:
// - tokio::sync::Mutex: A lock that can be awaited without blocking a thread
// - f64 tokens: Partial tokens accumulate between requests
// =============================================================================

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tracing::debug;

use super::context::{DoneReason, FetchContext};
use crate::error::{PageError, RateLimitReason};

impl From<DoneReason> for RateLimitReason {
    fn from(reason: DoneReason) -> Self {
        match reason {
            DoneReason::Cancelled => RateLimitReason::Cancelled,
            DoneReason::DeadlineExceeded => RateLimitReason::DeadlineExceeded,
        }
    }
}

pub struct TokenBucket {
    rate: f64,
    burst: u32,
    state: Mutex<BucketState>,
}

// The mutable part of the bucket
struct BucketState {
    // Can go negative while callers are waiting on reserved tokens
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    // Adds the tokens that dripped in since the last refill, capped at burst
    fn refill(&mut self, now: Instant, rate: f64, burst: u32) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * rate).min(f64::from(burst));
        self.last_refill = now;
    }
}

impl TokenBucket {
    // Creates a full bucket
    //
    // Parameters:
    //   rate: tokens added per second (must be positive and finite)
    //   burst: maximum tokens held at once (must be at least 1)
    pub fn new(rate: f64, burst: u32) -> Result<Self, PageError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PageError::Config(format!(
                "rate must be a positive number of tokens per second, got {}",
                rate
            )));
        }
        if burst == 0 {
            return Err(PageError::Config("burst must be at least 1".to_string()));
        }

        Ok(Self {
            rate,
            burst,
            state: Mutex::new(BucketState {
                tokens: f64::from(burst),
                last_refill: Instant::now(),
            }),
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    // Takes a token if one is available right now, never waits
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        state.refill(Instant::now(), self.rate, self.burst);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    // Waits until a token is ours, or until the context ends
    //
    // If the token would only arrive after the context's deadline, there
    // is no point waiting: we fail straight away and take nothing.
    // If the context ends while we are sleeping, the reserved token is
    // handed back so later callers aren't penalised for our wait.
    pub async fn acquire(&self, ctx: &FetchContext) -> Result<(), RateLimitReason> {
        if let Some(reason) = ctx.done_reason() {
            return Err(reason.into());
        }

        let ready_at = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            state.refill(now, self.rate, self.burst);

            // A wait too long to represent is certainly past the deadline
            let ready_at = if state.tokens >= 1.0 {
                Some(now)
            } else {
                Duration::try_from_secs_f64((1.0 - state.tokens) / self.rate)
                    .ok()
                    .and_then(|wait| now.checked_add(wait))
            };

            let ready_at = match ready_at {
                Some(at) if at <= ctx.deadline() => at,
                _ => return Err(RateLimitReason::WouldExceedDeadline),
            };

            state.tokens -= 1.0;
            ready_at
        };

        let wait = ready_at.saturating_duration_since(Instant::now());
        if wait.is_zero() {
            return Ok(());
        }

        debug!(wait_ms = wait.as_millis() as u64, "waiting for rate limiter");

        tokio::select! {
            biased;
            _ = time::sleep_until(ready_at) => Ok(()),
            reason = ctx.done() => {
                self.give_back().await;
                Err(reason.into())
            }
        }
    }

    // Returns a reserved token that was never used
    async fn give_back(&self) {
        let mut state = self.state.lock().await;
        state.refill(Instant::now(), self.rate, self.burst);
        state.tokens = (state.tokens + 1.0).min(f64::from(self.burst));
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why reserve a token before sleeping?
//    - Two tasks waiting on an empty bucket must not both wake up and grab
//      the same token
//    - Taking it under the lock first means each waiter owns a distinct
//      future token, and waiters are admitted one `1 / rate` apart
//
// 2. Why tokio's Instant instead of std's?
//    - Tests can pause tokio's clock and skip ahead, so timing tests run
//      instantly and never flake
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(TokenBucket::new(0.0, 1), Err(PageError::Config(_))));
        assert!(matches!(TokenBucket::new(-1.0, 1), Err(PageError::Config(_))));
        assert!(matches!(TokenBucket::new(f64::NAN, 1), Err(PageError::Config(_))));
        assert!(matches!(TokenBucket::new(1.0, 0), Err(PageError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_full_then_refills() {
        let bucket = TokenBucket::new(1.0, 3).unwrap();
        assert!(bucket.try_acquire().await);
        assert!(bucket.try_acquire().await);
        assert!(bucket.try_acquire().await);
        assert!(!bucket.try_acquire().await);

        time::sleep(Duration::from_millis(1100)).await;
        assert!(bucket.try_acquire().await);
        assert!(!bucket.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_caps_at_burst() {
        let bucket = TokenBucket::new(10.0, 2).unwrap();
        time::sleep(Duration::from_secs(60)).await;

        assert!(bucket.try_acquire().await);
        assert!(bucket.try_acquire().await);
        assert!(!bucket.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_steady_rate() {
        let bucket = TokenBucket::new(2.0, 2).unwrap();
        let ctx = FetchContext::with_timeout(Duration::from_secs(30));
        let start = Instant::now();

        let mut admitted = Vec::new();
        for _ in 0..4 {
            bucket.acquire(&ctx).await.unwrap();
            admitted.push(Instant::now() - start);
        }

        assert_eq!(admitted[0], Duration::ZERO);
        assert_eq!(admitted[1], Duration::ZERO);
        assert!(admitted[2] >= Duration::from_millis(500));
        assert!(admitted[3] >= Duration::from_millis(1000));
        assert!(admitted[3] < Duration::from_millis(1100));
    }

    #[tokio::test]
    async fn test_short_deadline_on_empty_bucket() {
        let bucket = TokenBucket::new(0.1, 1).unwrap();
        assert!(bucket.try_acquire().await);

        let ctx = FetchContext::with_timeout(Duration::from_millis(10));
        let start = Instant::now();
        let result = bucket.acquire(&ctx).await;

        assert_eq!(result, Err(RateLimitReason::WouldExceedDeadline));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_tiny_rate_refuses_instead_of_overflowing() {
        let bucket = TokenBucket::new(1e-20, 1).unwrap();
        assert!(bucket.try_acquire().await);

        let ctx = FetchContext::with_timeout(Duration::from_secs(30));
        let result = bucket.acquire(&ctx).await;
        assert_eq!(result, Err(RateLimitReason::WouldExceedDeadline));
    }

    #[tokio::test]
    async fn test_expired_context_is_refused() {
        let bucket = TokenBucket::new(1.0, 1).unwrap();
        let ctx = FetchContext::with_timeout(Duration::ZERO);

        let result = bucket.acquire(&ctx).await;
        assert_eq!(result, Err(RateLimitReason::DeadlineExceeded));
        // Nothing was consumed
        assert!(bucket.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_returns_reserved_token() {
        let bucket = Arc::new(TokenBucket::new(2.0, 1).unwrap());
        assert!(bucket.try_acquire().await);

        let ctx = FetchContext::with_timeout(Duration::from_secs(30));
        let waiter = {
            let bucket = Arc::clone(&bucket);
            let ctx = ctx.clone();
            tokio::spawn(async move { bucket.acquire(&ctx).await })
        };

        time::sleep(Duration::from_millis(100)).await;
        ctx.cancel();
        assert_eq!(waiter.await.unwrap(), Err(RateLimitReason::Cancelled));

        // The token reserved for the waiter was handed back, so one is
        // available again well before a full second has passed.
        time::sleep(Duration::from_millis(500)).await;
        assert!(bucket.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_bucket_serializes_waiters() {
        let bucket = Arc::new(TokenBucket::new(10.0, 1).unwrap());
        let ctx = FetchContext::with_timeout(Duration::from_secs(30));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let bucket = Arc::clone(&bucket);
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                bucket.acquire(&ctx).await.map(|_| Instant::now())
            }));
        }

        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap().unwrap() - start);
        }
        times.sort();

        assert_eq!(times[0], Duration::ZERO);
        assert!(times[1] >= Duration::from_millis(100));
        assert!(times[2] >= Duration::from_millis(200));
    }
}

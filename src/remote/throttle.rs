//! Shared request throttle
//!
//! All fetch workers consult a single token bucket before issuing a request,
//! so the pool as a whole cannot exceed the remote API's quota regardless of
//! how many workers are running.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Token bucket rate limiter shared across fetch workers
///
/// The bucket starts full. Each request consumes one token; tokens refill
/// continuously at the configured rate up to the bucket capacity. `acquire`
/// suspends the calling task until a token is available, so workers back off
/// naturally instead of busy-waiting.
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_per_sec: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a new token bucket, initially full
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of stored tokens (burst size)
    /// * `refill_per_sec` - Tokens added per second
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: f64::from(capacity),
                last_refill: Instant::now(),
            }),
            capacity: f64::from(capacity),
            refill_per_sec,
        }
    }

    /// Acquires one token, waiting for the refill if none is available
    ///
    /// This is the single suspension point shared by all workers; the lock is
    /// released while sleeping so other workers can take tokens that refill
    /// in the meantime.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }

                // Time until one whole token has refilled
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
            };

            tokio::time::sleep(wait).await;
        }
    }

    /// Adds tokens for the time elapsed since the last refill
    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }
}

//! Token bucket with context-aware waiting.
//!
//! Holds up to `capacity` tokens and refills continuously at `per_second`
//! tokens per second. Callers `await` on [`TokenBucket::acquire`]; it returns
//! as soon as a token is available, otherwise it sleeps until the next token
//! is due or the context is done.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::context::{Context, ContextError};

/// Refill arithmetic is floating point; anything this close to a whole token
/// counts as one.
const TOKEN_EPSILON: f64 = 1e-9;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, now: Instant, capacity: f64, per_second: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * per_second).min(capacity);
        self.last_refill = now;
    }
}

/// A single rate-limiting scope.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    per_second: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket.
    ///
    /// * `capacity`   – burst size (clamped to at least 1)
    /// * `per_second` – sustained refill rate (non-positive values become 1/s)
    pub fn new(capacity: u32, per_second: f64) -> Self {
        let capacity = capacity.max(1) as f64;
        let per_second = if per_second.is_finite() && per_second > 0.0 {
            per_second
        } else {
            1.0
        };
        Self {
            capacity,
            per_second,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    pub fn per_second(&self) -> f64 {
        self.per_second
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take one token if available, otherwise report how long until one is.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut state = self.lock();
        state.refill(Instant::now(), self.capacity, self.per_second);
        if state.tokens + TOKEN_EPSILON >= 1.0 {
            state.tokens = (state.tokens - 1.0).max(0.0);
            Ok(())
        } else {
            let needed = 1.0 - state.tokens;
            // Tiny refill rates overflow `Duration`; treat those as "never".
            Err(Duration::try_from_secs_f64(needed / self.per_second).unwrap_or(Duration::MAX))
        }
    }

    /// Tokens currently available (after refill).
    pub fn available(&self) -> f64 {
        let mut state = self.lock();
        state.refill(Instant::now(), self.capacity, self.per_second);
        state.tokens
    }

    /// Whether the bucket has refilled to capacity. A full bucket behaves
    /// exactly like a newly created one.
    pub fn is_full(&self) -> bool {
        self.available() + TOKEN_EPSILON >= self.capacity
    }

    /// Wait for one token, or fail with the context's reason.
    ///
    /// A context that is already done fails even when a token is available.
    /// When the context has a deadline that falls before the next token, the
    /// wait is not started and `DeadlineExceeded` is returned immediately.
    pub async fn acquire(&self, ctx: &Context) -> Result<(), ContextError> {
        loop {
            if let Some(reason) = ctx.err() {
                return Err(reason);
            }

            let wait = match self.try_acquire() {
                Ok(()) => return Ok(()),
                Err(wait) => wait,
            };

            if let Some(remaining) = ctx.remaining() {
                if wait > remaining {
                    return Err(ContextError::DeadlineExceeded);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                reason = ctx.done() => return Err(reason),
            }
        }
    }
}

//! Per-destination limiter registry.
//!
//! Lookup-or-create happens under one mutex so concurrent first sends to the
//! same destination share a single bucket. Once the registry reaches its
//! prune threshold, entries that nobody holds and that have refilled to
//! capacity are dropped; a full bucket is equivalent to a fresh one, so this
//! never loosens the limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::bucket::TokenBucket;

pub struct DestinationLimiters {
    capacity: u32,
    per_second: f64,
    prune_threshold: usize,
    limiters: Mutex<HashMap<String, Arc<TokenBucket>>>,
}

impl DestinationLimiters {
    pub fn new(capacity: u32, per_second: f64, prune_threshold: usize) -> Self {
        Self {
            capacity,
            per_second,
            prune_threshold: prune_threshold.max(1),
            limiters: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<TokenBucket>>> {
        self.limiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The bucket for `destination`, creating it on first use.
    pub fn get_or_create(&self, destination: &str) -> Arc<TokenBucket> {
        let mut limiters = self.lock();

        if let Some(bucket) = limiters.get(destination) {
            return Arc::clone(bucket);
        }

        if limiters.len() >= self.prune_threshold {
            let removed = Self::prune_locked(&mut limiters);
            debug!(
                removed,
                remaining = limiters.len(),
                "pruned idle destination limiters"
            );
        }

        let bucket = Arc::new(TokenBucket::new(self.capacity, self.per_second));
        limiters.insert(destination.to_string(), Arc::clone(&bucket));
        debug!(destination = %destination, "created destination limiter");
        bucket
    }

    /// Drop every idle entry now. Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        Self::prune_locked(&mut self.lock())
    }

    fn prune_locked(limiters: &mut HashMap<String, Arc<TokenBucket>>) -> usize {
        let before = limiters.len();
        limiters.retain(|_, bucket| Arc::strong_count(bucket) > 1 || !bucket.is_full());
        before - limiters.len()
    }

    pub fn contains(&self, destination: &str) -> bool {
        self.lock().contains_key(destination)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

//! Two-tier rate limiting for the chat-bot channel.
//!
//! Models a typical bot API quota: one global bucket shared by every
//! destination (25 msg/s, burst 25) plus one bucket per destination
//! (1 msg/s, burst 1). A send must clear both, global first.
//!
//! The limiter is owned by whoever builds the senders (normally the
//! `Dispatcher`), so its lifetime and memory are tied to that instance.

pub mod bucket;
pub mod registry;

use std::sync::Arc;

use tracing::debug;

use crate::config::RateLimitConfig;
use crate::context::{Context, ContextError};

pub use bucket::TokenBucket;
pub use registry::DestinationLimiters;

/// Global bucket + per-destination registry.
pub struct ChannelRateLimiter {
    global: TokenBucket,
    destinations: DestinationLimiters,
}

impl ChannelRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        debug!(
            global_capacity = config.global_capacity,
            global_per_second = config.global_per_second,
            destination_capacity = config.destination_capacity,
            destination_per_second = config.destination_per_second,
            "creating channel rate limiter"
        );
        Self {
            global: TokenBucket::new(config.global_capacity, config.global_per_second),
            destinations: DestinationLimiters::new(
                config.destination_capacity,
                config.destination_per_second,
                config.destination_prune_threshold,
            ),
        }
    }

    /// Convenience for sharing one limiter between several senders.
    pub fn shared(config: &RateLimitConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Wait for a token from the global bucket.
    pub async fn acquire_global(&self, ctx: &Context) -> Result<(), ContextError> {
        self.global.acquire(ctx).await
    }

    /// Wait for a token from `destination`'s bucket, creating it on first use.
    pub async fn acquire_destination(
        &self,
        destination: &str,
        ctx: &Context,
    ) -> Result<(), ContextError> {
        let bucket = self.destinations.get_or_create(destination);
        bucket.acquire(ctx).await
    }

    pub fn global(&self) -> &TokenBucket {
        &self.global
    }

    pub fn destinations(&self) -> &DestinationLimiters {
        &self.destinations
    }
}

impl Default for ChannelRateLimiter {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}

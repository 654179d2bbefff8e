//! webnotify core — shared building blocks for the notification dispatcher.
//!
//! This crate contains:
//! - **config**: `NotifierConfig`, `RateLimitConfig`, and the JSON/env loader
//! - **context**: `Context`, the cancellation + deadline signal threaded through every send
//! - **error**: `NotifyError` / `AggregateError` taxonomy
//! - **rate_limit**: token buckets and the per-destination limiter registry
//! - **types**: `ChannelKind`

pub mod config;
pub mod context;
pub mod error;
pub mod rate_limit;
pub mod types;
pub mod utils;

pub use config::{NotifierConfig, RateLimitConfig};
pub use context::{Context, ContextError};
pub use error::{AggregateError, LimitScope, NotifyError};
pub use rate_limit::ChannelRateLimiter;
pub use types::ChannelKind;

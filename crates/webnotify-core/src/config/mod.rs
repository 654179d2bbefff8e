//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use webnotify_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Telegram configured: {}", cfg.notifier.is_valid_telegram());
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config};
pub use schema::{Config, NotifierConfig, RateLimitConfig};

//! webnotify channels — delivery senders and the fan-out dispatcher.
//!
//! This crate provides:
//! - **base**: The `Sender` trait every channel implements
//! - **dispatcher**: `Dispatcher` — builds senders from config and fans a message out
//!
//! Channel implementations are feature-gated (both on by default):
//! - `telegram`: Bot API `sendMessage`, two-tier rate limited
//! - `email`: SMTP submission via lettre

pub mod base;
pub mod dispatcher;

#[cfg(feature = "telegram")]
pub mod telegram;

#[cfg(feature = "email")]
pub mod email;

pub use base::Sender;
pub use dispatcher::Dispatcher;

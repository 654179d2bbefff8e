//! Configuration schema.
//!
//! Hierarchy: `Config` → `NotifierConfig`, `RateLimitConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

use crate::types::ChannelKind;

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default HTTP timeout for bot API calls, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.webnotify/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub notifier: NotifierConfig,
    pub rate_limits: RateLimitConfig,
}

// ─────────────────────────────────────────────
// Notifier credentials
// ─────────────────────────────────────────────

/// Credentials and addresses for every supported channel.
///
/// A flat record: each channel reads its own subset. A channel whose subset
/// is incomplete is simply not built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotifierConfig {
    // ── Telegram ──
    /// Bot token from @BotFather.
    pub tg_api_key: String,
    /// Chat / channel id that receives the messages.
    pub tg_channel_id: String,
    /// Bot API base URL (self-hosted Bot API servers, tests).
    pub tg_api_base: String,
    /// Treat non-2xx statuses and `"ok": false` bodies as delivery failures.
    pub tg_strict_responses: bool,
    /// Timeout for a single bot API request.
    pub http_timeout_secs: u64,

    // ── Email ──
    pub smtp_host: String,
    /// SMTP port; 465 selects implicit TLS, anything else STARTTLS.
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub to_email: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            tg_api_key: String::new(),
            tg_channel_id: String::new(),
            tg_api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            tg_strict_responses: false,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            smtp_host: String::new(),
            smtp_port: 0,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: String::new(),
            to_email: String::new(),
        }
    }
}

impl NotifierConfig {
    /// Whether the Telegram subset is complete.
    pub fn is_valid_telegram(&self) -> bool {
        !self.tg_api_key.is_empty() && !self.tg_channel_id.is_empty()
    }

    /// Whether the email subset is complete.
    pub fn is_valid_email(&self) -> bool {
        !self.smtp_host.is_empty()
            && self.smtp_port > 0
            && !self.smtp_username.is_empty()
            && !self.smtp_password.is_empty()
            && !self.from_email.is_empty()
            && !self.to_email.is_empty()
    }

    pub fn is_valid_for(&self, kind: ChannelKind) -> bool {
        match kind {
            ChannelKind::Telegram => self.is_valid_telegram(),
            ChannelKind::Email => self.is_valid_email(),
        }
    }

    /// Kinds whose config subset is complete, in default order.
    pub fn configured_kinds(&self) -> Vec<ChannelKind> {
        ChannelKind::ALL
            .into_iter()
            .filter(|k| self.is_valid_for(*k))
            .collect()
    }

    /// API base with any trailing slash removed; empty falls back to the default.
    pub fn telegram_api_base(&self) -> &str {
        let base = self.tg_api_base.trim_end_matches('/');
        if base.is_empty() {
            DEFAULT_TELEGRAM_API_BASE
        } else {
            base
        }
    }
}

// ─────────────────────────────────────────────
// Rate limits
// ─────────────────────────────────────────────

/// Token-bucket parameters for the chat-bot channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitConfig {
    /// Burst size of the bucket shared by all destinations.
    pub global_capacity: u32,
    /// Refill rate of the shared bucket, tokens per second.
    pub global_per_second: f64,
    /// Burst size of each destination's bucket.
    pub destination_capacity: u32,
    /// Refill rate of each destination's bucket, tokens per second.
    pub destination_per_second: f64,
    /// Registry size at which idle destination buckets are pruned.
    pub destination_prune_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_capacity: 25,
            global_per_second: 25.0,
            destination_capacity: 1,
            destination_per_second: 1.0,
            destination_prune_threshold: 1024,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Telegram channel — Bot API `sendMessage` over plain HTTPS.
//!
//! Every send clears two token buckets before any I/O happens:
//! 1. the global bucket shared by all destinations (25 msg/s)
//! 2. this destination's bucket (1 msg/s)
//!
//! The request is a form-encoded POST to `<api_base>/bot<token>/sendMessage`
//! with `chat_id` and `text`. Exactly one request per call, never retried.
//!
//! By default any completed HTTP exchange counts as delivered; API-level
//! rejections (bad token, unknown chat) are only logged. Set
//! `tg_strict_responses` to turn them into `DeliveryFailed`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use webnotify_core::config::NotifierConfig;
use webnotify_core::utils::{mask_secret, truncate_string};
use webnotify_core::{ChannelKind, ChannelRateLimiter, Context, LimitScope, NotifyError};

use crate::base::Sender;

/// Characters of the message body included in debug logs.
const LOG_PREVIEW_CHARS: usize = 60;

// ─────────────────────────────────────────────
// API response
// ─────────────────────────────────────────────

/// The parts of a Bot API reply we look at.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// The Bot API answered but did not accept the message.
#[derive(Debug, thiserror::Error)]
#[error("bot API rejected message (HTTP {status}): {description}")]
pub struct ApiRejected {
    pub status: u16,
    pub description: String,
}

/// Decide whether a completed exchange was accepted.
///
/// A 2xx reply that is not JSON is accepted; a JSON reply with `"ok": false`
/// or any non-2xx status is not.
fn check_api_response(status: reqwest::StatusCode, body: &str) -> Result<(), ApiRejected> {
    let parsed = serde_json::from_str::<ApiResponse>(body).ok();
    let accepted = match &parsed {
        Some(resp) => resp.ok && status.is_success(),
        None => status.is_success(),
    };
    if accepted {
        return Ok(());
    }

    let description = parsed
        .and_then(|r| r.description)
        .or_else(|| status.canonical_reason().map(String::from))
        .unwrap_or_else(|| "unknown error".to_string());

    Err(ApiRejected {
        status: status.as_u16(),
        description,
    })
}

// ─────────────────────────────────────────────
// TelegramSender
// ─────────────────────────────────────────────

/// Sends to one Telegram chat through the Bot API.
pub struct TelegramSender {
    /// Bot token from @BotFather.
    token: String,
    /// Chat id or `@channelname`.
    destination: String,
    /// API base URL without trailing slash.
    api_base: String,
    /// Fail on API-level rejections instead of only logging them.
    strict_responses: bool,
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// Global + per-destination buckets.
    limiter: Arc<ChannelRateLimiter>,
}

impl std::fmt::Debug for TelegramSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSender")
            .field("token", &mask_secret(&self.token))
            .field("destination", &self.destination)
            .field("api_base", &self.api_base)
            .field("strict_responses", &self.strict_responses)
            .finish()
    }
}

impl TelegramSender {
    /// Create a sender from the Telegram subset of `config`.
    ///
    /// The caller is expected to have checked `config.is_valid_telegram()`.
    pub fn new(config: &NotifierConfig, limiter: Arc<ChannelRateLimiter>) -> Self {
        let mut builder = reqwest::Client::builder();
        if config.http_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.http_timeout_secs));
        }
        let client = match builder.build() {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "failed to build configured HTTP client, using defaults");
                reqwest::Client::new()
            }
        };

        Self {
            token: config.tg_api_key.clone(),
            destination: config.tg_channel_id.clone(),
            api_base: config.telegram_api_base().to_string(),
            strict_responses: config.tg_strict_responses,
            client,
            limiter,
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Full `sendMessage` URL. Contains the token; never log it.
    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    /// Clear the global bucket, then this destination's bucket.
    async fn wait_for_tokens(&self, ctx: &Context) -> Result<(), NotifyError> {
        self.limiter
            .acquire_global(ctx)
            .await
            .map_err(|source| NotifyError::RateLimitCancelled {
                channel: ChannelKind::Telegram,
                scope: LimitScope::Global,
                source,
            })?;

        self.limiter
            .acquire_destination(&self.destination, ctx)
            .await
            .map_err(|source| NotifyError::RateLimitCancelled {
                channel: ChannelKind::Telegram,
                scope: LimitScope::Destination,
                source,
            })
    }

    /// Issue the single `sendMessage` request.
    async fn post_message(&self, text: &str) -> Result<(), NotifyError> {
        let params = [("chat_id", self.destination.as_str()), ("text", text)];

        let response = self
            .client
            .post(self.send_message_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the bot token.
                let e = e.without_url();
                error!(chat_id = %self.destination, error = %e, "telegram request failed");
                NotifyError::delivery(ChannelKind::Telegram, e)
            })?;

        let status = response.status();
        if status.is_success() && !self.strict_responses {
            info!(chat_id = %self.destination, status = %status, "telegram message sent");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match check_api_response(status, &body) {
            Ok(()) => {
                info!(chat_id = %self.destination, status = %status, "telegram message sent");
                Ok(())
            }
            Err(rejected) if self.strict_responses => {
                error!(
                    chat_id = %self.destination,
                    status = rejected.status,
                    description = %rejected.description,
                    "telegram API rejected message"
                );
                Err(NotifyError::delivery(ChannelKind::Telegram, rejected))
            }
            Err(rejected) => {
                warn!(
                    chat_id = %self.destination,
                    status = rejected.status,
                    description = %rejected.description,
                    "telegram API rejected message (not treated as failure)"
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Sender for TelegramSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    async fn notify(&self, ctx: &Context, message: &str) -> Result<(), NotifyError> {
        debug!(
            chat_id = %self.destination,
            preview = %truncate_string(message, LOG_PREVIEW_CHARS),
            "telegram send requested"
        );

        self.wait_for_tokens(ctx).await?;
        self.post_message(message).await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

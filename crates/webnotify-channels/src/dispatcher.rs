//! Dispatcher — builds the configured senders and fans a message out to them.
//!
//! Responsibilities:
//! - Build one sender per requested channel whose config subset is complete
//! - Own the chat-bot rate limiter shared by those senders
//! - Call every sender in order and aggregate the failures

use std::sync::Arc;

use tracing::{debug, info, warn};

use webnotify_core::config::{NotifierConfig, RateLimitConfig};
use webnotify_core::{AggregateError, ChannelKind, ChannelRateLimiter, Context};

use crate::base::Sender;

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Fan-out over an ordered list of senders.
///
/// Senders run one after another in construction order. A failing channel
/// never stops the remaining ones; every failure ends up in the returned
/// `AggregateError`, in the same order.
pub struct Dispatcher {
    /// The config the senders were built from.
    config: NotifierConfig,
    /// Senders in insertion order.
    senders: Vec<Arc<dyn Sender>>,
    /// Buckets shared by every chat-bot sender of this dispatcher.
    limiter: Arc<ChannelRateLimiter>,
}

impl Dispatcher {
    /// Build a dispatcher for `kinds` with the default rate limits.
    ///
    /// A kind whose config subset is incomplete is skipped without error.
    pub fn build(config: NotifierConfig, kinds: &[ChannelKind]) -> Self {
        Self::build_with_limits(config, kinds, &RateLimitConfig::default())
    }

    /// Build a dispatcher for `kinds` with explicit rate limits.
    pub fn build_with_limits(
        config: NotifierConfig,
        kinds: &[ChannelKind],
        limits: &RateLimitConfig,
    ) -> Self {
        let limiter = ChannelRateLimiter::shared(limits);
        let mut senders: Vec<Arc<dyn Sender>> = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            if !config.is_valid_for(kind) {
                debug!(channel = %kind, "channel not configured, skipping");
                continue;
            }
            match create_sender(kind, &config, &limiter) {
                Some(sender) => {
                    info!(channel = %kind, "registered channel");
                    senders.push(sender);
                }
                None => warn!(
                    channel = %kind,
                    "channel support not compiled in (enable the '{}' feature)",
                    kind
                ),
            }
        }

        Self {
            config,
            senders,
            limiter,
        }
    }

    /// Wrap senders built elsewhere, keeping their order. `limiter` is the
    /// one those senders were constructed with.
    pub fn from_senders(
        config: NotifierConfig,
        senders: Vec<Arc<dyn Sender>>,
        limiter: Arc<ChannelRateLimiter>,
    ) -> Self {
        Self {
            config,
            senders,
            limiter,
        }
    }

    /// Send `message` through every channel, with no deadline.
    pub async fn notify(&self, message: &str) -> Result<(), AggregateError> {
        self.notify_with_context(&Context::background(), message)
            .await
    }

    /// Send `message` through every channel, honouring `ctx`.
    pub async fn notify_with_context(
        &self,
        ctx: &Context,
        message: &str,
    ) -> Result<(), AggregateError> {
        let mut errors = Vec::new();

        for sender in &self.senders {
            if let Err(e) = sender.notify(ctx, message).await {
                warn!(channel = %sender.name(), error = %e, "channel delivery failed");
                errors.push(e);
            }
        }

        if errors.is_empty() {
            debug!(channels = self.senders.len(), "notification delivered");
            Ok(())
        } else {
            Err(AggregateError::new(errors))
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// The limiter handed to this dispatcher's chat-bot senders.
    pub fn rate_limiter(&self) -> &Arc<ChannelRateLimiter> {
        &self.limiter
    }

    /// Sender kinds in dispatch order.
    pub fn kinds(&self) -> Vec<ChannelKind> {
        self.senders.iter().map(|s| s.kind()).collect()
    }

    /// Sender names in dispatch order.
    pub fn channel_names(&self) -> Vec<String> {
        self.senders.iter().map(|s| s.name().to_string()).collect()
    }

    /// Number of configured senders.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Whether no channel is configured.
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

// ─────────────────────────────────────────────
// Sender construction
// ─────────────────────────────────────────────

fn create_sender(
    kind: ChannelKind,
    config: &NotifierConfig,
    limiter: &Arc<ChannelRateLimiter>,
) -> Option<Arc<dyn Sender>> {
    match kind {
        ChannelKind::Telegram => telegram_sender(config, limiter),
        ChannelKind::Email => email_sender(config),
    }
}

#[cfg(feature = "telegram")]
fn telegram_sender(
    config: &NotifierConfig,
    limiter: &Arc<ChannelRateLimiter>,
) -> Option<Arc<dyn Sender>> {
    Some(Arc::new(crate::telegram::TelegramSender::new(
        config,
        Arc::clone(limiter),
    )))
}

#[cfg(not(feature = "telegram"))]
fn telegram_sender(
    _config: &NotifierConfig,
    _limiter: &Arc<ChannelRateLimiter>,
) -> Option<Arc<dyn Sender>> {
    None
}

#[cfg(feature = "email")]
fn email_sender(config: &NotifierConfig) -> Option<Arc<dyn Sender>> {
    Some(Arc::new(crate::email::EmailSender::new(config)))
}

#[cfg(not(feature = "email"))]
fn email_sender(_config: &NotifierConfig) -> Option<Arc<dyn Sender>> {
    None
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Sender trait — the interface every delivery channel implements.
//!
//! Each channel (Telegram, email) implements this trait to:
//! - `kind()` — which `ChannelKind` it delivers through
//! - `name()` — channel identifier used in logs
//! - `notify()` — deliver one message, honouring the context

use async_trait::async_trait;
use webnotify_core::{ChannelKind, Context, NotifyError};

/// Every delivery channel implements this trait.
///
/// The `Dispatcher` holds `Arc<dyn Sender>` and calls `notify` on each in
/// order.
#[async_trait]
pub trait Sender: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Channel name for logs (defaults to the kind's name).
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Deliver `message`.
    ///
    /// Waits inside `notify` must stop when `ctx` is done. Network I/O that
    /// has already started is allowed to finish on its own.
    async fn notify(&self, ctx: &Context, message: &str) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// A mock sender for testing.
    struct MockSender {
        sent: Arc<tokio::sync::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Sender for MockSender {
        fn kind(&self) -> ChannelKind {
            ChannelKind::Email
        }

        async fn notify(&self, ctx: &Context, message: &str) -> Result<(), NotifyError> {
            if let Some(reason) = ctx.err() {
                return Err(NotifyError::SendCancelled {
                    channel: self.kind(),
                    source: reason,
                });
            }
            self.sent.lock().await.push(message.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_default_name_follows_kind() {
        let sender = MockSender {
            sent: Arc::new(tokio::sync::Mutex::new(Vec::new())),
        };
        assert_eq!(sender.name(), "email");
    }

    #[tokio::test]
    async fn test_mock_sender_notify() {
        let sent = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let sender = MockSender { sent: sent.clone() };

        sender.notify(&Context::background(), "Hello!").await.unwrap();

        let sent = sent.lock().await;
        assert_eq!(sent.as_slice(), ["Hello!".to_string()]);
    }

    #[tokio::test]
    async fn test_dyn_sender_respects_cancelled_context() {
        let sent = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let sender: Arc<dyn Sender> = Arc::new(MockSender { sent: sent.clone() });

        let ctx = Context::background();
        ctx.cancel();
        let err = sender.notify(&ctx, "dropped").await.unwrap_err();

        assert!(err.is_cancellation());
        assert!(sent.lock().await.is_empty());
    }
}

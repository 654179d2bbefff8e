//! Cancellation context threaded through every notification.
//!
//! A `Context` pairs a [`CancellationToken`] with an optional deadline. Every
//! suspension point (limiter waits, the email send race) selects on
//! [`Context::done`], so a single `cancel()` or an expired deadline stops all
//! pending waits. Work that already went out on the wire is not interrupted.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Why a context is done.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation signal plus optional deadline. Cheap to clone; clones share
/// the same token.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless `cancel()` is called on it.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now. A timeout too large to
    /// represent as an `Instant` means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context that is cancelled with its parent and additionally
    /// expires after `timeout` (whichever deadline is earlier wins).
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now().checked_add(timeout);
        let deadline = match (self.deadline, candidate) {
            (Some(parent), Some(child)) => Some(parent.min(child)),
            (parent, child) => parent.or(child),
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The reason this context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        if let Some(e) = self.err() {
            return e;
        }
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => ContextError::Canceled,
                    _ = sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
    }

    #[test]
    fn test_cancel_marks_done() {
        let ctx = Context::background();
        let clone = ctx.clone();
        ctx.cancel();
        assert_eq!(clone.err(), Some(ContextError::Canceled));
        assert!(clone.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let ctx = Context::with_timeout(Duration::from_millis(500));
        assert!(!ctx.is_done());

        let reason = ctx.done().await;
        assert_eq!(reason, ContextError::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_wakes_on_cancel() {
        let ctx = Context::with_timeout(Duration::from_secs(60));
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.cancel();

        assert_eq!(handle.await.unwrap(), ContextError::Canceled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_inherits_cancel_and_earlier_deadline() {
        let parent = Context::with_timeout(Duration::from_secs(1));
        let child = parent.child_with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());

        let short = parent.child_with_timeout(Duration::from_millis(100));
        assert!(short.deadline() < parent.deadline());

        parent.cancel();
        assert_eq!(child.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn test_child_cancel_does_not_touch_parent() {
        let parent = Context::background();
        let child = parent.child_with_timeout(Duration::from_secs(5));
        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[test]
    fn test_unrepresentable_timeout_means_no_deadline() {
        let ctx = Context::with_timeout(Duration::from_secs(u64::MAX));
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_done());
    }

    #[test]
    fn test_child_with_unrepresentable_timeout_keeps_parent_deadline() {
        let parent = Context::with_timeout(Duration::from_secs(30));
        let child = parent.child_with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), parent.deadline());

        let unbounded = Context::background().child_with_timeout(Duration::MAX);
        assert!(unbounded.deadline().is_none());
    }
}

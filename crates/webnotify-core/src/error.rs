//! Error taxonomy for senders and the dispatcher.
//!
//! Every variant leads with the channel name so an aggregated error still
//! says which channel failed.

use std::fmt;

use crate::context::ContextError;
use crate::types::ChannelKind;

/// Boxed underlying transport error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which token bucket a cancelled wait was queued on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitScope {
    Global,
    Destination,
}

impl fmt::Display for LimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitScope::Global => f.write_str("global"),
            LimitScope::Destination => f.write_str("destination"),
        }
    }
}

/// A single channel's failure.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The context finished while waiting for a rate-limit token.
    #[error("{channel}: {scope} rate limiter wait cancelled: {source}")]
    RateLimitCancelled {
        channel: ChannelKind,
        scope: LimitScope,
        #[source]
        source: ContextError,
    },

    /// The provider could not be reached or rejected the submission.
    #[error("{channel}: delivery failed: {source}")]
    DeliveryFailed {
        channel: ChannelKind,
        #[source]
        source: BoxError,
    },

    /// The context finished before an in-flight send reported back.
    #[error("{channel}: send cancelled: {source}")]
    SendCancelled {
        channel: ChannelKind,
        #[source]
        source: ContextError,
    },
}

impl NotifyError {
    /// Wrap any transport error as `DeliveryFailed`.
    pub fn delivery<E>(channel: ChannelKind, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        NotifyError::DeliveryFailed {
            channel,
            source: err.into(),
        }
    }

    pub fn channel(&self) -> ChannelKind {
        match self {
            NotifyError::RateLimitCancelled { channel, .. }
            | NotifyError::DeliveryFailed { channel, .. }
            | NotifyError::SendCancelled { channel, .. } => *channel,
        }
    }

    /// Whether this failure came from the context rather than the provider.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            NotifyError::RateLimitCancelled { .. } | NotifyError::SendCancelled { .. }
        )
    }
}

/// One or more channel failures, in dispatch order.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<NotifyError>,
}

impl AggregateError {
    pub fn new(errors: Vec<NotifyError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[NotifyError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<NotifyError> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notification errors: [")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

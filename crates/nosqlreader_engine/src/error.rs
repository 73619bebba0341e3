//! Error types for the reader engine.

use nosqlreader_protocol::ProtocolError;
use thiserror::Error;

/// Result type for reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Errors that can occur while reading from the server.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Network or HTTP failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed change batch or greeting body.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A session could not be acquired.
    #[error("session error: {0}")]
    Session(String),

    /// A sink rejected an event.
    #[error("sink for table {table:?} failed: {message}")]
    Sink {
        /// Table whose sink failed.
        table: String,
        /// Error message.
        message: String,
    },

    /// The table already has a subscription.
    #[error("table {0:?} is already subscribed")]
    DuplicateSubscription(String),

    /// Subscriptions cannot be added once the connection has started.
    #[error("cannot subscribe to {0:?} after the connection has started")]
    SubscribeAfterStart(String),

    /// The connection was started without any subscriptions.
    #[error("there are no subscriptions to start the reader with")]
    NoSubscriptions,

    /// The connection was started twice.
    #[error("the read loop cannot be started twice")]
    AlreadyStarted,

    /// `start()` was called outside a Tokio runtime.
    #[error("no Tokio runtime is available to run the read loop")]
    NoRuntime,

    /// The connection was shut down.
    #[error("connection shut down")]
    Cancelled,
}

impl ReaderError {
    /// Creates a sink error for a table.
    pub fn sink(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Returns true for misuse of the API, reported synchronously and never retried.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ReaderError::DuplicateSubscription(_)
                | ReaderError::SubscribeAfterStart(_)
                | ReaderError::NoSubscriptions
                | ReaderError::AlreadyStarted
                | ReaderError::NoRuntime
        )
    }

    /// Returns true if the poll loop recovers from this error by reconnecting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReaderError::Transport(_)
                | ReaderError::Protocol(_)
                | ReaderError::Session(_)
                | ReaderError::Sink { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(ReaderError::AlreadyStarted.is_usage_error());
        assert!(ReaderError::NoSubscriptions.is_usage_error());
        assert!(ReaderError::DuplicateSubscription("t".into()).is_usage_error());
        assert!(!ReaderError::AlreadyStarted.is_retryable());

        assert!(ReaderError::Transport("reset".into()).is_retryable());
        assert!(ReaderError::from(ProtocolError::InvalidUtf8).is_retryable());
        assert!(ReaderError::sink("t", "bad row").is_retryable());
        assert!(!ReaderError::Cancelled.is_retryable());
        assert!(!ReaderError::Cancelled.is_usage_error());
    }

    #[test]
    fn error_display() {
        let err = ReaderError::DuplicateSubscription("orders".into());
        assert!(err.to_string().contains("orders"));

        let err = ReaderError::sink("orders", "bad json");
        let msg = err.to_string();
        assert!(msg.contains("orders"));
        assert!(msg.contains("bad json"));
    }
}

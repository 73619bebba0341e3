//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding or encoding protocol data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer ended before a declared length was satisfied.
    #[error("unexpected end of batch reading {context}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Which field was being read.
        context: &'static str,
        /// Bytes required by the field.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// The header bytes are not valid UTF-8.
    #[error("header is not valid UTF-8")]
    InvalidUtf8,

    /// The header has no `=` separator.
    #[error("malformed header {0:?}: missing '=' separator")]
    MalformedHeader(String),

    /// The header names an event type this client does not know.
    #[error("unknown event type {0:?}")]
    UnknownEventType(String),

    /// The payload length prefix is negative.
    #[error("negative payload length {0}")]
    NegativeLength(i32),

    /// A header does not fit the one-byte length prefix.
    #[error("header is {0} bytes, maximum is 255")]
    HeaderTooLong(usize),

    /// A payload does not fit the four-byte signed length prefix.
    #[error("payload is {0} bytes, maximum is {max}", max = i32::MAX)]
    PayloadTooLarge(usize),

    /// The greeting response could not be used to open a session.
    #[error("invalid greeting response: {0}")]
    InvalidGreeting(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::UnexpectedEof {
            context: "payload",
            needed: 10,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("payload"));
        assert!(msg.contains("10"));
        assert!(msg.contains('3'));

        let err = ProtocolError::UnknownEventType("initRows".into());
        assert!(err.to_string().contains("initRows"));
    }
}

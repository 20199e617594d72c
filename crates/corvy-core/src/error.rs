//! Unified error types for the transport boundary.
//!
//! Every fallible [`Transport`](crate::Transport) operation returns a
//! [`TransportError`]. Whether an error is fatal depends on *when* it happens,
//! not on its variant: the runtime treats failures during startup as fatal and
//! failures while polling as transient.

use thiserror::Error;

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The platform rejected the bot's credentials.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Reason for failure.
        reason: String,
    },

    /// The platform answered with a non-success status.
    #[error("HTTP {status} error: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// The response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The transport session has been closed.
    #[error("transport session closed")]
    Closed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// Creates a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates an authentication error.
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

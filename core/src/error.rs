//! Error types for the medication-tracking API client.
//!
//! # Design
//! Every failure carries an [`ErrorKind`] so callers branch on the kind
//! rather than on message text. Connectivity and timeout failures have fixed,
//! user-facing messages. Non-2xx responses keep the raw status code and body.

use thiserror::Error;

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connectivity,
    Timeout,
    HttpStatus,
    Unknown,
}

/// Errors returned by request building, response parsing, and execution.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The host could not be reached.
    #[error("unable to connect to server, check your connection")]
    Connectivity,

    /// No response arrived within the configured window.
    #[error("request timed out, try again")]
    Timeout,

    /// The server answered with a non-2xx status. `body` is the response
    /// text, or the status line when the response had no text.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Connectivity => ErrorKind::Connectivity,
            ApiError::Timeout => ErrorKind::Timeout,
            ApiError::HttpStatus { .. } => ErrorKind::HttpStatus,
            ApiError::Serialization(_) | ApiError::Deserialization(_) | ApiError::Transport(_) => {
                ErrorKind::Unknown
            }
        }
    }

    /// Status code of an `HttpStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for failures that happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Connectivity | ApiError::Timeout | ApiError::Transport(_)
        )
    }
}

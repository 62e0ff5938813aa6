//! Errors of the HTTP test client.

use std::time::Duration;

/// A request that never produced a response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection, timeout or body read failure; worth another try.
    #[error("I/O failure on {method} {uri}: {message}")]
    Io {
        method: String,
        uri: String,
        message: String,
    },

    /// The request itself can't be sent as built.
    #[error("can't send {method} {uri}: {message}")]
    Invalid {
        method: String,
        uri: String,
        message: String,
    },
}

impl TransportError {
    pub fn is_io(&self) -> bool {
        matches!(self, TransportError::Io { .. })
    }
}

/// An assertion that didn't hold for a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AssertionFailure {
    pub message: String,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error("gave up after {attempts} attempt(s) in {}ms: {last}", elapsed.as_millis())]
    Deadline {
        attempts: u32,
        elapsed: Duration,
        last: Box<HttpError>,
    },

    #[error("invalid URI '{uri}': {message}")]
    InvalidUri { uri: String, message: String },
}

//! Error types for remote log operations.

use std::time::Duration;

use botmon_types::{ErrorKind, SyncError};
use thiserror::Error;

/// Errors that can occur while talking to the log service.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection, DNS or transport level failure.
    #[error("request failed: {0}")]
    Network(String),

    /// The call did not complete within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// The service refused to clear its logs.
    #[error("clear rejected: {0}")]
    Rejected(String),

    /// The configured base URL cannot be used.
    #[error("invalid base url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl SourceError {
    /// Collapse into the three kinds presenters distinguish
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::InvalidUrl { .. } => ErrorKind::Network,
            Self::Server { .. } | Self::Rejected(_) => ErrorKind::Server,
            Self::Protocol(_) => ErrorKind::Protocol,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Protocol(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Server {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<&SourceError> for SyncError {
    fn from(err: &SourceError) -> Self {
        SyncError::new(err.kind(), err.to_string())
    }
}

impl From<SourceError> for SyncError {
    fn from(err: SourceError) -> Self {
        SyncError::from(&err)
    }
}

/// Result type alias for log source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

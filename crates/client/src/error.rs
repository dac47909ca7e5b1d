//! Client error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a file server call as seen by the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The file server has nothing at the requested location.
    #[error("file not found on the file server")]
    NotFound,

    /// The file server refused the request with a 4xx status.
    #[error("file server rejected the request with status {status}")]
    Rejected {
        /// Status returned by the file server.
        status: StatusCode,
    },

    /// The file server failed, or could not be reached in time.
    #[error("file server error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

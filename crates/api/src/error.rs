//! Error responses of the file routes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fileserver_shared::ParameterError;
use serde_json::json;
use thiserror::Error;

/// Outcome of a request that did not succeed.
///
/// Every variant maps to a 4xx status; backend trouble never surfaces as 5xx.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A path parameter failed validation.
    #[error(transparent)]
    InvalidParameters(#[from] ParameterError),

    /// Nothing can be read at the requested location.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store refused or failed the request.
    #[error("Storage rejected the request: {0}")]
    Rejected(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameters(_) | Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidParameters(e) => e.error_code(),
            Self::NotFound(_) => "NOT_FOUND",
            Self::Rejected(_) => "STORAGE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(json!({
                "error": self.error_code(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

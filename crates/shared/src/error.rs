//! Parameter validation errors.

use thiserror::Error;

/// A path parameter failed validation.
///
/// Requests carrying such parameters never reach a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// The identifier is neither a canonical nor a prefixed id.
    #[error("invalid id: '{0}'")]
    InvalidId(String),

    /// The filename is empty, too long or not a single path segment.
    #[error("invalid filename: '{0}'")]
    InvalidFilename(String),
}

impl ParameterError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "INVALID_ID",
            Self::InvalidFilename(_) => "INVALID_FILENAME",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ParameterError::InvalidId("11233".into()).to_string(),
            "invalid id: '11233'"
        );
        assert_eq!(
            ParameterError::InvalidFilename(String::new()).to_string(),
            "invalid filename: ''"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ParameterError::InvalidId(String::new()).error_code(), "INVALID_ID");
        assert_eq!(
            ParameterError::InvalidFilename(String::new()).error_code(),
            "INVALID_FILENAME"
        );
    }
}

//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File not found in storage.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// The medium failed for another reason than absence.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Whether the error reports an absent file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Folds every error, absence included, into a generic operation failure.
    #[must_use]
    pub fn into_operation(self) -> Self {
        match self {
            Self::NotFound { key } => Self::Operation(format!("file not found: {key}")),
            other => other,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_operation_folds_not_found() {
        let err = StorageError::not_found("z/123/test.gml").into_operation();
        assert!(matches!(err, StorageError::Operation(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_opendal_not_found_maps_to_not_found() {
        let err = opendal::Error::new(opendal::ErrorKind::NotFound, "missing");
        assert!(StorageError::from(err).is_not_found());
    }

    #[test]
    fn test_opendal_other_maps_to_operation() {
        let err = opendal::Error::new(opendal::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            StorageError::from(err),
            StorageError::Operation(_)
        ));
    }
}

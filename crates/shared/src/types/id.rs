//! File identifiers.
//!
//! An identifier groups the files of one job or submission. Two shapes are
//! accepted:
//! - a canonical UUID: 36 characters of hex digits and dashes
//! - a prefixed id: one arbitrary tag character followed by 32 characters of
//!   hex digits and dashes (a dash-less UUID)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

/// Length of a canonical UUID.
pub const CANONICAL_ID_LENGTH: usize = 36;

/// Length of a prefixed id: tag character plus a dash-less UUID.
pub const PREFIXED_ID_LENGTH: usize = 32 + 1;

/// A validated file identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Validates and wraps an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::InvalidId`] if `value` has neither accepted shape.
    pub fn parse(value: impl Into<String>) -> Result<Self, ParameterError> {
        let value = value.into();
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(ParameterError::InvalidId(value))
        }
    }

    /// Checks whether `value` is a canonical or a prefixed id.
    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        let mut chars = value.chars();
        match value.chars().count() {
            CANONICAL_ID_LENGTH => is_id_body(value),
            PREFIXED_ID_LENGTH => {
                // The tag character is free-form but must not split the path.
                let tag = chars.next();
                !matches!(tag, Some('/' | '\\')) && is_id_body(chars.as_str())
            }
            _ => false,
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first character, which selects the storage partition.
    #[must_use]
    pub fn leading_char(&self) -> char {
        // Validated ids are never empty.
        self.0.chars().next().unwrap_or_default()
    }
}

fn is_id_body(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FileId {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FileId {
    type Error = ParameterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

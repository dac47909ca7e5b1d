//! Filenames as used in the last path segment of a stored file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

/// Filenames must be strictly shorter than this, to avoid abuse.
pub const MAX_FILENAME_LENGTH: usize = 256;

/// A validated filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Filename(String);

impl Filename {
    /// Validates and wraps a filename.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::InvalidFilename`] if the name is empty, has
    /// 256 or more characters, or is not a single path segment.
    pub fn parse(value: impl Into<String>) -> Result<Self, ParameterError> {
        let value = value.into();
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(ParameterError::InvalidFilename(value))
        }
    }

    /// Checks whether `value` is an acceptable filename.
    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        !value.is_empty()
            && value.chars().count() < MAX_FILENAME_LENGTH
            && !value.contains(['/', '\\'])
            && value != "."
            && value != ".."
    }

    /// Returns the filename as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Filename {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Filename {
    type Error = ParameterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Filename> for String {
    fn from(name: Filename) -> Self {
        name.0
    }
}

impl AsRef<str> for Filename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("test.gml")]
    #[case("validation.json")]
    #[case("my file (1).pdf")]
    #[case("..hidden")]
    fn test_valid_filenames(#[case] name: &str) {
        assert!(Filename::is_valid(name));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("a/b.txt")]
    #[case("a\\b.txt")]
    fn test_invalid_filenames(#[case] name: &str) {
        assert_eq!(
            Filename::parse(name).unwrap_err(),
            ParameterError::InvalidFilename(name.to_string())
        );
    }

    #[test]
    fn test_length_boundary() {
        assert!(Filename::is_valid(&"x".repeat(MAX_FILENAME_LENGTH - 1)));
        assert!(!Filename::is_valid(&"x".repeat(MAX_FILENAME_LENGTH)));
        assert!(!Filename::is_valid(&"x".repeat(300)));
    }

    #[test]
    fn test_length_counts_characters() {
        // 255 two-byte characters are still within bounds.
        assert!(Filename::is_valid(&"é".repeat(MAX_FILENAME_LENGTH - 1)));
    }
}

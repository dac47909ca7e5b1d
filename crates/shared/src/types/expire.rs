//! Retention classes attached to stored files.
//!
//! The tag is informational for the storage backends: it is stored as
//! backend metadata where the medium supports it, and acted upon by an
//! external lifecycle process, never by the file server itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Indicates how long a file should be kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpireTag {
    /// Keep the file for a short period.
    Short,
    /// Keep the file for the legal data retention period.
    Legal,
    /// Never delete the file.
    #[default]
    Never,
}

impl ExpireTag {
    /// Name of the query parameter and of the object tag carrying the value.
    pub const KEY: &'static str = "expires";

    /// Returns the lower-case wire name of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Legal => "legal",
            Self::Never => "never",
        }
    }

    /// Resolves an optional query value, falling back to [`ExpireTag::Never`]
    /// when it is absent or not a known tag.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Formats the tag as an S3 tagging query string (`expires=<tag>`).
    #[must_use]
    pub fn tagging(self) -> String {
        format!("{}={}", Self::KEY, self.as_str())
    }
}

impl fmt::Display for ExpireTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown expire tag name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown expire tag: '{0}'")]
pub struct UnknownExpireTag(pub String);

impl FromStr for ExpireTag {
    type Err = UnknownExpireTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "legal" => Ok(Self::Legal),
            "never" => Ok(Self::Never),
            _ => Err(UnknownExpireTag(s.to_string())),
        }
    }
}

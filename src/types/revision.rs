// ABOUTME: Source revision validation (git SHA, tag, or branch name).
// ABOUTME: The revision names what gets built; it also seeds the artifact tag.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceRevisionError {
    #[error("source revision cannot be empty")]
    Empty,

    #[error("source revision exceeds maximum length of 128 characters")]
    TooLong,

    #[error("invalid character in source revision: '{0}'")]
    InvalidChar(char),
}

/// The source revision a release is built from.
///
/// Accepts anything git accepts as a rev name: hex SHAs, tags, branch names
/// with slashes. Whitespace and control characters are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRevision(String);

impl SourceRevision {
    pub fn new(value: &str) -> Result<Self, SourceRevisionError> {
        if value.is_empty() {
            return Err(SourceRevisionError::Empty);
        }

        if value.len() > 128 {
            return Err(SourceRevisionError::TooLong);
        }

        for c in value.chars() {
            if c.is_whitespace() || c.is_control() {
                return Err(SourceRevisionError::InvalidChar(c));
            }
            if !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-' | '/') {
                return Err(SourceRevisionError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A form of the revision usable as an image tag.
    ///
    /// Tags forbid `/`, so branch separators become hyphens.
    pub fn as_artifact_tag(&self) -> String {
        self.0.replace('/', "-")
    }
}

impl fmt::Display for SourceRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SourceRevision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SourceRevision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        SourceRevision::new(&value).map_err(serde::de::Error::custom)
    }
}

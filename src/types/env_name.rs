// ABOUTME: DNS-compatible environment name validation.
// ABOUTME: Ensures environment names follow RFC 1123 label requirements.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvNameError {
    #[error("environment name cannot be empty")]
    Empty,

    #[error("environment name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("environment name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("environment name cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("environment name must be lowercase")]
    NotLowercase,

    #[error("invalid character in environment name: '{0}'")]
    InvalidChar(char),
}

/// A named deployment target (e.g. `production`, `staging`).
///
/// Names double as state file names and lock keys, hence the strict
/// RFC 1123 label character set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvName(String);

impl EnvName {
    pub fn new(value: &str) -> Result<Self, EnvNameError> {
        if value.is_empty() {
            return Err(EnvNameError::Empty);
        }

        if value.len() > 63 {
            return Err(EnvNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(EnvNameError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(EnvNameError::EndsWithHyphen);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(EnvNameError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(EnvNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for EnvName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EnvName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        EnvName::new(&value).map_err(serde::de::Error::custom)
    }
}

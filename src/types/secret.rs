// ABOUTME: Opaque secret handles and redacting secret values.
// ABOUTME: Only handles enter the data model; values exist transiently at deploy time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretHandleError {
    #[error("secret handle cannot be empty")]
    Empty,

    #[error("secret handle must start with a letter or underscore")]
    InvalidStart,

    #[error("invalid character in secret handle: '{0}'")]
    InvalidChar(char),
}

/// Name of a secret in the secret store (environment-variable shaped).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretHandle(String);

impl SecretHandle {
    pub fn new(value: &str) -> Result<Self, SecretHandleError> {
        if value.is_empty() {
            return Err(SecretHandleError::Empty);
        }

        let first = value.chars().next().expect("checked non-empty");
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(SecretHandleError::InvalidStart);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '_' {
                return Err(SecretHandleError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SecretHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        SecretHandle::new(&value).map_err(serde::de::Error::custom)
    }
}

/// A resolved secret value.
///
/// Never serialized and never printed: Debug and Display both redact.
/// The raw value is only reachable through `expose`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Access the raw value. Callers pass it straight into a process
    /// environment; it must not be stored or logged.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

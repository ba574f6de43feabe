// ABOUTME: Stable migration identifier derived from migration file names.
// ABOUTME: Identifiers key the applied-migrations ledger, so the charset is strict.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationIdError {
    #[error("migration identifier cannot be empty")]
    Empty,

    #[error("migration identifier exceeds maximum length of 128 characters")]
    TooLong,

    #[error("migration identifier must start with an alphanumeric character")]
    InvalidStart,

    #[error("invalid character in migration identifier: '{0}'")]
    InvalidChar(char),
}

/// Identifier of one migration within an environment's ledger.
///
/// Derived from the migration file stem; applied at most once per
/// environment, so renaming a file that has already run changes its
/// identity and re-runs it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationId(String);

impl MigrationId {
    pub fn new(value: &str) -> Result<Self, MigrationIdError> {
        if value.is_empty() {
            return Err(MigrationIdError::Empty);
        }

        if value.len() > 128 {
            return Err(MigrationIdError::TooLong);
        }

        let first = value.chars().next().expect("checked non-empty");
        if !first.is_ascii_alphanumeric() {
            return Err(MigrationIdError::InvalidStart);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-') {
                return Err(MigrationIdError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for MigrationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MigrationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        MigrationId::new(&value).map_err(serde::de::Error::custom)
    }
}

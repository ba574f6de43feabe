// ABOUTME: Monotonically increasing release identifier.
// ABOUTME: Assigned from the release log; ordering follows deployment order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one release attempt.
///
/// Ids are assigned by the state store as `max(log) + 1`, so ordering by id
/// is ordering by deployment request order within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseId(u64);

impl ReleaseId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// First id in an empty log.
    pub fn first() -> Self {
        Self(1)
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

// ABOUTME: Release status vocabulary and the legal transition table.
// ABOUTME: Any non-terminal status may fail; only failed may become rolled-back.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where a release is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStatus {
    Pending,
    Building,
    Transporting,
    Migrating,
    HealthChecking,
    Live,
    RolledBack,
    Failed,
}

#[derive(Debug, Error)]
#[error("illegal release status transition: {from} -> {to}")]
pub struct StatusError {
    pub from: ReleaseStatus,
    pub to: ReleaseStatus,
}

impl ReleaseStatus {
    /// Statuses from which no further transition is possible.
    ///
    /// `Failed` is not listed: a failed release with a rollback target still
    /// transitions to `RolledBack`.
    pub fn is_terminal(self) -> bool {
        matches!(self, ReleaseStatus::Live | ReleaseStatus::RolledBack)
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(self, next: ReleaseStatus) -> bool {
        use ReleaseStatus::*;

        match (self, next) {
            // The forward pipeline
            (Pending, Building)
            | (Building, Transporting)
            | (Transporting, Migrating)
            | (Migrating, HealthChecking)
            | (HealthChecking, Live) => true,

            // Any non-terminal state may fail
            (from, Failed) => !from.is_terminal() && from != Failed,

            // Rollback only applies to an already failed release
            (Failed, RolledBack) => true,

            _ => false,
        }
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReleaseStatus::Pending => "pending",
            ReleaseStatus::Building => "building",
            ReleaseStatus::Transporting => "transporting",
            ReleaseStatus::Migrating => "migrating",
            ReleaseStatus::HealthChecking => "health-checking",
            ReleaseStatus::Live => "live",
            ReleaseStatus::RolledBack => "rolled-back",
            ReleaseStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_pipeline_is_legal() {
        use ReleaseStatus::*;
        let pipeline = [Pending, Building, Transporting, Migrating, HealthChecking, Live];
        for pair in pipeline.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn any_non_terminal_state_may_fail() {
        use ReleaseStatus::*;
        for from in [Pending, Building, Transporting, Migrating, HealthChecking] {
            assert!(from.can_transition_to(Failed), "{} -> failed", from);
        }
        assert!(!Live.can_transition_to(Failed));
        assert!(!RolledBack.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Failed));
    }

    #[test]
    fn only_failed_rolls_back() {
        use ReleaseStatus::*;
        assert!(Failed.can_transition_to(RolledBack));
        for from in [Pending, Building, Transporting, Migrating, HealthChecking, Live] {
            assert!(!from.can_transition_to(RolledBack), "{} -> rolled-back", from);
        }
    }

    #[test]
    fn no_transition_out_of_terminal_states() {
        use ReleaseStatus::*;
        let all = [
            Pending,
            Building,
            Transporting,
            Migrating,
            HealthChecking,
            Live,
            RolledBack,
            Failed,
        ];
        for to in all {
            assert!(!Live.can_transition_to(to), "live -> {}", to);
            assert!(!RolledBack.can_transition_to(to), "rolled-back -> {}", to);
        }
    }

    #[test]
    fn status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ReleaseStatus::HealthChecking).unwrap(),
            "\"health-checking\""
        );
        assert_eq!(
            serde_json::to_string(&ReleaseStatus::RolledBack).unwrap(),
            "\"rolled-back\""
        );
    }
}

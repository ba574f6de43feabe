// ABOUTME: The audited release record: one attempt to deploy a revision to an environment.
// ABOUTME: Every status change is timestamped; snapshots land in the append-only log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ArtifactRef, EnvName, RegistryRef, ReleaseId, SourceRevision};

use super::status::{ReleaseStatus, StatusError};

/// One timestamped status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ReleaseStatus,
    pub at: DateTime<Utc>,
}

/// One attempt to deploy a specific revision to an environment.
///
/// Created when a deployment is requested, mutated only by the orchestrator,
/// and retained indefinitely for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub revision: SourceRevision,
    pub environment: EnvName,

    /// Set once the build phase produces an artifact.
    #[serde(default)]
    pub artifact: Option<ArtifactRef>,

    /// Set once the transport phase pushes the artifact; rollback pulls
    /// the previous release's registry reference back onto the host.
    #[serde(default)]
    pub registry_ref: Option<RegistryRef>,

    pub status: ReleaseStatus,

    /// Failure reason, human-readable. Empty while the release is healthy.
    #[serde(default)]
    pub reason: Option<String>,

    /// Timestamped status history, oldest first.
    pub history: Vec<StatusChange>,
}

impl Release {
    /// Record a new pending release.
    pub fn new(id: ReleaseId, revision: SourceRevision, environment: EnvName) -> Self {
        Self {
            id,
            revision,
            environment,
            artifact: None,
            registry_ref: None,
            status: ReleaseStatus::Pending,
            reason: None,
            history: vec![StatusChange {
                status: ReleaseStatus::Pending,
                at: Utc::now(),
            }],
        }
    }

    /// Advance to the next status, enforcing the legal transition table.
    pub fn advance(&mut self, next: ReleaseStatus) -> Result<(), StatusError> {
        if !self.status.can_transition_to(next) {
            return Err(StatusError {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.history.push(StatusChange {
            status: next,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Mark the release failed with a reason.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), StatusError> {
        self.advance(ReleaseStatus::Failed)?;
        self.reason = Some(reason.into());
        Ok(())
    }

    /// When the release entered its current status.
    pub fn status_since(&self) -> Option<DateTime<Utc>> {
        self.history.last().map(|c| c.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release() -> Release {
        Release::new(
            ReleaseId::first(),
            SourceRevision::new("a1b2c3d").unwrap(),
            EnvName::new("production").unwrap(),
        )
    }

    #[test]
    fn new_release_starts_pending_with_history() {
        let r = release();
        assert_eq!(r.status, ReleaseStatus::Pending);
        assert_eq!(r.history.len(), 1);
        assert_eq!(r.history[0].status, ReleaseStatus::Pending);
    }

    #[test]
    fn advance_appends_history() {
        let mut r = release();
        r.advance(ReleaseStatus::Building).unwrap();
        r.advance(ReleaseStatus::Transporting).unwrap();
        assert_eq!(r.history.len(), 3);
        assert_eq!(r.status, ReleaseStatus::Transporting);
    }

    #[test]
    fn illegal_advance_is_rejected_and_leaves_state_untouched() {
        let mut r = release();
        let err = r.advance(ReleaseStatus::Live).unwrap_err();
        assert_eq!(err.from, ReleaseStatus::Pending);
        assert_eq!(err.to, ReleaseStatus::Live);
        assert_eq!(r.status, ReleaseStatus::Pending);
        assert_eq!(r.history.len(), 1);
    }

    #[test]
    fn fail_records_reason() {
        let mut r = release();
        r.advance(ReleaseStatus::Building).unwrap();
        r.fail("build exited with status 2").unwrap();
        assert_eq!(r.status, ReleaseStatus::Failed);
        assert_eq!(r.reason.as_deref(), Some("build exited with status 2"));
    }

    #[test]
    fn release_round_trips_through_json() {
        let mut r = release();
        r.advance(ReleaseStatus::Building).unwrap();
        r.artifact = Some(ArtifactRef::parse("registry.example.com/app:a1b2c3d").unwrap());

        let json = serde_json::to_string(&r).unwrap();
        let back: Release = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, r.id);
        assert_eq!(back.status, ReleaseStatus::Building);
        assert_eq!(back.artifact, r.artifact);
    }
}

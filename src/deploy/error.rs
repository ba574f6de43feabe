// ABOUTME: Unified orchestrator error with SNAFU pattern.
// ABOUTME: Wraps phase errors and exposes kind() for programmatic handling.

use snafu::Snafu;

use crate::build::BuildError;
use crate::health::HealthGateError;
use crate::migrate::MigrationError;
use crate::release::StatusError;
use crate::store::StoreError;
use crate::transport::TransportError;

/// Unified error for a release transaction.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum OrchestrateError {
    #[snafu(display("build failed: {source}"))]
    Build { source: BuildError },

    #[snafu(display("transport failed: {source}"))]
    Transport { source: TransportError },

    #[snafu(display("migration failed: {source}"))]
    Migration { source: MigrationError },

    #[snafu(display("health gate failed: {source}"))]
    Health { source: HealthGateError },

    #[snafu(display("rollback failed: {reason}"))]
    Rollback { reason: String },

    #[snafu(display("no previous release to roll back to"))]
    NoPreviousRelease,

    #[snafu(display("deployment cancelled between phases"))]
    Cancelled,

    #[snafu(display("request targets environment {requested} but configuration is for {configured}"))]
    EnvironmentMismatch { requested: String, configured: String },

    #[snafu(display("state store error: {source}"))]
    Store { source: StoreError },

    #[snafu(display("release status error: {source}"))]
    Status { source: StatusError },
}

/// Failure kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Build,
    TransportTransient,
    TransportPermanent,
    Migration,
    /// A migration id reused for different content. Fatal.
    ChecksumConflict,
    HealthTimeout,
    /// Rollback itself failed. Fatal; requires operator intervention.
    Rollback,
    Cancelled,
    /// Store, status, or request plumbing failure.
    Internal,
}

impl OrchestrateError {
    /// Returns the failure kind for programmatic handling.
    pub fn kind(&self) -> FailureKind {
        match self {
            OrchestrateError::Build { .. } => FailureKind::Build,
            OrchestrateError::Transport { source } => {
                if source.is_transient() {
                    FailureKind::TransportTransient
                } else {
                    FailureKind::TransportPermanent
                }
            }
            OrchestrateError::Migration { source } => match source {
                MigrationError::ChecksumConflict { .. } => FailureKind::ChecksumConflict,
                _ => FailureKind::Migration,
            },
            OrchestrateError::Health { .. } => FailureKind::HealthTimeout,
            OrchestrateError::Rollback { .. } | OrchestrateError::NoPreviousRelease => {
                FailureKind::Rollback
            }
            OrchestrateError::Cancelled => FailureKind::Cancelled,
            OrchestrateError::EnvironmentMismatch { .. }
            | OrchestrateError::Store { .. }
            | OrchestrateError::Status { .. } => FailureKind::Internal,
        }
    }

    /// The operator-visible alerts: the system cannot self-heal from these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::Rollback | FailureKind::ChecksumConflict
        )
    }
}

impl From<BuildError> for OrchestrateError {
    fn from(source: BuildError) -> Self {
        OrchestrateError::Build { source }
    }
}

impl From<TransportError> for OrchestrateError {
    fn from(source: TransportError) -> Self {
        OrchestrateError::Transport { source }
    }
}

impl From<MigrationError> for OrchestrateError {
    fn from(source: MigrationError) -> Self {
        OrchestrateError::Migration { source }
    }
}

impl From<HealthGateError> for OrchestrateError {
    fn from(source: HealthGateError) -> Self {
        OrchestrateError::Health { source }
    }
}

impl From<StoreError> for OrchestrateError {
    fn from(source: StoreError) -> Self {
        OrchestrateError::Store { source }
    }
}

impl From<StatusError> for OrchestrateError {
    fn from(source: StatusError) -> Self {
        OrchestrateError::Status { source }
    }
}

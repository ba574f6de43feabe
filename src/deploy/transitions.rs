// ABOUTME: Phase transition methods for the release flow.
// ABOUTME: Each method consumes self, records the status change, and returns the next state.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;

use crate::build::{ArtifactBuilder, BuildError};
use crate::health::{HealthGate, HealthProbe, ProbeTarget};
use crate::migrate::{MigrationExecutor, MigrationRunner, MigrationSet};
use crate::release::{Release, ReleaseStatus};
use crate::store::StateStore;
use crate::transport::{ReleaseTransport, RetryPolicy, TransportError, with_retry};
use crate::types::{HostAddr, RegistryRef, SecretValue};

use super::ReleaseFlow;
use super::error::OrchestrateError;
use super::state::{Built, HealthChecked, Migrated, Pending, Transported};

/// Result type for transitions that may need rollback on failure.
///
/// On failure the flow is handed back in its prior phase together with the
/// error, so the caller can mark the release failed and decide rollback.
pub type TransitionResult<T, S> = Result<ReleaseFlow<T>, (ReleaseFlow<S>, OrchestrateError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> ReleaseFlow<S> {
    /// Internal helper to transition to a new phase marker.
    fn transition<T>(self) -> ReleaseFlow<T> {
        ReleaseFlow {
            release: self.release,
            previous: self.previous,
            _state: PhantomData,
        }
    }

    /// Advance the release status and persist the snapshot.
    fn enter(&mut self, status: ReleaseStatus, store: &StateStore) -> Result<(), OrchestrateError> {
        self.release.advance(status)?;
        store.record_release(&self.release)?;
        Ok(())
    }
}

// =============================================================================
// Pending -> Built
// =============================================================================

impl ReleaseFlow<Pending> {
    /// Build the artifact for this release's revision.
    ///
    /// Build failures are deterministic and never retried. The phase is
    /// bounded by `timeout`; exceeding it is a build failure.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` so the caller can mark the release failed.
    #[must_use = "release flow must be used"]
    pub async fn build<B: ArtifactBuilder>(
        mut self,
        builder: &B,
        secrets: &HashMap<String, SecretValue>,
        timeout: Duration,
        store: &StateStore,
    ) -> TransitionResult<Built, Pending> {
        if let Err(e) = self.enter(ReleaseStatus::Building, store) {
            return Err((self, e));
        }

        match tokio::time::timeout(timeout, builder.build(&self.release.revision, secrets)).await {
            Ok(Ok(artifact)) => {
                self.release.artifact = Some(artifact);
                Ok(self.transition())
            }
            Ok(Err(e)) => Err((self, e.into())),
            Err(_elapsed) => {
                let e = BuildError::Failed(format!("build timed out after {:?}", timeout));
                Err((self, e.into()))
            }
        }
    }
}

// =============================================================================
// Built -> Transported
// =============================================================================

impl ReleaseFlow<Built> {
    /// Push the artifact to the registry and pull it onto the target host.
    ///
    /// Transient failures retry with bounded backoff inside each leg;
    /// the whole phase is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` so the caller can mark the release failed.
    #[must_use = "release flow must be used"]
    pub async fn transport<T: ReleaseTransport>(
        mut self,
        transport: &T,
        retry: &RetryPolicy,
        timeout: Duration,
        host: &HostAddr,
        store: &StateStore,
    ) -> TransitionResult<Transported, Built> {
        if let Err(e) = self.enter(ReleaseStatus::Transporting, store) {
            return Err((self, e));
        }

        let artifact = self
            .release
            .artifact
            .clone()
            .expect("built release must have an artifact");

        let phase = async {
            let registry_ref = with_retry(retry, "push", || transport.push(&artifact)).await?;
            with_retry(retry, "pull", || transport.pull(&registry_ref, host)).await?;
            Ok::<RegistryRef, TransportError>(registry_ref)
        };

        match tokio::time::timeout(timeout, phase).await {
            Ok(Ok(registry_ref)) => {
                self.release.registry_ref = Some(registry_ref);
                Ok(self.transition())
            }
            Ok(Err(e)) => Err((self, e.into())),
            Err(_elapsed) => Err((self, TransportError::Timeout(timeout).into())),
        }
    }
}

// =============================================================================
// Transported -> Migrated
// =============================================================================

impl ReleaseFlow<Transported> {
    /// Apply pending schema migrations, in declared order, exactly once.
    ///
    /// A release with no migration set configured passes straight through.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)`; the caller decides rollback eligibility.
    #[must_use = "release flow must be used"]
    pub async fn migrate<E: MigrationExecutor>(
        mut self,
        runner: &MigrationRunner<'_>,
        set: Option<&MigrationSet>,
        executor: &E,
        store: &StateStore,
    ) -> TransitionResult<Migrated, Transported> {
        if let Err(e) = self.enter(ReleaseStatus::Migrating, store) {
            return Err((self, e));
        }

        if let Some(set) = set {
            match runner.apply(&self.release.environment, set, executor).await {
                Ok(applied) => {
                    tracing::info!(
                        environment = %self.release.environment,
                        applied,
                        "migrations applied"
                    );
                }
                Err(e) => return Err((self, e.into())),
            }
        }

        Ok(self.transition())
    }
}

// =============================================================================
// Migrated -> HealthChecked
// =============================================================================

impl ReleaseFlow<Migrated> {
    /// Gate traffic on the newly deployed artifact reporting healthy.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` on `HealthTimeout`; the caller decides
    /// rollback eligibility.
    #[must_use = "release flow must be used"]
    pub async fn await_gate<P: HealthProbe>(
        mut self,
        gate: &HealthGate,
        probe: &P,
        target: &ProbeTarget,
        store: &StateStore,
    ) -> TransitionResult<HealthChecked, Migrated> {
        if let Err(e) = self.enter(ReleaseStatus::HealthChecking, store) {
            return Err((self, e));
        }

        match gate.wait_healthy(probe, target).await {
            Ok(_result) => Ok(self.transition()),
            Err(e) => Err((self, e.into())),
        }
    }
}

// =============================================================================
// HealthChecked - Terminal Transition
// =============================================================================

impl ReleaseFlow<HealthChecked> {
    /// Promote the release: shift the environment pointers and mark it live.
    ///
    /// The live pointer becomes previous; this release becomes live. This is
    /// the only place environment pointers change during a deployment.
    pub fn promote(mut self, store: &StateStore) -> Result<Release, OrchestrateError> {
        let mut env = store.environment(&self.release.environment)?;

        self.release.advance(ReleaseStatus::Live)?;
        env.promote(self.release.id);

        store.save_environment(&env)?;
        store.record_release(&self.release)?;

        Ok(self.release)
    }
}

// ABOUTME: The deployment orchestrator: sequences build, transport, migrate, gate, promote.
// ABOUTME: One transaction at a time per environment, with rollback on post-transport failure.

use std::collections::HashMap;
use std::time::Duration;

use crate::build::ArtifactBuilder;
use crate::config::EnvironmentConfig;
use crate::health::HealthProbe;
use crate::migrate::{MigrationExecutor, MigrationRunner, MigrationSet};
use crate::release::Release;
use crate::store::StateStore;
use crate::transport::{ReleaseTransport, RetryPolicy};
use crate::types::{EnvName, SecretValue, SourceRevision};

use super::cancel::CancelToken;
use super::error::OrchestrateError;
use super::flow::ReleaseFlow;
use super::lock::EnvLocks;
use super::rollback::auto_rollback;

/// A deployment request from the CI event source: the sole entry point.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub revision: SourceRevision,
    pub environment: EnvName,
}

/// Sequences one release transaction per environment at a time.
///
/// The orchestrator exclusively owns release status transitions and the
/// environment's live/previous pointers. Collaborators are injected: the
/// builder, the transport, the migration executor, and the health probe.
pub struct Orchestrator<B, T, M, P> {
    builder: B,
    transport: T,
    migrator: M,
    probe: P,
    store: StateStore,
    locks: EnvLocks,
    retry: RetryPolicy,
    build_timeout: Duration,
    transport_timeout: Duration,
}

impl<B, T, M, P> Orchestrator<B, T, M, P>
where
    B: ArtifactBuilder,
    T: ReleaseTransport,
    M: MigrationExecutor,
    P: HealthProbe,
{
    pub fn new(builder: B, transport: T, migrator: M, probe: P, store: StateStore) -> Self {
        Self {
            builder,
            transport,
            migrator,
            probe,
            store,
            locks: EnvLocks::new(),
            retry: RetryPolicy::default(),
            build_timeout: Duration::from_secs(15 * 60),
            transport_timeout: Duration::from_secs(5 * 60),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    pub fn with_transport_timeout(mut self, timeout: Duration) -> Self {
        self.transport_timeout = timeout;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run one release transaction.
    ///
    /// Secrets arrive already resolved; the orchestrator never touches the
    /// secret store. Returns the release in its terminal successful state,
    /// or the error that stopped it (the release's recorded status and
    /// reason tell the rest of the story).
    pub async fn deploy(
        &self,
        env: &EnvironmentConfig,
        request: DeployRequest,
        migrations: Option<&MigrationSet>,
        secrets: &HashMap<String, SecretValue>,
        cancel: &CancelToken,
    ) -> Result<Release, OrchestrateError> {
        if request.environment != env.name {
            return Err(OrchestrateError::EnvironmentMismatch {
                requested: request.environment.to_string(),
                configured: env.name.to_string(),
            });
        }

        // Serialize transactions per environment. The guard is held for the
        // whole transaction, so a second request observes this one's final
        // environment state before its own transport step.
        let guard = self.locks.acquire(&env.name).await;
        tracing::debug!(
            environment = %env.name,
            holder = %guard.info().holder,
            "starting release transaction"
        );

        // Cancellation before the pending record: full abort, no side effects.
        if cancel.is_cancelled() {
            return Err(OrchestrateError::Cancelled);
        }

        let release = Release::new(
            self.store.next_release_id()?,
            request.revision,
            env.name.clone(),
        );
        self.store.record_release(&release)?;
        tracing::info!(release = %release.id, revision = %release.revision, "release recorded");

        // The rollback target is whatever is live right now.
        let env_state = self.store.environment(&env.name)?;
        let previous = match env_state.live {
            Some(id) => self.store.load_release(id)?,
            None => None,
        };

        let flow = ReleaseFlow::new(release, previous);

        // Build. Failure: no environment mutation, no rollback.
        let flow = match flow
            .build(&self.builder, secrets, self.build_timeout, &self.store)
            .await
        {
            Ok(flow) => flow,
            Err((flow, e)) => return self.fail(flow.into_parts().0, e),
        };

        if cancel.is_cancelled() {
            return self.cancelled(flow.into_parts().0);
        }

        // Transport. Failure: environment untouched, no rollback.
        let flow = match flow
            .transport(
                &self.transport,
                &self.retry,
                self.transport_timeout,
                &env.host,
                &self.store,
            )
            .await
        {
            Ok(flow) => flow,
            Err((flow, e)) => return self.fail(flow.into_parts().0, e),
        };

        if cancel.is_cancelled() {
            return self.cancelled(flow.into_parts().0);
        }

        // Migrate. Failure: roll back if a previous live release exists.
        let runner = MigrationRunner::new(&self.store);
        let flow = match flow
            .migrate(&runner, migrations, &self.migrator, &self.store)
            .await
        {
            Ok(flow) => flow,
            Err((flow, e)) => {
                let (release, previous) = flow.into_parts();
                return self.fail_with_rollback(release, previous, e, env).await;
            }
        };

        if cancel.is_cancelled() {
            return self.cancelled(flow.into_parts().0);
        }

        // Health gate. Timeout follows the migration failure path.
        let gate = env.health.gate();
        let target = env.health.target(&env.host);
        let flow = match flow.await_gate(&gate, &self.probe, &target, &self.store).await {
            Ok(flow) => flow,
            Err((flow, e)) => {
                let (release, previous) = flow.into_parts();
                return self.fail_with_rollback(release, previous, e, env).await;
            }
        };

        // Promote: previous = live, live = this release.
        let release = flow.promote(&self.store)?;
        tracing::info!(release = %release.id, environment = %env.name, "release is live");

        Ok(release)
    }

    /// Mark a release failed and surface the error. No rollback.
    fn fail(&self, mut release: Release, error: OrchestrateError) -> Result<Release, OrchestrateError> {
        tracing::warn!(release = %release.id, "release failed: {}", error);
        release.fail(error.to_string())?;
        self.store.record_release(&release)?;
        Err(error)
    }

    /// Mark a release failed after cancellation between phases.
    fn cancelled(&self, mut release: Release) -> Result<Release, OrchestrateError> {
        tracing::warn!(release = %release.id, "release cancelled between phases");
        release.fail("cancelled")?;
        self.store.record_release(&release)?;
        Err(OrchestrateError::Cancelled)
    }

    /// Mark a release failed, then attempt rollback if a previous live
    /// release exists. Rollback failure is fatal and overrides the
    /// original error in the return value; both are logged.
    async fn fail_with_rollback(
        &self,
        mut release: Release,
        previous: Option<Release>,
        error: OrchestrateError,
        env: &EnvironmentConfig,
    ) -> Result<Release, OrchestrateError> {
        if error.is_fatal() {
            tracing::error!(release = %release.id, "fatal: {}", error);
        } else {
            tracing::warn!(release = %release.id, "release failed: {}", error);
        }
        release.fail(error.to_string())?;
        self.store.record_release(&release)?;

        let Some(previous) = previous else {
            // First deploy to this environment: nothing to restore.
            return Err(error);
        };

        let gate = env.health.gate();
        let target = env.health.target(&env.host);
        match auto_rollback(
            &mut release,
            &previous,
            &self.transport,
            &self.retry,
            &env.host,
            &gate,
            &self.probe,
            &target,
            &self.store,
        )
        .await
        {
            Ok(()) => {
                tracing::warn!(
                    release = %release.id,
                    restored = %previous.id,
                    "rolled back to previous release"
                );
                Err(error)
            }
            Err(rollback_error) => {
                tracing::error!(
                    release = %release.id,
                    "fatal: {} (after: {})",
                    rollback_error,
                    error
                );
                Err(rollback_error)
            }
        }
    }
}

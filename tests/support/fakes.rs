// ABOUTME: In-memory fakes for the orchestrator's collaborators.
// ABOUTME: FakeHost models a target that runs whatever reference was pulled last.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use cutover::build::{ArtifactBuilder, BuildError};
use cutover::deploy::CancelToken;
use cutover::health::{HealthCheckResult, HealthOutcome, HealthProbe, ProbeTarget};
use cutover::migrate::{Migration, MigrationExecError, MigrationExecutor};
use cutover::transport::{ReleaseTransport, TransportError};
use cutover::types::{ArtifactRef, EnvName, HostAddr, RegistryRef, SecretValue, SourceRevision};

/// The target host: runs whatever reference was pulled last.
///
/// Health is a property of the reference: marking a reference healthy means
/// the service answers healthy once that reference is deployed. This models
/// the real cutover, where a pull activates the new version.
#[derive(Clone, Default)]
pub struct FakeHost {
    current: Arc<Mutex<Option<String>>>,
    healthy: Arc<Mutex<HashSet<String>>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_healthy(&self, reference: &str) {
        self.healthy.lock().insert(reference.to_string());
    }

    pub fn current(&self) -> Option<String> {
        self.current.lock().clone()
    }

    fn deploy(&self, reference: &str) {
        *self.current.lock() = Some(reference.to_string());
    }

    fn is_healthy(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|r| self.healthy.lock().contains(r))
    }
}

/// Builder that mints `repository:revision` artifacts, or fails on demand.
#[derive(Clone)]
pub struct FakeBuilder {
    repository: String,
    fail_with: Arc<Mutex<Option<String>>>,
    cancel_during_build: Arc<Mutex<Option<CancelToken>>>,
    builds: Arc<Mutex<u32>>,
}

impl FakeBuilder {
    pub fn new(repository: &str) -> Self {
        Self {
            repository: repository.to_string(),
            fail_with: Arc::new(Mutex::new(None)),
            cancel_during_build: Arc::new(Mutex::new(None)),
            builds: Arc::new(Mutex::new(0)),
        }
    }

    pub fn fail_with(&self, reason: &str) {
        *self.fail_with.lock() = Some(reason.to_string());
    }

    /// Cancel the given token while the build phase runs, so the
    /// orchestrator observes cancellation at the next phase boundary.
    pub fn cancel_during_build(&self, token: &CancelToken) {
        *self.cancel_during_build.lock() = Some(token.clone());
    }

    pub fn build_count(&self) -> u32 {
        *self.builds.lock()
    }
}

#[async_trait]
impl ArtifactBuilder for FakeBuilder {
    async fn build(
        &self,
        revision: &SourceRevision,
        _secrets: &HashMap<String, SecretValue>,
    ) -> Result<ArtifactRef, BuildError> {
        *self.builds.lock() += 1;

        if let Some(token) = self.cancel_during_build.lock().as_ref() {
            token.cancel();
        }

        if let Some(reason) = self.fail_with.lock().clone() {
            return Err(BuildError::Failed(reason));
        }

        Ok(ArtifactRef::from_repository(&self.repository, &revision.as_artifact_tag()).unwrap())
    }
}

/// Transport with scripted failures and a call journal.
#[derive(Clone)]
pub struct FakeTransport {
    host: FakeHost,
    push_script: Arc<Mutex<VecDeque<Option<TransportError>>>>,
    pull_script: Arc<Mutex<VecDeque<Option<TransportError>>>>,
    pushes: Arc<Mutex<u32>>,
    pulls: Arc<Mutex<Vec<String>>>,
}

impl FakeTransport {
    pub fn new(host: FakeHost) -> Self {
        Self {
            host,
            push_script: Arc::new(Mutex::new(VecDeque::new())),
            pull_script: Arc::new(Mutex::new(VecDeque::new())),
            pushes: Arc::new(Mutex::new(0)),
            pulls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a failure for the next push attempt. An empty queue succeeds.
    pub fn fail_next_push(&self, error: TransportError) {
        self.push_script.lock().push_back(Some(error));
    }

    /// Queue a failure for the next pull attempt. An empty queue succeeds.
    pub fn fail_next_pull(&self, error: TransportError) {
        self.pull_script.lock().push_back(Some(error));
    }

    /// Queue an explicit success, to script failures after it.
    pub fn allow_next_pull(&self) {
        self.pull_script.lock().push_back(None);
    }

    pub fn push_count(&self) -> u32 {
        *self.pushes.lock()
    }

    /// References pulled onto the host, in order.
    pub fn pulled(&self) -> Vec<String> {
        self.pulls.lock().clone()
    }
}

#[async_trait]
impl ReleaseTransport for FakeTransport {
    async fn push(&self, artifact: &ArtifactRef) -> Result<RegistryRef, TransportError> {
        *self.pushes.lock() += 1;
        if let Some(Some(error)) = self.push_script.lock().pop_front() {
            return Err(error);
        }
        Ok(RegistryRef::new(artifact.to_string()))
    }

    async fn pull(
        &self,
        registry_ref: &RegistryRef,
        _host: &HostAddr,
    ) -> Result<(), TransportError> {
        if let Some(Some(error)) = self.pull_script.lock().pop_front() {
            return Err(error);
        }
        self.pulls.lock().push(registry_ref.as_str().to_string());
        self.host.deploy(registry_ref.as_str());
        Ok(())
    }
}

/// Migrator that journals applications and can fail on a given id.
#[derive(Clone, Default)]
pub struct FakeMigrator {
    applied: Arc<Mutex<Vec<String>>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

impl FakeMigrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, id: &str) {
        *self.fail_on.lock() = Some(id.to_string());
    }

    pub fn clear_failure(&self) {
        *self.fail_on.lock() = None;
    }

    /// Migration ids applied, in order.
    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().clone()
    }
}

#[async_trait]
impl MigrationExecutor for FakeMigrator {
    async fn apply(
        &self,
        _environment: &EnvName,
        migration: &Migration,
    ) -> Result<(), MigrationExecError> {
        if self
            .fail_on
            .lock()
            .as_deref()
            .is_some_and(|id| id == migration.id.as_str())
        {
            return Err(MigrationExecError::Failed("scripted failure".to_string()));
        }
        self.applied.lock().push(migration.id.to_string());
        Ok(())
    }
}

enum ProbeMode {
    Always(HealthOutcome),
    /// Yield the sequence, then the trailing outcome forever.
    Sequence(VecDeque<HealthOutcome>, HealthOutcome),
    /// Healthy iff the host's current reference is marked healthy.
    Host(FakeHost),
}

/// Probe with scripted outcomes, or outcomes derived from a FakeHost.
#[derive(Clone)]
pub struct FakeProbe {
    mode: Arc<Mutex<ProbeMode>>,
    delay: Arc<Mutex<Duration>>,
    probes: Arc<Mutex<u32>>,
}

impl FakeProbe {
    pub fn always(outcome: HealthOutcome) -> Self {
        Self::with_mode(ProbeMode::Always(outcome))
    }

    pub fn sequence(outcomes: Vec<HealthOutcome>, then: HealthOutcome) -> Self {
        Self::with_mode(ProbeMode::Sequence(outcomes.into(), then))
    }

    pub fn for_host(host: &FakeHost) -> Self {
        Self::with_mode(ProbeMode::Host(host.clone()))
    }

    fn with_mode(mode: ProbeMode) -> Self {
        Self {
            mode: Arc::new(Mutex::new(mode)),
            delay: Arc::new(Mutex::new(Duration::ZERO)),
            probes: Arc::new(Mutex::new(0)),
        }
    }

    /// Make every probe take this long, to exercise the probe bound.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = delay;
        self
    }

    pub fn probe_count(&self) -> u32 {
        *self.probes.lock()
    }
}

#[async_trait]
impl HealthProbe for FakeProbe {
    async fn probe(&self, _target: &ProbeTarget) -> HealthCheckResult {
        let delay = *self.delay.lock();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        *self.probes.lock() += 1;

        let outcome = {
            let mut mode = self.mode.lock();
            match &mut *mode {
                ProbeMode::Always(outcome) => *outcome,
                ProbeMode::Sequence(queue, then) => queue.pop_front().unwrap_or(*then),
                ProbeMode::Host(host) => {
                    if host.is_healthy() {
                        HealthOutcome::Healthy
                    } else {
                        HealthOutcome::Unhealthy
                    }
                }
            }
        };

        HealthCheckResult::observed(outcome, Duration::from_millis(1))
    }
}

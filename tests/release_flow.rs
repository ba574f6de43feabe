// ABOUTME: Tests for release flow phase transitions.
// ABOUTME: Verifies transition methods exist and return correct state types.

mod support;

use cutover::release::{Release, ReleaseStatus};
use cutover::store::StateStore;
use cutover::types::{EnvName, SourceRevision};
use std::collections::HashMap;
use std::time::Duration;

use support::fakes::{FakeBuilder, FakeHost, FakeMigrator, FakeProbe, FakeTransport};

// =============================================================================
// Transition Type Signature Tests
// =============================================================================

/// Verifies the type signatures of all transition methods compile correctly.
/// This ensures the phase ordering is wired up properly at compile time.
#[test]
fn transition_type_signatures_compile() {
    use cutover::build::ArtifactBuilder;
    use cutover::deploy::{
        Built, HealthChecked, Migrated, Pending, ReleaseFlow, Transported,
    };
    use cutover::health::{HealthGate, HealthProbe, ProbeTarget};
    use cutover::migrate::{MigrationExecutor, MigrationRunner};
    use cutover::transport::{ReleaseTransport, RetryPolicy};
    use cutover::types::{HostAddr, SecretValue};

    // This function is never called, but it must compile.
    // If any type signature is wrong, this will fail to compile.
    #[allow(dead_code)]
    async fn check_signatures<B, T, E, P>(
        builder: &B,
        transport: &T,
        executor: &E,
        probe: &P,
        store: &StateStore,
        gate: &HealthGate,
        target: &ProbeTarget,
        host: &HostAddr,
        flow: ReleaseFlow<Pending>,
        secrets: &HashMap<String, SecretValue>,
    ) where
        B: ArtifactBuilder,
        T: ReleaseTransport,
        E: MigrationExecutor,
        P: HealthProbe,
    {
        let retry = RetryPolicy::default();
        let runner = MigrationRunner::new(store);
        let timeout = Duration::from_secs(1);

        // Pending -> Built
        let flow: ReleaseFlow<Built> =
            flow.build(builder, secrets, timeout, store).await.unwrap();

        // Built -> Transported
        let flow: ReleaseFlow<Transported> = flow
            .transport(transport, &retry, timeout, host, store)
            .await
            .unwrap();

        // Transported -> Migrated
        let flow: ReleaseFlow<Migrated> =
            flow.migrate(&runner, None, executor, store).await.unwrap();

        // Migrated -> HealthChecked
        let flow: ReleaseFlow<HealthChecked> =
            flow.await_gate(gate, probe, target, store).await.unwrap();

        // HealthChecked - terminal: promote shifts the environment pointers
        let _release: Release = flow.promote(store).unwrap();
    }
}

// =============================================================================
// Phase Behavior
// =============================================================================

fn pending_flow(store: &StateStore) -> cutover::deploy::ReleaseFlow<cutover::deploy::Pending> {
    let release = Release::new(
        store.next_release_id().unwrap(),
        SourceRevision::new("a1b2c3d").unwrap(),
        EnvName::new("production").unwrap(),
    );
    store.record_release(&release).unwrap();
    cutover::deploy::ReleaseFlow::new(release, None)
}

#[tokio::test]
async fn build_phase_attaches_the_artifact() {
    let state = tempfile::tempdir().unwrap();
    let store = StateStore::open(state.path()).unwrap();
    let builder = FakeBuilder::new("registry.example.com/app");

    let flow = pending_flow(&store);
    let flow = flow
        .build(&builder, &HashMap::new(), Duration::from_secs(1), &store)
        .await
        .unwrap();

    assert_eq!(flow.release().status, ReleaseStatus::Building);
    assert_eq!(
        flow.release().artifact.as_ref().unwrap().to_string(),
        "registry.example.com/app:a1b2c3d"
    );
}

#[tokio::test]
async fn failed_build_hands_the_flow_back() {
    let state = tempfile::tempdir().unwrap();
    let store = StateStore::open(state.path()).unwrap();
    let builder = FakeBuilder::new("registry.example.com/app");
    builder.fail_with("missing base image");

    let flow = pending_flow(&store);
    let (flow, err) = flow
        .build(&builder, &HashMap::new(), Duration::from_secs(1), &store)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("missing base image"));
    // The flow comes back so the caller can mark the release failed
    assert_eq!(flow.release().status, ReleaseStatus::Building);
}

#[tokio::test]
async fn transport_phase_records_the_registry_reference() {
    let state = tempfile::tempdir().unwrap();
    let store = StateStore::open(state.path()).unwrap();
    let builder = FakeBuilder::new("registry.example.com/app");
    let host_fake = FakeHost::new();
    let transport = FakeTransport::new(host_fake);
    let retry = cutover::transport::RetryPolicy::default();
    let host = cutover::types::HostAddr::parse("target.example.com").unwrap();

    let flow = pending_flow(&store);
    let flow = flow
        .build(&builder, &HashMap::new(), Duration::from_secs(1), &store)
        .await
        .unwrap();
    let flow = flow
        .transport(&transport, &retry, Duration::from_secs(1), &host, &store)
        .await
        .unwrap();

    assert_eq!(flow.release().status, ReleaseStatus::Transporting);
    assert_eq!(
        flow.release().registry_ref.as_ref().unwrap().as_str(),
        "registry.example.com/app:a1b2c3d"
    );
}

#[tokio::test]
async fn promote_marks_live_and_shifts_pointers() {
    let state = tempfile::tempdir().unwrap();
    let store = StateStore::open(state.path()).unwrap();
    let builder = FakeBuilder::new("registry.example.com/app");
    let host_fake = FakeHost::new();
    host_fake.mark_healthy("registry.example.com/app:a1b2c3d");
    let transport = FakeTransport::new(host_fake.clone());
    let probe = FakeProbe::for_host(&host_fake);
    let migrator = FakeMigrator::new();
    let retry = cutover::transport::RetryPolicy::default();
    let host = cutover::types::HostAddr::parse("target.example.com").unwrap();
    let gate = cutover::health::HealthGate::new(
        Duration::from_millis(5),
        Duration::from_millis(50),
        Duration::from_millis(20),
    );
    let target = cutover::health::ProbeTarget {
        host: "target.example.com".to_string(),
        port: 8080,
        path: "/healthz".to_string(),
    };

    let runner = cutover::migrate::MigrationRunner::new(&store);
    let flow = pending_flow(&store);
    let flow = flow
        .build(&builder, &HashMap::new(), Duration::from_secs(1), &store)
        .await
        .unwrap();
    let flow = flow
        .transport(&transport, &retry, Duration::from_secs(1), &host, &store)
        .await
        .unwrap();
    let flow = flow.migrate(&runner, None, &migrator, &store).await.unwrap();
    let flow = flow.await_gate(&gate, &probe, &target, &store).await.unwrap();

    let release = flow.promote(&store).unwrap();
    assert_eq!(release.status, ReleaseStatus::Live);

    let env = store
        .environment(&EnvName::new("production").unwrap())
        .unwrap();
    assert_eq!(env.live, Some(release.id));
}

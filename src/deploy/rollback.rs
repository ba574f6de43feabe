// ABOUTME: Automatic and manual rollback to the previous live release.
// ABOUTME: Re-transports the previous artifact and re-gates it; migrations are never reversed.

use crate::health::{HealthGate, HealthProbe, ProbeTarget};
use crate::release::{Release, ReleaseStatus};
use crate::store::StateStore;
use crate::transport::{ReleaseTransport, RetryPolicy, with_retry};
use crate::types::{EnvName, HostAddr, ReleaseId};

use super::error::OrchestrateError;

/// Restore the previous release after a failed transaction.
///
/// Pulls the previous release's registry reference back onto the host and
/// waits for it to pass the health gate. Migrations are forward-only and
/// deliberately skipped. On success the failed release becomes
/// `rolled-back`; the environment pointers were never moved, so live still
/// names the previous release.
///
/// # Errors
///
/// `OrchestrateError::Rollback` if the previous artifact cannot be restored.
/// That condition is fatal and requires operator intervention.
pub(crate) async fn auto_rollback<T: ReleaseTransport, P: HealthProbe>(
    release: &mut Release,
    previous: &Release,
    transport: &T,
    retry: &RetryPolicy,
    host: &HostAddr,
    gate: &HealthGate,
    probe: &P,
    target: &ProbeTarget,
    store: &StateStore,
) -> Result<(), OrchestrateError> {
    let registry_ref =
        previous
            .registry_ref
            .as_ref()
            .ok_or_else(|| OrchestrateError::Rollback {
                reason: format!("previous release {} has no registry reference", previous.id),
            })?;

    tracing::warn!(
        release = %release.id,
        previous = %previous.id,
        "rolling back to previous release"
    );

    with_retry(retry, "rollback-pull", || transport.pull(registry_ref, host))
        .await
        .map_err(|e| OrchestrateError::Rollback {
            reason: format!("failed to restore previous artifact: {}", e),
        })?;

    gate.wait_healthy(probe, target)
        .await
        .map_err(|e| OrchestrateError::Rollback {
            reason: format!("previous release failed its health gate: {}", e),
        })?;

    release.advance(ReleaseStatus::RolledBack)?;
    store.record_release(release)?;

    Ok(())
}

/// Manual rollback - swap live and previous releases.
///
/// Pulls the previous release's artifact back onto the host, waits for the
/// health gate, then swaps the environment's live and previous pointers.
/// Double rollback returns to the original state (ping-pong).
///
/// # Errors
///
/// Returns error if:
/// - There is no previous release (nothing to roll back to)
/// - The previous release is missing from the log or was never pushed
/// - Transport or the health gate fails
pub async fn manual_rollback<T: ReleaseTransport, P: HealthProbe>(
    environment: &EnvName,
    store: &StateStore,
    transport: &T,
    retry: &RetryPolicy,
    host: &HostAddr,
    gate: &HealthGate,
    probe: &P,
    target: &ProbeTarget,
) -> Result<ReleaseId, OrchestrateError> {
    let mut env_state = store.environment(environment)?;

    let previous_id = env_state
        .previous
        .ok_or(OrchestrateError::NoPreviousRelease)?;

    let previous = store
        .load_release(previous_id)?
        .ok_or_else(|| OrchestrateError::Rollback {
            reason: format!("previous release {} not found in the log", previous_id),
        })?;

    let registry_ref =
        previous
            .registry_ref
            .as_ref()
            .ok_or_else(|| OrchestrateError::Rollback {
                reason: format!("previous release {} has no registry reference", previous_id),
            })?;

    with_retry(retry, "rollback-pull", || transport.pull(registry_ref, host))
        .await
        .map_err(|e| OrchestrateError::Rollback {
            reason: format!("failed to restore previous artifact: {}", e),
        })?;

    gate.wait_healthy(probe, target)
        .await
        .map_err(|e| OrchestrateError::Rollback {
            reason: format!("previous release failed its health gate: {}", e),
        })?;

    env_state.swap();
    store.save_environment(&env_state)?;

    tracing::info!(
        environment = %environment,
        live = %previous_id,
        "manual rollback complete"
    );

    Ok(previous_id)
}

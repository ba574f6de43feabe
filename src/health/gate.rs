// ABOUTME: The health gate: fixed-interval polling with an overall timeout.
// ABOUTME: First healthy result passes the gate; exhaustion is HealthTimeout.

use std::time::{Duration, Instant};
use thiserror::Error;

use super::{HealthCheckResult, HealthOutcome, HealthProbe, ProbeTarget};

#[derive(Debug, Error)]
pub enum HealthGateError {
    #[error(
        "no healthy result within {elapsed:?} \
         ({unhealthy} unhealthy, {unreachable} unreachable probes)"
    )]
    Timeout {
        elapsed: Duration,
        unhealthy: u32,
        unreachable: u32,
    },
}

/// Polls a target at a fixed interval until it reports healthy or the
/// timeout elapses.
///
/// Each probe is individually bounded by `probe_timeout`; a probe that
/// exceeds it counts as unreachable. A gate that never observes healthy
/// terminates within `timeout + interval` of invocation (plus one probe
/// bound), never earlier than `timeout`.
#[derive(Debug, Clone)]
pub struct HealthGate {
    pub interval: Duration,
    pub timeout: Duration,
    pub probe_timeout: Duration,
}

impl HealthGate {
    pub fn new(interval: Duration, timeout: Duration, probe_timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            probe_timeout,
        }
    }

    /// Poll until healthy or timed out.
    ///
    /// # Errors
    ///
    /// `HealthGateError::Timeout` carrying the unhealthy/unreachable counts
    /// observed, for diagnostics.
    pub async fn wait_healthy<P: HealthProbe>(
        &self,
        probe: &P,
        target: &ProbeTarget,
    ) -> Result<HealthCheckResult, HealthGateError> {
        let start = Instant::now();
        let mut unhealthy: u32 = 0;
        let mut unreachable: u32 = 0;

        loop {
            let result = match tokio::time::timeout(self.probe_timeout, probe.probe(target)).await
            {
                Ok(result) => result,
                Err(_elapsed) => {
                    HealthCheckResult::observed(HealthOutcome::Unreachable, self.probe_timeout)
                }
            };

            match result.outcome {
                HealthOutcome::Healthy => {
                    tracing::info!(
                        target = %target,
                        latency_ms = result.latency.as_millis() as u64,
                        "health gate passed"
                    );
                    return Ok(result);
                }
                HealthOutcome::Unhealthy => unhealthy += 1,
                HealthOutcome::Unreachable => unreachable += 1,
            }

            tracing::debug!(
                target = %target,
                outcome = %result.outcome,
                latency_ms = result.latency.as_millis() as u64,
                "probe"
            );

            if start.elapsed() >= self.timeout {
                return Err(HealthGateError::Timeout {
                    elapsed: start.elapsed(),
                    unhealthy,
                    unreachable,
                });
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

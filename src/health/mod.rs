// ABOUTME: Health gating: poll a deployed service until healthy or a timeout elapses.
// ABOUTME: Unhealthy and unreachable gate identically; the distinction is kept for diagnostics.

mod gate;
mod http;

pub use gate::{HealthGate, HealthGateError};
pub use http::HttpProbe;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// What one probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthOutcome {
    Healthy,
    Unhealthy,
    Unreachable,
}

impl fmt::Display for HealthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthOutcome::Healthy => "healthy",
            HealthOutcome::Unhealthy => "unhealthy",
            HealthOutcome::Unreachable => "unreachable",
        };
        f.write_str(s)
    }
}

/// Result of a single probe. Ephemeral: never persisted beyond the current
/// release attempt.
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub at: DateTime<Utc>,
    pub outcome: HealthOutcome,
    pub latency: Duration,
}

impl HealthCheckResult {
    pub fn observed(outcome: HealthOutcome, latency: Duration) -> Self {
        Self {
            at: Utc::now(),
            outcome,
            latency,
        }
    }
}

/// Where to probe: the service's health endpoint on the target host.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}{}", self.host, self.port, self.path)
    }
}

/// A bounded-latency network probe against a deployed service.
///
/// Probes are infallible by contract: transport errors are an
/// `Unreachable` outcome, not an error.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, target: &ProbeTarget) -> HealthCheckResult;
}

// ABOUTME: Release transport: push artifacts to a registry, pull them onto target hosts.
// ABOUTME: Failures split into transient (retried with backoff) and permanent (surfaced at once).

mod docker;
mod retry;

pub use docker::{DockerTransport, RegistryAuth};
pub use retry::{RetryPolicy, with_retry};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::types::{ArtifactRef, HostAddr, RegistryRef};

#[derive(Debug, Error)]
pub enum TransportError {
    /// The registry rejected our credentials. Never retried.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// The artifact or reference does not exist. Never retried.
    #[error("not found: {0}")]
    NotFound(String),

    /// The registry refused the request for a non-auth reason. Never retried.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Network-level failure (reset, refused, DNS). Retried with backoff.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The operation exceeded its deadline. Retried with backoff.
    #[error("transport timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Whether retrying may succeed without operator intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Connection(_) | TransportError::Timeout(_)
        )
    }
}

/// Moves built artifacts between the build host, the registry, and targets.
#[async_trait]
pub trait ReleaseTransport: Send + Sync {
    /// Push a locally built artifact to the registry, returning the
    /// registry-side reference to pull by.
    async fn push(&self, artifact: &ArtifactRef) -> Result<RegistryRef, TransportError>;

    /// Pull a pushed artifact onto a target host.
    async fn pull(&self, registry_ref: &RegistryRef, host: &HostAddr)
    -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(TransportError::Connection("reset".into()).is_transient());
        assert!(TransportError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(!TransportError::AuthRejected("bad token".into()).is_transient());
        assert!(!TransportError::NotFound("app:v1".into()).is_transient());
        assert!(!TransportError::Rejected("quota".into()).is_transient());
    }
}

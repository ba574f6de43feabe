// ABOUTME: Artifact building: turn a source revision into a deployable image.
// ABOUTME: Thin wrapper over the configured build tool; build failures are never retried.

mod command;

pub use command::CommandBuilder;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{ArtifactRef, SecretValue, SourceRevision};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("build exited with status {code:?}, log at {log}")]
    NonZeroExit { code: Option<i32>, log: String },

    #[error("build produced an invalid artifact reference: {0}")]
    InvalidArtifact(String),

    #[error("{0}")]
    Failed(String),
}

/// Produces a deployable artifact from a source revision.
///
/// Secrets are resolved by the caller immediately before the build and are
/// handed over transiently; builders must not persist them.
#[async_trait]
pub trait ArtifactBuilder: Send + Sync {
    async fn build(
        &self,
        revision: &SourceRevision,
        secrets: &HashMap<String, SecretValue>,
    ) -> Result<ArtifactRef, BuildError>;
}

// ABOUTME: Builder that shells out to the configured build command.
// ABOUTME: Revision and target artifact ref are injected via CUTOVER_* env vars.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::types::{ArtifactRef, SecretValue, SourceRevision};

use super::{ArtifactBuilder, BuildError};

/// Runs a shell command to build and tag the artifact, e.g.
/// `docker build -t "$CUTOVER_ARTIFACT" .`
///
/// The artifact reference is `<repository>:<revision-tag>`, computed before
/// the build so the command can tag the image it produces. Combined stdout
/// and stderr land in a per-revision build log under `log_dir`.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: String,
    repository: String,
    workdir: PathBuf,
    log_dir: PathBuf,
}

impl CommandBuilder {
    pub fn new(
        command: impl Into<String>,
        repository: impl Into<String>,
        workdir: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            command: command.into(),
            repository: repository.into(),
            workdir: workdir.into(),
            log_dir: log_dir.into(),
        }
    }

    fn log_path(&self, revision: &SourceRevision) -> PathBuf {
        self.log_dir
            .join(format!("build-{}.log", revision.as_artifact_tag()))
    }
}

#[async_trait]
impl ArtifactBuilder for CommandBuilder {
    async fn build(
        &self,
        revision: &SourceRevision,
        secrets: &HashMap<String, SecretValue>,
    ) -> Result<ArtifactRef, BuildError> {
        let artifact = ArtifactRef::from_repository(&self.repository, &revision.as_artifact_tag())
            .map_err(|e| BuildError::InvalidArtifact(e.to_string()))?;

        tracing::info!(revision = %revision, artifact = %artifact, "building artifact");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&self.command)
            .current_dir(&self.workdir)
            .env("CUTOVER_REVISION", revision.as_str())
            .env("CUTOVER_ARTIFACT", artifact.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (name, value) in secrets {
            cmd.env(name, value.expose());
        }

        let output = cmd.output().await?;

        let log_path = self.log_path(revision);
        tokio::fs::create_dir_all(&self.log_dir).await?;
        let mut log = tokio::fs::File::create(&log_path).await?;
        log.write_all(&output.stdout).await?;
        log.write_all(&output.stderr).await?;

        if !output.status.success() {
            tracing::warn!(
                revision = %revision,
                code = ?output.status.code(),
                "build command failed"
            );
            return Err(BuildError::NonZeroExit {
                code: output.status.code(),
                log: log_path.display().to_string(),
            });
        }

        Ok(artifact)
    }
}

// ABOUTME: Migration executor that shells out to a configured command per migration.
// ABOUTME: The migration file path is handed over via CUTOVER_MIGRATION.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::types::EnvName;

use super::runner::{MigrationExecError, MigrationExecutor};
use super::Migration;

/// Runs each migration through a shell command, e.g.
/// `psql "$DATABASE_URL" -f "$CUTOVER_MIGRATION"`.
#[derive(Debug, Clone)]
pub struct CommandMigrator {
    command: String,
}

impl CommandMigrator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl MigrationExecutor for CommandMigrator {
    async fn apply(
        &self,
        environment: &EnvName,
        migration: &Migration,
    ) -> Result<(), MigrationExecError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env("CUTOVER_MIGRATION", &migration.path)
            .env("CUTOVER_MIGRATION_ID", migration.id.as_str())
            .env("CUTOVER_ENVIRONMENT", environment.as_str())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            tracing::warn!(
                migration = %migration.id,
                code = ?output.status.code(),
                "migration command failed"
            );
            return Err(MigrationExecError::NonZeroExit {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(())
    }
}

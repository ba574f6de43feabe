// ABOUTME: Idempotent, sequential migration application against one environment.
// ABOUTME: A matching ledger record is a skip; a checksum mismatch is a conflict.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::store::{StateStore, StoreError};
use crate::types::{EnvName, MigrationId};

use super::{Migration, MigrationRecord, MigrationSet};

/// Errors from an executor applying a single migration.
#[derive(Debug, Error)]
pub enum MigrationExecError {
    #[error("failed to spawn migration command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("migration command exited with status {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("{0}")]
    Failed(String),
}

/// Applies one migration against an environment's persistent store.
///
/// The executor runs the migration content; the runner owns ordering,
/// idempotence, and the ledger.
#[async_trait]
pub trait MigrationExecutor: Send + Sync {
    async fn apply(
        &self,
        environment: &EnvName,
        migration: &Migration,
    ) -> Result<(), MigrationExecError>;
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {id} failed: {source}")]
    Failed {
        id: MigrationId,
        source: MigrationExecError,
    },

    /// A migration id was reused for different content. Applying it would
    /// silently run a different migration under a recorded identifier.
    #[error(
        "migration {id} was already applied with different content \
         (recorded checksum {recorded}, requested {requested})"
    )]
    ChecksumConflict {
        id: MigrationId,
        recorded: String,
        requested: String,
    },

    #[error("migration ledger error: {0}")]
    Store(#[from] StoreError),
}

/// Applies migration sets in declared order, exactly once per environment.
///
/// Migrations run sequentially, never concurrently, within one environment;
/// the orchestrator's environment lock extends that guarantee across
/// processes sharing a state store.
pub struct MigrationRunner<'a> {
    store: &'a StateStore,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(store: &'a StateStore) -> Self {
        Self { store }
    }

    /// Apply every migration in `set` not yet recorded for `environment`.
    ///
    /// Returns the number of migrations newly applied. Re-running with an
    /// identical set is a no-op returning 0.
    ///
    /// # Errors
    ///
    /// `ChecksumConflict` if a recorded id's checksum differs from the
    /// requested one; `Failed` if the executor fails partway (earlier
    /// migrations in the set stay recorded).
    pub async fn apply<E: MigrationExecutor>(
        &self,
        environment: &EnvName,
        set: &MigrationSet,
        executor: &E,
    ) -> Result<usize, MigrationError> {
        let records = self.store.migration_records(environment)?;
        let recorded: HashMap<&MigrationId, &str> = records
            .iter()
            .map(|r: &MigrationRecord| (&r.id, r.checksum.as_str()))
            .collect();

        let mut applied = 0;
        for migration in set.iter() {
            if let Some(recorded_checksum) = recorded.get(&migration.id) {
                if *recorded_checksum != migration.checksum {
                    return Err(MigrationError::ChecksumConflict {
                        id: migration.id.clone(),
                        recorded: (*recorded_checksum).to_string(),
                        requested: migration.checksum.clone(),
                    });
                }
                tracing::debug!(migration = %migration.id, "already applied, skipping");
                continue;
            }

            tracing::info!(migration = %migration.id, environment = %environment, "applying migration");
            executor
                .apply(environment, migration)
                .await
                .map_err(|source| MigrationError::Failed {
                    id: migration.id.clone(),
                    source,
                })?;

            self.store
                .append_migration_record(environment, MigrationRecord::for_migration(migration))?;
            applied += 1;
        }

        Ok(applied)
    }
}

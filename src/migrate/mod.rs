// ABOUTME: Schema migration model: content-checksummed migrations loaded from a directory.
// ABOUTME: Declared order is filename order; identifiers come from file stems.

mod command;
mod runner;

pub use command::CommandMigrator;
pub use runner::{MigrationError, MigrationExecError, MigrationExecutor, MigrationRunner};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{MigrationId, MigrationIdError};

#[derive(Debug, Error)]
pub enum MigrationLoadError {
    #[error("migrations directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("invalid migration file name {path}: {source}")]
    InvalidId {
        path: PathBuf,
        source: MigrationIdError,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One migration: a stable identifier plus the checksum of its content.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: MigrationId,
    pub checksum: String,
    pub path: PathBuf,
}

impl Migration {
    /// SHA-256 of migration content, lowercase hex.
    pub fn checksum_of(content: &str) -> String {
        format!("{:x}", Sha256::digest(content.as_bytes()))
    }
}

/// Record of an applied migration. At most one per (environment, id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub id: MigrationId,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

impl MigrationRecord {
    pub fn for_migration(migration: &Migration) -> Self {
        Self {
            id: migration.id.clone(),
            checksum: migration.checksum.clone(),
            applied_at: Utc::now(),
        }
    }
}

/// An ordered set of migrations, as declared on disk.
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Load all `.sql` files from a directory, ordered by file name.
    ///
    /// Ordering by name is the declared order; conventionally files carry a
    /// numeric or timestamp prefix.
    pub fn load(dir: &Path) -> Result<Self, MigrationLoadError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|_| MigrationLoadError::DirNotFound(dir.to_path_buf()))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
            .collect();
        paths.sort();

        let mut migrations = Vec::with_capacity(paths.len());
        for path in paths {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let id = MigrationId::new(stem).map_err(|source| MigrationLoadError::InvalidId {
                path: path.clone(),
                source,
            })?;
            let content =
                std::fs::read_to_string(&path).map_err(|source| MigrationLoadError::Io {
                    path: path.clone(),
                    source,
                })?;
            migrations.push(Migration {
                id,
                checksum: Migration::checksum_of(&content),
                path,
            });
        }

        Ok(Self { migrations })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

// ABOUTME: Persisted deployment state under an XDG-style state directory.
// ABOUTME: Append-only release log, per-environment pointer table, migration ledger.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::migrate::MigrationRecord;
use crate::release::Release;
use crate::types::{EnvName, ReleaseId};

/// Base directory for cutover state files (XDG Base Directory compliant).
const STATE_DIR: &str = ".local/state/cutover";

const RELEASE_LOG: &str = "releases.jsonl";
const ENVIRONMENTS_DIR: &str = "environments";
const MIGRATIONS_DIR: &str = "migrations";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt state record in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One row of the environment table: which release is live, and which was
/// live before it. Pointers are mutated only by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentState {
    pub name: EnvName,
    pub live: Option<ReleaseId>,
    pub previous: Option<ReleaseId>,
    pub updated_at: DateTime<Utc>,
}

impl EnvironmentState {
    /// State of an environment that has never seen a release.
    pub fn fresh(name: EnvName) -> Self {
        Self {
            name,
            live: None,
            previous: None,
            updated_at: Utc::now(),
        }
    }

    /// Promote a release: the live release becomes previous.
    pub fn promote(&mut self, release: ReleaseId) {
        self.previous = self.live;
        self.live = Some(release);
        self.updated_at = Utc::now();
    }

    /// Swap live and previous (manual rollback ping-pong).
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.live, &mut self.previous);
        self.updated_at = Utc::now();
    }
}

/// Filesystem-backed deployment state.
///
/// The release log is append-only: every status change appends a full
/// snapshot line, and the last line per id wins on read. Small files,
/// no indexes; the log is the audit trail.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Open (and create if needed) a state store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(ENVIRONMENTS_DIR))?;
        fs::create_dir_all(root.join(MIGRATIONS_DIR))?;
        Ok(Self { root })
    }

    /// Default state root: `$XDG_STATE_HOME/cutover` or `~/.local/state/cutover`.
    pub fn default_root() -> PathBuf {
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME")
            && !xdg.is_empty()
        {
            return PathBuf::from(xdg).join("cutover");
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(STATE_DIR)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn release_log_path(&self) -> PathBuf {
        self.root.join(RELEASE_LOG)
    }

    fn environment_path(&self, name: &EnvName) -> PathBuf {
        self.root
            .join(ENVIRONMENTS_DIR)
            .join(format!("{}.json", name))
    }

    fn migrations_path(&self, name: &EnvName) -> PathBuf {
        self.root
            .join(MIGRATIONS_DIR)
            .join(format!("{}.json", name))
    }

    // ------------------------------------------------------------------
    // Release log
    // ------------------------------------------------------------------

    /// Next free release id: max over the log plus one.
    pub fn next_release_id(&self) -> Result<ReleaseId, StoreError> {
        let releases = self.latest_snapshots()?;
        Ok(releases
            .keys()
            .max()
            .map(|id| id.next())
            .unwrap_or_else(ReleaseId::first))
    }

    /// Append a snapshot of the release to the log.
    pub fn record_release(&self, release: &Release) -> Result<(), StoreError> {
        let line = serde_json::to_string(release).expect("release serialization is infallible");
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.release_log_path())?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Latest snapshot of a release, if it exists.
    pub fn load_release(&self, id: ReleaseId) -> Result<Option<Release>, StoreError> {
        Ok(self.latest_snapshots()?.remove(&id))
    }

    /// Latest snapshot per release, newest id first, optionally filtered by
    /// environment and truncated to `limit`.
    pub fn recent_releases(
        &self,
        environment: Option<&EnvName>,
        limit: usize,
    ) -> Result<Vec<Release>, StoreError> {
        let snapshots = self.latest_snapshots()?;
        let mut releases: Vec<Release> = snapshots
            .into_values()
            .filter(|r| environment.is_none_or(|env| &r.environment == env))
            .collect();
        releases.sort_by(|a, b| b.id.cmp(&a.id));
        releases.truncate(limit);
        Ok(releases)
    }

    fn latest_snapshots(&self) -> Result<HashMap<ReleaseId, Release>, StoreError> {
        let path = self.release_log_path();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = HashMap::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let release: Release = serde_json::from_str(line).map_err(|source| {
                StoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?;
            snapshots.insert(release.id, release);
        }
        Ok(snapshots)
    }

    // ------------------------------------------------------------------
    // Environment table
    // ------------------------------------------------------------------

    /// Load an environment's pointer row, or a fresh row if none exists.
    pub fn environment(&self, name: &EnvName) -> Result<EnvironmentState, StoreError> {
        let path = self.environment_path(name);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|source| StoreError::Corrupt { path, source }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(EnvironmentState::fresh(name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_environment(&self, state: &EnvironmentState) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(state).expect("environment serialization is infallible");
        fs::write(self.environment_path(&state.name), json)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Migration ledger
    // ------------------------------------------------------------------

    /// All migration records for an environment, in application order.
    pub fn migration_records(&self, name: &EnvName) -> Result<Vec<MigrationRecord>, StoreError> {
        let path = self.migrations_path(name);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|source| StoreError::Corrupt { path, source }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append one migration record to an environment's ledger.
    pub fn append_migration_record(
        &self,
        name: &EnvName,
        record: MigrationRecord,
    ) -> Result<(), StoreError> {
        let mut records = self.migration_records(name)?;
        records.push(record);
        let json =
            serde_json::to_string_pretty(&records).expect("record serialization is infallible");
        fs::write(self.migrations_path(name), json)?;
        Ok(())
    }
}

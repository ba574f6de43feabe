// ABOUTME: Per-environment mutual exclusion for release transactions.
// ABOUTME: One transaction at a time per environment; distinct environments run in parallel.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::types::EnvName;

/// Information about who holds an environment lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub acquired_at: DateTime<Utc>,
    /// Environment being deployed.
    pub environment: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(environment: &EnvName) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            acquired_at: Utc::now(),
            environment: environment.to_string(),
        }
    }
}

/// Registry of per-environment async mutexes.
///
/// Acquiring an environment's lock serializes transactions against its
/// live/previous pointers; the second caller suspends until the first
/// completes and then observes its final environment state.
#[derive(Debug, Default)]
pub struct EnvLocks {
    locks: Mutex<HashMap<EnvName, Arc<tokio::sync::Mutex<()>>>>,
}

impl EnvLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for an environment, waiting if it is held.
    pub async fn acquire(&self, environment: &EnvName) -> EnvLockGuard {
        let mutex = {
            let mut map = self.locks.lock();
            map.entry(environment.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        let permit = mutex.lock_owned().await;
        let info = LockInfo::new(environment);
        tracing::debug!(
            environment = %environment,
            holder = %info.holder,
            pid = info.pid,
            "environment lock acquired"
        );

        EnvLockGuard {
            _permit: permit,
            info,
        }
    }
}

/// A held environment lock; releases on drop.
pub struct EnvLockGuard {
    _permit: OwnedMutexGuard<()>,
    info: LockInfo,
}

impl EnvLockGuard {
    pub fn info(&self) -> &LockInfo {
        &self.info
    }
}

impl std::fmt::Debug for EnvLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvLockGuard")
            .field("environment", &self.info.environment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn lock_info_records_current_host_and_pid() {
        let env = EnvName::new("production").unwrap();
        let info = LockInfo::new(&env);

        assert_eq!(info.environment, "production");
        assert_eq!(info.pid, std::process::id());
        assert!(!info.holder.is_empty());
    }

    #[tokio::test]
    async fn second_acquire_waits_for_first() {
        let locks = EnvLocks::new();
        let env = EnvName::new("production").unwrap();

        let guard = locks.acquire(&env).await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&env)).await;
        assert!(blocked.is_err(), "second acquire should wait");

        drop(guard);
        let _second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&env))
            .await
            .expect("lock should be free after drop");
    }

    #[tokio::test]
    async fn distinct_environments_do_not_contend() {
        let locks = EnvLocks::new();
        let prod = EnvName::new("production").unwrap();
        let staging = EnvName::new("staging").unwrap();

        let _prod_guard = locks.acquire(&prod).await;
        let _staging_guard = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&staging))
            .await
            .expect("distinct environment should not contend");
    }
}

// ABOUTME: Secret resolution at deploy time from opaque handles.
// ABOUTME: The default store reads the process environment (CI secrets convention).

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{SecretHandle, SecretValue};

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(SecretHandle),
}

/// Resolves named secrets to values at deploy time.
///
/// The core only ever holds handles; values flow straight into a build
/// command's environment and are dropped with it.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn resolve(&self, handle: &SecretHandle) -> Result<SecretValue, SecretError>;
}

/// Resolves handles from the process environment, the convention CI
/// pipelines use to expose their secret stores.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn resolve(&self, handle: &SecretHandle) -> Result<SecretValue, SecretError> {
        std::env::var(handle.as_str())
            .map(SecretValue::new)
            .map_err(|_| SecretError::NotFound(handle.clone()))
    }
}

/// Resolve a set of handles into a name -> value map for command injection.
pub async fn resolve_all<S: SecretStore>(
    store: &S,
    handles: &[SecretHandle],
) -> Result<HashMap<String, SecretValue>, SecretError> {
    let mut resolved = HashMap::with_capacity(handles.len());
    for handle in handles {
        let value = store.resolve(handle).await?;
        resolved.insert(handle.as_str().to_string(), value);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_secret_is_reported_by_handle() {
        let store = EnvSecretStore::new();
        let handle = SecretHandle::new("CUTOVER_TEST_SECRET_THAT_IS_NEVER_SET").unwrap();

        let err = store.resolve(&handle).await.unwrap_err();
        assert!(err.to_string().contains("CUTOVER_TEST_SECRET_THAT_IS_NEVER_SET"));
    }

    #[tokio::test]
    async fn resolve_all_stops_on_first_missing_handle() {
        let store = EnvSecretStore::new();
        let handles = vec![SecretHandle::new("CUTOVER_TEST_SECRET_THAT_IS_NEVER_SET").unwrap()];

        assert!(resolve_all(&store, &handles).await.is_err());
    }
}

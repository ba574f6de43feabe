// ABOUTME: Per-environment deployment target configuration.
// ABOUTME: Name, host address, health gate parameters, and secret handles.

use serde::Deserialize;

use crate::types::{EnvName, HostAddr, SecretHandle};

use super::health::HealthConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub name: EnvName,

    /// Target host running the container daemon.
    pub host: HostAddr,

    pub health: HealthConfig,

    /// Handles into the secret store, resolved at deploy time. Values
    /// never appear in configuration or persisted state.
    #[serde(default)]
    pub secrets: Vec<SecretHandle>,
}

impl EnvironmentConfig {
    pub fn template() -> Self {
        Self {
            name: EnvName::new("production").unwrap(),
            host: HostAddr::parse("app.example.com").unwrap(),
            health: HealthConfig::template(),
            secrets: Vec::new(),
        }
    }
}

// ABOUTME: Health gate configuration with sensible defaults.
// ABOUTME: Defines the probe endpoint and the polling cadence.

use serde::Deserialize;
use std::time::Duration;

use crate::health::{HealthGate, ProbeTarget};
use crate::types::HostAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Port the service's health endpoint listens on.
    pub port: u16,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,
}

fn default_path() -> String {
    "/healthz".to_string()
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

impl HealthConfig {
    pub fn gate(&self) -> HealthGate {
        HealthGate::new(self.interval, self.timeout, self.probe_timeout)
    }

    /// The probe target for this environment's host.
    pub fn target(&self, host: &HostAddr) -> ProbeTarget {
        ProbeTarget {
            host: host.host().to_string(),
            port: self.port,
            path: self.path.clone(),
        }
    }

    pub fn template() -> Self {
        Self {
            port: 8080,
            path: default_path(),
            interval: default_interval(),
            timeout: default_timeout(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

// ABOUTME: Shared test support for integration tests.
// ABOUTME: Scripted collaborator fakes and environment fixtures.

#![allow(dead_code)]

pub mod fakes;

use cutover::config::{EnvironmentConfig, HealthConfig};
use cutover::types::{EnvName, HostAddr};
use std::time::Duration;

/// An environment with a health gate fast enough for tests.
pub fn env_config(name: &str) -> EnvironmentConfig {
    EnvironmentConfig {
        name: EnvName::new(name).unwrap(),
        host: HostAddr::parse("target.example.com").unwrap(),
        health: HealthConfig {
            port: 8080,
            path: "/healthz".to_string(),
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(60),
            probe_timeout: Duration::from_millis(20),
        },
        secrets: Vec::new(),
    }
}

// ABOUTME: Configuration types and parsing for cutover.yml.
// ABOUTME: Handles YAML parsing, validated types, and environment lookup.

mod environment;
mod health;

pub use environment::EnvironmentConfig;
pub use health::HealthConfig;

use crate::error::{Error, Result};
use crate::transport::RetryPolicy;
use crate::types::{EnvName, ServiceName};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "cutover.yml";
pub const CONFIG_FILENAME_ALT: &str = "cutover.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".cutover/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceName,

    pub artifact: ArtifactConfig,

    pub build: BuildConfig,

    #[serde(deserialize_with = "deserialize_environments")]
    pub environments: NonEmpty<EnvironmentConfig>,

    #[serde(default)]
    pub migrations: Option<MigrationsConfig>,

    #[serde(default)]
    pub transport: TransportConfig,

    /// Overrides the XDG-derived state directory.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    /// Registry repository the build tags into, e.g. `registry.example.com/app`.
    #[serde(deserialize_with = "deserialize_repository")]
    pub repository: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Shell command producing the image tagged `$CUTOVER_ARTIFACT`.
    pub command: String,

    #[serde(default = "default_build_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Working directory for the build command. Defaults to the project dir.
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

fn default_build_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationsConfig {
    #[serde(default = "default_migrations_dir")]
    pub dir: PathBuf,

    /// Shell command applying one migration file (`$CUTOVER_MIGRATION`).
    pub command: String,
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_transport_attempts")]
    pub attempts: u32,

    #[serde(default = "default_base_delay", with = "humantime_serde")]
    pub base_delay: Duration,

    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,

    #[serde(default = "default_transport_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            attempts: default_transport_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            timeout: default_transport_timeout(),
        }
    }
}

impl TransportConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
        }
    }
}

fn default_transport_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_transport_timeout() -> Duration {
    Duration::from_secs(5 * 60)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Look up an environment by name.
    pub fn environment(&self, name: &EnvName) -> Result<&EnvironmentConfig> {
        self.environments
            .iter()
            .find(|e| &e.name == name)
            .ok_or_else(|| Error::UnknownEnvironment(name.to_string()))
    }

    /// Resolve the state directory: explicit config wins, then XDG.
    pub fn state_root(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(crate::store::StateStore::default_root)
    }

    pub fn template() -> Self {
        Config {
            service: ServiceName::new("my-app").unwrap(),
            artifact: ArtifactConfig {
                repository: "registry.example.com/my-app".to_string(),
            },
            build: BuildConfig {
                command: "docker build -t \"$CUTOVER_ARTIFACT\" .".to_string(),
                timeout: default_build_timeout(),
                workdir: None,
            },
            environments: NonEmpty::new(EnvironmentConfig::template()),
            migrations: None,
            transport: TransportConfig::default(),
            state_dir: None,
        }
    }
}

pub fn init_config(
    dir: &Path,
    service: Option<&str>,
    repository: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(s) = service {
        config.service = ServiceName::new(s).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    if let Some(r) = repository {
        if r.trim().is_empty() {
            return Err(Error::InvalidConfig("repository cannot be empty".into()));
        }
        config.artifact.repository = r.to_string();
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let env = config.environments.first();
    format!(
        r#"service: {}
artifact:
  repository: {}
build:
  command: docker build -t "$CUTOVER_ARTIFACT" .
environments:
  - name: {}
    host: {}
    health:
      port: {}
      path: {}
"#,
        config.service,
        config.artifact.repository,
        env.name,
        env.host,
        env.health.port,
        env.health.path,
    )
}

// Custom deserializers

fn deserialize_environments<'de, D>(
    deserializer: D,
) -> std::result::Result<NonEmpty<EnvironmentConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<EnvironmentConfig> = Vec::deserialize(deserializer)?;

    let mut names = std::collections::HashSet::new();
    for env in &values {
        if !names.insert(env.name.clone()) {
            return Err(serde::de::Error::custom(format!(
                "duplicate environment name: {}",
                env.name
            )));
        }
    }

    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one environment is required"))
}

fn deserialize_repository<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.trim().is_empty() {
        return Err(serde::de::Error::custom("repository cannot be empty"));
    }
    Ok(s)
}

// ABOUTME: Application-wide error types for cutover.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no revision given (pass --revision or set CUTOVER_REVISION)")]
    MissingRevision,

    #[error("deployment failed: {0}")]
    Deploy(String),

    #[error("state store error: {0}")]
    Store(String),

    #[error("secret resolution failed: {0}")]
    Secrets(String),

    #[error("migrations error: {0}")]
    Migrations(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

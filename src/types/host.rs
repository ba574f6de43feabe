// ABOUTME: Target host address parsing.
// ABOUTME: Accepts host or host:port; the port defaults to the daemon TCP port.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Default TCP port for a remote container daemon.
const DEFAULT_DAEMON_PORT: u16 = 2375;

#[derive(Debug, Error)]
pub enum ParseHostAddrError {
    #[error("host address cannot be empty")]
    Empty,

    #[error("invalid port in host address: {0}")]
    InvalidPort(String),

    #[error("invalid character in host address: '{0}'")]
    InvalidChar(char),
}

/// Address of a deployment target host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostAddr {
    host: String,
    port: u16,
}

impl HostAddr {
    pub fn parse(input: &str) -> Result<Self, ParseHostAddrError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseHostAddrError::Empty);
        }

        let (host, port) = match input.rsplit_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| ParseHostAddrError::InvalidPort(port_str.to_string()))?;
                (host, port)
            }
            None => (input, DEFAULT_DAEMON_PORT),
        };

        if host.is_empty() {
            return Err(ParseHostAddrError::Empty);
        }

        for c in host.chars() {
            if !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-') {
                return Err(ParseHostAddrError::InvalidChar(c));
            }
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for HostAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Serialize for HostAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HostAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        HostAddr::parse(&value).map_err(serde::de::Error::custom)
    }
}

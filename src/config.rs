//! Naming-server configuration.

use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::replica::DEFAULT_REPLICATION_THRESHOLD;

/// Well-known Service port; clients build stubs without discovery.
pub const SERVICE_PORT: u16 = 6000;

/// Well-known Registration port.
pub const REGISTRATION_PORT: u16 = 6001;

/// Errors from loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    IO(io::Error),
    Parse(toml::de::Error),
}

/// Runtime configuration, loadable from TOML. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub service_port: u16,
    pub registration_port: u16,
    /// Shared acquires of one file before it is replicated to another node.
    pub replication_threshold: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_port: SERVICE_PORT,
            registration_port: REGISTRATION_PORT,
            replication_threshold: DEFAULT_REPLICATION_THRESHOLD,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::IO)?;
        toml::from_str(&text).map_err(ConfigError::Parse)
    }
}

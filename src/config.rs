//! Configuration management for ns-filter
//!
//! Handles loading and validating the host-side configuration file. The
//! `processor` section is the default option map handed to each invocation;
//! per-invocation values (CLI flags, HTTP query parameters) are laid on top.
//!
//! ```yaml
//! server:
//!   port: 8181
//!   path: /process
//! processor:
//!   expression: '([0-9]{1,3}\.){3}([0-9]{1,3})'
//!   tag: ip
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::policy::{ConfigMap, ConfigValue};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Default processor options
    #[serde(default)]
    pub processor: ConfigMap,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Process endpoint path
    #[serde(default = "default_process_path")]
    pub path: String,

    /// Server bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

// Default value functions
fn default_port() -> u16 {
    8181
}

fn default_process_path() -> String {
    "/process".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

/// Paths served by fixed routes
const RESERVED_PATHS: &[&str] = &["/", "/health", "/meta", "/policy"];

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            path: default_process_path(),
            bind_address: default_bind_address(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    ///
    /// # Note
    /// - If the file doesn't exist, returns `ConfigError::ReadError`
    /// - Use `Config::load_or_default()` if you want fallback to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    ///
    /// Use this for optional configuration files (e.g., when all options come from flags)
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Processor defaults overlaid with `overrides`
    pub fn processor_options<I, K, V>(&self, overrides: I) -> ConfigMap
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        let mut options = self.processor.clone();
        options.extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        options
    }

    /// Validate the configuration
    ///
    /// Processor options are not checked here; they are validated per
    /// invocation once overrides are applied.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if !self.server.path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "Process path must start with '/'".to_string(),
            ));
        }

        if RESERVED_PATHS.contains(&self.server.path.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Process path '{}' conflicts with a built-in route",
                self.server.path
            )));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "max_body_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

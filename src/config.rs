//! Service configuration
//!
//! Settings are read from an optional TOML file and then overridden from the
//! process environment. Every field has a default, so an empty file (or no
//! file at all) yields a runnable configuration listening on port 8080.

use crate::tasks::Operation;
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use thiserror::Error;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub queue: QueueSection,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub timings: OperationTimings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Task queue settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueSection {
    /// Maximum number of outstanding tasks across all expressions
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    100
}

/// In-process agent settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSection {
    /// Number of agent loops to run; 0 leaves all work to external pollers
    #[serde(default = "default_agent_workers")]
    pub workers: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            workers: default_agent_workers(),
        }
    }
}

fn default_agent_workers() -> usize {
    1
}

/// Simulated per-operator durations in milliseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OperationTimings {
    #[serde(default)]
    pub addition_ms: u64,
    #[serde(default)]
    pub subtraction_ms: u64,
    #[serde(default)]
    pub multiplication_ms: u64,
    #[serde(default)]
    pub division_ms: u64,
}

impl OperationTimings {
    pub fn for_operation(&self, operation: Operation) -> u64 {
        match operation {
            Operation::Add => self.addition_ms,
            Operation::Subtract => self.subtraction_ms,
            Operation::Multiply => self.multiplication_ms,
            Operation::Divide => self.division_ms,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid value for environment variable {name}: {value:?}")]
    InvalidEnvVar { name: String, value: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ServerConfig {
    /// Load configuration from a TOML file, apply environment overrides and validate
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: ServerConfig = toml::from_str(&content)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from defaults plus environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = ServerConfig::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    ///
    /// Unset and empty variables leave the current value untouched.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host.trim().to_string();
        }
        if let Some(port) = get("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Some(capacity) = get("QUEUE_CAPACITY") {
            self.queue.capacity = parse_env("QUEUE_CAPACITY", &capacity)?;
        }
        if let Some(workers) = get("AGENT_WORKERS") {
            self.agent.workers = parse_env("AGENT_WORKERS", &workers)?;
        }
        if let Some(ms) = get("TIME_ADDITION_MS") {
            self.timings.addition_ms = parse_env("TIME_ADDITION_MS", &ms)?;
        }
        if let Some(ms) = get("TIME_SUBTRACTION_MS") {
            self.timings.subtraction_ms = parse_env("TIME_SUBTRACTION_MS", &ms)?;
        }
        if let Some(ms) = get("TIME_MULTIPLICATION_MS") {
            self.timings.multiplication_ms = parse_env("TIME_MULTIPLICATION_MS", &ms)?;
        }
        if let Some(ms) = get("TIME_DIVISION_MS") {
            self.timings.division_ms = parse_env("TIME_DIVISION_MS", &ms)?;
        }

        Ok(())
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "queue.capacity must be greater than zero".to_string(),
            ));
        }
        if self.server.host.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "server.host must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the HTTP listener address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        (self.server.host.as_str(), self.server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| {
                ConfigError::InvalidConfig(format!(
                    "cannot resolve listen address {}:{}",
                    self.server.host, self.server.port
                ))
            })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value: value.to_string(),
        })
}

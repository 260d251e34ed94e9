//! Configuration file support for telemetryd
//!
//! Loads and validates daemon configuration from a TOML file. Every field has
//! a default, so a missing file yields a usable configuration.

use crate::error::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address for the request/response API
    #[serde(default = "default_api_bind")]
    pub bind: String,
}

/// SNMP polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Default community string for polls that do not supply one
    #[serde(default = "default_poll_community")]
    pub community: String,

    /// Default UDP port on target devices
    #[serde(default = "default_poll_port")]
    pub port: u16,

    /// Default strategy name
    #[serde(default = "default_poll_strategy")]
    pub strategy: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,

    /// Per-request retry count
    #[serde(default = "default_poll_retries")]
    pub retries: u32,
}

impl PollConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Trap listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrapConfig {
    /// Address the UDP trap listener binds to
    #[serde(default = "default_trap_bind")]
    pub bind: String,

    /// UDP port the trap listener binds to
    #[serde(default = "default_trap_port")]
    pub port: u16,

    /// Community string expected on inbound notifications
    #[serde(default = "default_trap_community")]
    pub community: String,
}

/// Complete telemetryd configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryConfig {
    /// HTTP API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Polling defaults
    #[serde(default)]
    pub poll: PollConfig,

    /// Trap listener settings
    #[serde(default)]
    pub trap: TrapConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_api_bind(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            community: default_poll_community(),
            port: default_poll_port(),
            strategy: default_poll_strategy(),
            timeout_secs: default_poll_timeout(),
            retries: default_poll_retries(),
        }
    }
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            bind: default_trap_bind(),
            port: default_trap_port(),
            community: default_trap_community(),
        }
    }
}

fn default_api_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_poll_community() -> String {
    "public".to_string()
}

fn default_poll_port() -> u16 {
    161
}

fn default_poll_strategy() -> String {
    "default".to_string()
}

fn default_poll_timeout() -> u64 {
    5
}

fn default_poll_retries() -> u32 {
    2
}

fn default_trap_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_trap_port() -> u16 {
    162
}

fn default_trap_community() -> String {
    "public".to_string()
}

impl TelemetryConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            TelemetryError::Config(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| TelemetryError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when the file exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.api.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(TelemetryError::Config(format!(
                "api.bind '{}' is not a valid socket address",
                self.api.bind
            )));
        }
        if self.trap.bind.parse::<std::net::IpAddr>().is_err() {
            return Err(TelemetryError::Config(format!(
                "trap.bind '{}' is not a valid IP address",
                self.trap.bind
            )));
        }
        if self.poll.timeout_secs == 0 {
            return Err(TelemetryError::Config(
                "poll.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.poll.community.is_empty() {
            return Err(TelemetryError::Config(
                "poll.community must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

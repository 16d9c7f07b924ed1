// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// The flat server configuration, populated before the server is initialized.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to accept connections on. 0 asks the OS for an ephemeral port.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_backlog")]
    pub backlog: u32,

    // Node info.
    /// This node's identifier on the network.
    #[serde(default)]
    pub node_id: u64,
    /// Whether this node should connect to the master and other nodes.
    #[serde(default)]
    pub should_connect: bool,
    /// Whether this node skips authenticating clients.
    #[serde(default = "default_anonymous")]
    pub anonymous: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum accepted frame payload length. Unset accepts any declared
    /// length; set it to stop a peer from stalling the receive buffer with a
    /// huge length prefix.
    #[serde(default)]
    pub max_frame_len: Option<usize>,
    /// Connections silent for longer than this are evicted by the sweeper.
    #[serde(with = "humantime_serde", default = "default_idle_timeout")]
    pub idle_timeout: Duration,
    /// How often the liveness sweeper runs.
    #[serde(with = "humantime_serde", default = "default_sweep_interval")]
    pub sweep_interval: Duration,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_listen_port() -> u16 {
    42042
}
fn default_backlog() -> u32 {
    250
}
fn default_anonymous() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_idle_timeout() -> Duration {
    Duration::from_secs(15)
}
fn default_sweep_interval() -> Duration {
    Duration::from_secs(1)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            listen_port: default_listen_port(),
            backlog: default_backlog(),
            node_id: 0,
            should_connect: false,
            anonymous: default_anonymous(),
            log_level: default_log_level(),
            max_frame_len: None,
            idle_timeout: default_idle_timeout(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at '{path}'"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse TOML from '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file if it exists; a missing file means pure defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!("config file '{path}' not found, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Validates the configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.backlog == 0 {
            return Err(anyhow!("backlog cannot be 0"));
        }
        if self.sweep_interval.is_zero() {
            return Err(anyhow!("sweep_interval cannot be 0"));
        }
        if self.idle_timeout.is_zero() {
            return Err(anyhow!("idle_timeout cannot be 0"));
        }
        if self.max_frame_len == Some(0) {
            return Err(anyhow!("max_frame_len cannot be 0; omit it to disable the limit"));
        }
        if let Some(limit) = self.max_frame_len
            && limit > u32::MAX as usize
        {
            return Err(anyhow!(
                "max_frame_len cannot exceed the 4-byte length prefix range"
            ));
        }
        Ok(())
    }
}

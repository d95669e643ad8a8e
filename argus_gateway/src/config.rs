//! Gateway configuration.
//!
//! Loaded from a TOML file with every field optional, so a bare
//! `argus_gateway` run works against a local rosbridge with the stock
//! topic names.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use argus_core::relay::{RelayConfig, Topics};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the HTTP/WebSocket server binds.
    pub listen: SocketAddr,
    /// rosbridge endpoint on the robot side.
    pub bus_url: String,
    /// Telemetry push interval per session, in milliseconds.
    pub cadence_ms: u64,
    /// Directory served under `/static` when it exists.
    pub static_dir: Option<PathBuf>,
    /// Robot bus topic names.
    pub topics: Topics,
    /// Bus connection retry policy at startup.
    pub startup: StartupPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8000)),
            bus_url: "ws://127.0.0.1:9090".to_string(),
            cadence_ms: 500,
            static_dir: Some(PathBuf::from("static")),
            topics: Topics::default(),
            startup: StartupPolicy::default(),
        }
    }
}

/// Retry policy for the robot-bus connection at boot. The bus is a hard
/// dependency: the listener does not bind until the bus is up, and the
/// process exits once the attempts are spent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupPolicy {
    /// Connection attempts before giving up.
    pub max_attempts: u32,
    /// Delay after the first failed attempt, in milliseconds. Doubles
    /// per retry up to `max_backoff_ms`.
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for StartupPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            backoff_ms: 500,
            max_backoff_ms: 5000,
        }
    }
}

impl GatewayConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        if config.cadence_ms == 0 {
            anyhow::bail!(
                "cadence_ms must be greater than 0 in config file {}",
                path.display()
            );
        }
        Ok(config)
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            topics: self.topics.clone(),
            cadence: self.cadence(),
        }
    }
}

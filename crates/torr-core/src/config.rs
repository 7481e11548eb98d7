//! Configuration system for torr.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $TORR_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/torr/config.toml
//!   3. ~/.config/torr/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::wire::MAX_FRAME_BYTES;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TorrConfig {
    pub node: NodeConfig,
    pub hub: HubConfig,
    pub transport: TransportConfig,
    pub workers: WorkerConfig,
    pub replication: ReplicationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Owner label shared by every instance this process starts.
    pub owner: String,
    /// Address nodes listen on and advertise.
    pub host: String,
    /// Instance `i` listens on `base_port + i`.
    pub base_port: u16,
    /// Number of node instances to start, indexed from 1.
    pub instances: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Upper bound on one request/response exchange, connect included.
    pub exchange_timeout_ms: u64,
    /// Largest body length a peer may announce.
    pub max_frame_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Max inbound connections served at once per node. 0 = 4 × cores.
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Seed for per-chunk peer shuffling. Unset = seeded from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            owner: "node".to_string(),
            host: "127.0.0.1".to_string(),
            base_port: 5010,
            instances: 3,
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            exchange_timeout_ms: 10_000,
            max_frame_bytes: MAX_FRAME_BYTES,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { max_connections: 0 }
    }
}

impl TransportConfig {
    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange_timeout_ms)
    }
}

impl WorkerConfig {
    /// Resolved pool size.
    pub fn pool_size(&self) -> usize {
        if self.max_connections == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get() * 4)
                .unwrap_or(16)
        } else {
            self.max_connections as usize
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("torr")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl TorrConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            TorrConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("TORR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&TorrConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply TORR_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("TORR_NODE__OWNER") {
            self.node.owner = v;
        }
        if let Some(p) = lookup("TORR_NODE__BASE_PORT").and_then(|v| v.parse().ok()) {
            self.node.base_port = p;
        }
        if let Some(n) = lookup("TORR_NODE__INSTANCES").and_then(|v| v.parse().ok()) {
            self.node.instances = n;
        }
        if let Some(v) = lookup("TORR_HUB__HOST") {
            self.hub.host = v;
        }
        if let Some(p) = lookup("TORR_HUB__PORT").and_then(|v| v.parse().ok()) {
            self.hub.port = p;
        }
        if let Some(ms) = lookup("TORR_TRANSPORT__EXCHANGE_TIMEOUT_MS").and_then(|v| v.parse().ok())
        {
            self.transport.exchange_timeout_ms = ms;
        }
        if let Some(n) = lookup("TORR_WORKERS__MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            self.workers.max_connections = n;
        }
        if let Some(seed) = lookup("TORR_REPLICATION__RNG_SEED").and_then(|v| v.parse().ok()) {
            self.replication.rng_seed = Some(seed);
        }
    }
}

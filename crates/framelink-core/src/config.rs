//! Configuration system for framelink.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $FRAMELINK_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/framelink/config.toml
//!   3. ~/.config/framelink/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which transport regime the daemon serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Reliable, ordered, length-prefixed TCP. One peer at a time.
    Stream,
    /// Best-effort chunked UDP. Loss-tolerant, lowest latency.
    Datagram,
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stream" => Ok(Transport::Stream),
            "datagram" => Ok(Transport::Datagram),
            other => Err(ConfigError::UnknownTransport(other.to_string())),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FramelinkConfig {
    pub network: NetworkConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Active transport regime.
    pub transport: Transport,
    /// TCP listen address for stream mode.
    pub stream_listen_addr: String,
    /// UDP bind address for datagram mode.
    pub datagram_listen_addr: String,
    /// Where processed frames are sent back in datagram mode.
    pub peer_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Eviction distance W: incomplete frames more than this many ids behind
    /// the newest completed frame are dropped.
    pub reassembly_window: u16,
    /// Age ceiling for reassembly entries that never complete.
    pub stale_entry_secs: u64,
    /// How often throughput is reported.
    pub metrics_interval_secs: u64,
    /// Nominal frame dimensions handed to the opaque codec.
    pub frame_width: u16,
    pub frame_height: u16,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for FramelinkConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Datagram,
            stream_listen_addr: "0.0.0.0:5000".to_string(),
            datagram_listen_addr: "0.0.0.0:5000".to_string(),
            peer_addr: "127.0.0.1:5002".to_string(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            reassembly_window: 5,
            stale_entry_secs: 5,
            metrics_interval_secs: 2,
            frame_width: 320,
            frame_height: 240,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("framelink")
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
    #[error("unknown transport {0:?} (expected \"stream\" or \"datagram\")")]
    UnknownTransport(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl FramelinkConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_file(&Self::file_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
        } else {
            Ok(FramelinkConfig::default())
        }
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("FRAMELINK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        Self::write_default_at(&path)?;
        Ok(path)
    }

    fn write_default_at(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
            }
            let text = toml::to_string_pretty(&FramelinkConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(path, text)
                .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
        }
        Ok(())
    }

    /// Apply FRAMELINK_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("FRAMELINK_NETWORK__TRANSPORT") {
            if let Ok(t) = v.parse() {
                self.network.transport = t;
            }
        }
        if let Ok(v) = std::env::var("FRAMELINK_NETWORK__STREAM_LISTEN_ADDR") {
            self.network.stream_listen_addr = v;
        }
        if let Ok(v) = std::env::var("FRAMELINK_NETWORK__DATAGRAM_LISTEN_ADDR") {
            self.network.datagram_listen_addr = v;
        }
        if let Ok(v) = std::env::var("FRAMELINK_NETWORK__PEER_ADDR") {
            self.network.peer_addr = v;
        }
        if let Ok(v) = std::env::var("FRAMELINK_RELAY__REASSEMBLY_WINDOW") {
            if let Ok(w) = v.parse() {
                self.relay.reassembly_window = w;
            }
        }
        if let Ok(v) = std::env::var("FRAMELINK_RELAY__METRICS_INTERVAL_SECS") {
            if let Ok(secs) = v.parse() {
                self.relay.metrics_interval_secs = secs;
            }
        }
    }
}

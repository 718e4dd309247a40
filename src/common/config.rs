//! Configuration for a minits data node
//!
//! Sources, lowest priority first: built-in defaults, the TOML file
//! (`minits.toml` unless overridden), `MINITS__*` environment variables.
//! The binaries apply CLI flags on top.

use crate::common::utils::{parse_duration, parse_size};
use crate::common::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up by `Config::load`
pub const DEFAULT_CONFIG_FILE: &str = "minits.toml";

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// This node's id; must match one of `peers` to own shards
    #[serde(default = "default_node_id")]
    pub node_id: u64,

    /// Bind address for the HTTP API
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// RocksDB path for cluster metadata
    #[serde(default = "default_meta_dir")]
    pub meta_dir: PathBuf,

    /// Data nodes of the cluster (including this one)
    #[serde(default)]
    pub peers: Vec<PeerConfig>,

    /// Deadline for one coordinator write call
    #[serde(default = "default_write_timeout")]
    pub write_timeout_ms: u64,

    /// Per-request timeout of the HTTP shard transport
    #[serde(default = "default_remote_request_timeout")]
    pub remote_request_timeout_ms: u64,

    /// Local shard store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Database created at startup when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_database: Option<DatabaseConfig>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// A data node reachable over HTTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    pub id: u64,
    pub address: String,
}

/// Local shard store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Size at which the store starts rejecting writes
    #[serde(
        default = "default_cache_max_memory_size",
        deserialize_with = "deserialize_size"
    )]
    pub cache_max_memory_size: u64,

    /// Size at which a shard cache would be snapshotted
    #[serde(
        default = "default_cache_snapshot_memory_size",
        deserialize_with = "deserialize_size"
    )]
    pub cache_snapshot_memory_size: u64,

    /// Maximum points per encoded block
    #[serde(default = "default_max_points_per_block")]
    pub max_points_per_block: usize,
}

/// Database bootstrapped at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,

    #[serde(default = "default_retention_policy")]
    pub retention_policy: String,

    #[serde(default = "default_replica_n")]
    pub replica_n: usize,

    /// How long data is kept ("0s" keeps it forever)
    #[serde(default = "default_retention_duration")]
    pub duration: String,

    /// Width of one shard group window
    #[serde(default = "default_shard_group_duration")]
    pub shard_group_duration: String,
}

fn default_node_id() -> u64 {
    1
}
fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8086))
}
fn default_meta_dir() -> PathBuf {
    PathBuf::from("./meta")
}
fn default_write_timeout() -> u64 {
    10_000
}
fn default_remote_request_timeout() -> u64 {
    5_000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cache_max_memory_size() -> u64 {
    500 * 1024 * 1024
}
fn default_cache_snapshot_memory_size() -> u64 {
    25 * 1024 * 1024
}
fn default_max_points_per_block() -> usize {
    1000
}
fn default_retention_policy() -> String {
    "autogen".to_string()
}
fn default_replica_n() -> usize {
    1
}
fn default_retention_duration() -> String {
    "0s".to_string()
}
fn default_shard_group_duration() -> String {
    "7d".to_string()
}

/// Accepts either a plain byte count or a string such as "500mb"
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeValue {
        Bytes(u64),
        Text(String),
    }

    match SizeValue::deserialize(deserializer)? {
        SizeValue::Bytes(n) => Ok(n),
        SizeValue::Text(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            bind_addr: default_bind_addr(),
            meta_dir: default_meta_dir(),
            peers: Vec::new(),
            write_timeout_ms: default_write_timeout(),
            remote_request_timeout_ms: default_remote_request_timeout(),
            storage: StorageConfig::default(),
            default_database: None,
            log_level: default_log_level(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_max_memory_size: default_cache_max_memory_size(),
            cache_snapshot_memory_size: default_cache_snapshot_memory_size(),
            max_points_per_block: default_max_points_per_block(),
        }
    }
}

impl Config {
    /// Load from `minits.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from the given file (optional) and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("MINITS").separator("__"))
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document (used by tests and tooling)
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.write_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "write_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.remote_request_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "remote_request_timeout_ms must be greater than zero".into(),
            ));
        }
        self.storage.validate()?;

        let mut ids: Vec<u64> = self.peers.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.peers.len() {
            return Err(Error::InvalidConfig("duplicate peer id".into()));
        }

        if let Some(db) = &self.default_database {
            db.validate()?;
        }
        Ok(())
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn remote_request_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_request_timeout_ms)
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_points_per_block == 0 {
            return Err(Error::InvalidConfig(
                "storage.max_points_per_block must be greater than zero".into(),
            ));
        }
        if self.cache_snapshot_memory_size > self.cache_max_memory_size {
            return Err(Error::InvalidConfig(format!(
                "storage.cache_snapshot_memory_size ({}) exceeds cache_max_memory_size ({})",
                self.cache_snapshot_memory_size, self.cache_max_memory_size
            )));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidConfig("database name cannot be empty".into()));
        }
        if self.replica_n == 0 {
            return Err(Error::InvalidConfig("replica_n must be at least 1".into()));
        }
        if self.shard_group_duration()?.is_zero() {
            return Err(Error::InvalidConfig(
                "shard_group_duration must be greater than zero".into(),
            ));
        }
        self.duration()?;
        Ok(())
    }

    pub fn duration(&self) -> Result<Duration> {
        parse_duration(&self.duration)
    }

    pub fn shard_group_duration(&self) -> Result<Duration> {
        parse_duration(&self.shard_group_duration)
    }
}

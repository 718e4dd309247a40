//! Common utilities and types shared across minits

pub mod config;
pub mod error;
pub mod hash;
pub mod identity;
pub mod metrics;
pub mod tracing_middleware;
pub mod utils;

pub use config::{Config, DatabaseConfig, PeerConfig, StorageConfig};
pub use error::{Error, Result};
pub use hash::{hrw_hash, select_replicas, series_hash, shard_index};
pub use identity::IdentityMap;
pub use metrics::{Counter, Histogram, WriteMetrics};
pub use utils::{format_timestamp, parse_duration, parse_size, timestamp_now_nanos};

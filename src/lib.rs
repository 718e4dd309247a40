//! # minits
//!
//! The write path of a clustered time-series database:
//! - Shard mapping: points → shard groups (by time window) → shards (by series)
//! - Replica fan-out: every shard batch goes to all of its owners concurrently
//! - Tunable consistency: `any`, `one`, `quorum` or `all` acknowledgements per shard
//! - RocksDB-backed metadata for databases, retention policies and shard groups
//!
//! ## Architecture

#![allow(clippy::result_large_err)]
//!
//! ```text
//!            POST /write
//!                 │
//!        ┌────────▼─────────┐      ┌──────────────────┐
//!        │   Coordinator    │─────▶│  MetadataStore   │
//!        │  (map + fan-out) │      │ (shard groups)   │
//!        └──┬─────────┬─────┘      └──────────────────┘
//!    local  │         │  HTTP
//!   ┌───────▼──┐   ┌──▼──────────────────────┐
//!   │ MemShard │   │ peer /internal/shards/:id│
//!   │  Store   │   └──────────────────────────┘
//!   └──────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start a data node
//! ```bash
//! minits-node serve \
//!   --id 1 \
//!   --bind 0.0.0.0:8086 \
//!   --meta-dir ./meta \
//!   --peer 1=http://localhost:8086 \
//!   --peer 2=http://localhost:8087
//! ```
//!
//! ### Use the CLI
//! ```bash
//! minits write cpu 0.64 --db telegraf --tag host=server01 --consistency quorum
//! minits status
//! ```

pub mod common;
pub mod coordinator;
pub mod storage;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use coordinator::{ConsistencyLevel, Coordinator, DataNode, Point, WriteRequest};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");

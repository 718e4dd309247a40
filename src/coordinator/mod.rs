//! Write coordinator
//!
//! The coordinator is responsible for:
//! - Mapping points onto shards (shard groups by time, shards by series)
//! - Fanning each shard's batch out to its owner nodes
//! - Evaluating per-shard consistency and reporting one result
//!
//! Metadata (databases, policies, shard groups, nodes) lives in RocksDB.

pub mod consistency;
pub mod fanout;
pub mod http;
pub mod mapping;
pub mod metadata;
pub mod points;
pub mod server;
pub mod shard_writer;
pub mod writer;

pub use consistency::ConsistencyLevel;
pub use mapping::{ShardBucket, ShardMapping};
pub use metadata::{MetadataStore, ShardGroupDirectory};
pub use points::{FieldValue, Point, WriteRequest};
pub use server::DataNode;
pub use writer::Coordinator;

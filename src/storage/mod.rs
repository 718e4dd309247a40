//! Local shard storage
//!
//! The coordinator only needs to hand a batch of points to the shard it
//! belongs to; how the engine stores them is behind `ShardStore`.

pub mod memory;

pub use memory::MemShardStore;

use crate::common::Result;
use crate::coordinator::points::Point;

/// Accepts point batches for shards hosted on this node
pub trait ShardStore: Send + Sync {
    /// Apply a batch to a local shard, creating the shard on first write
    fn write_to_shard(&self, shard_id: u64, points: &[Point]) -> Result<()>;
}

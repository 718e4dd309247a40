//! In-memory shard store
//!
//! Points are kept per shard and per series, ordered by time. Series keys are
//! interned through an `IdentityMap` shared by every shard on the node.

use crate::common::{Error, IdentityMap, Result};
use crate::coordinator::points::Point;
use crate::storage::ShardStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

type SeriesPoints = HashMap<u64, Vec<Point>>;

pub struct MemShardStore {
    series: Arc<IdentityMap>,
    shards: RwLock<HashMap<u64, SeriesPoints>>,
    size: AtomicU64,
    max_size: u64,
}

impl MemShardStore {
    /// `max_size` is the cache limit in bytes; 0 disables it
    pub fn new(max_size: u64) -> Self {
        Self::with_series_index(Arc::new(IdentityMap::new()), max_size)
    }

    /// Store interning series keys through a shared map
    pub fn with_series_index(series: Arc<IdentityMap>, max_size: u64) -> Self {
        Self {
            series,
            shards: RwLock::new(HashMap::new()),
            size: AtomicU64::new(0),
            max_size,
        }
    }

    /// Points of one series in a shard, ordered by time
    pub fn points(&self, shard_id: u64, series_key: &str) -> Result<Vec<Point>> {
        let shards = self.shards.read().unwrap_or_else(|e| e.into_inner());
        let shard = shards.get(&shard_id).ok_or(Error::ShardNotFound(shard_id))?;

        Ok(self
            .series
            .lookup(series_key.as_bytes())
            .and_then(|id| shard.get(&id))
            .cloned()
            .unwrap_or_default())
    }

    /// Ids of shards holding data, sorted
    pub fn shard_ids(&self) -> Vec<u64> {
        let shards = self.shards.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<u64> = shards.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of points stored in a shard
    pub fn point_count(&self, shard_id: u64) -> usize {
        let shards = self.shards.read().unwrap_or_else(|e| e.into_inner());
        shards
            .get(&shard_id)
            .map(|s| s.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Number of distinct series seen by this node
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Approximate bytes held
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Relaxed)
    }

    /// Net bytes `points` add to `shard`. A point replacing one at the same
    /// timestamp only adds the size difference; within a batch the last
    /// point per series and timestamp wins.
    fn size_delta(&self, shard: Option<&SeriesPoints>, points: &[Point]) -> i64 {
        let mut latest: HashMap<(String, i64), u64> = HashMap::with_capacity(points.len());
        for point in points {
            latest.insert((point.series_key(), point.time()), point.approx_size() as u64);
        }

        latest
            .into_iter()
            .map(|((key, time), size)| {
                let replaced = shard
                    .zip(self.series.lookup(key.as_bytes()))
                    .and_then(|(shard, id)| shard.get(&id))
                    .and_then(|series| {
                        series
                            .binary_search_by_key(&time, Point::time)
                            .ok()
                            .map(|i| series[i].approx_size() as u64)
                    })
                    .unwrap_or(0);
                size as i64 - replaced as i64
            })
            .sum()
    }
}

impl ShardStore for MemShardStore {
    fn write_to_shard(&self, shard_id: u64, points: &[Point]) -> Result<()> {
        let mut shards = self.shards.write().unwrap_or_else(|e| e.into_inner());

        let delta = self.size_delta(shards.get(&shard_id), points);
        let current = self.size.load(Ordering::Relaxed);
        let projected = current.saturating_add_signed(delta);
        if self.max_size > 0 && projected > self.max_size {
            return Err(Error::CacheFull {
                size: projected,
                limit: self.max_size,
            });
        }

        let shard = shards.entry(shard_id).or_default();
        for point in points {
            let (series_id, _) = self.series.set(point.series_key().as_bytes());
            let series = shard.entry(series_id).or_default();

            // Keep time order; a point at an existing timestamp replaces it
            match series.binary_search_by_key(&point.time(), Point::time) {
                Ok(i) => series[i] = point.clone(),
                Err(i) => series.insert(i, point.clone()),
            }
        }
        // Only changed under the shards write lock
        self.size.store(projected, Ordering::Relaxed);

        tracing::debug!(shard_id, points = points.len(), "Wrote points to local shard");
        Ok(())
    }
}

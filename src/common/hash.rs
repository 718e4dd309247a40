//! Hashing utilities for minits
//!
//! - BLAKE3 for stable series hashing (shard selection inside a group)
//! - HRW (Highest Random Weight) for choosing the owners of a new shard

/// Stable 64-bit hash of a series key.
///
/// Only the first 8 bytes of the BLAKE3 digest are used, which is plenty for
/// spreading series across the handful of shards in a group.
pub fn series_hash(series_key: &str) -> u64 {
    let hash = blake3::hash(series_key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Index of the shard (out of `num_shards`) that holds a series.
///
/// `num_shards` must be non-zero.
pub fn shard_index(series_key: &str, num_shards: usize) -> usize {
    (series_hash(series_key) % num_shards as u64) as usize
}

/// HRW (Highest Random Weight) hashing for replica placement
///
/// Given a key and a set of nodes, returns nodes sorted by their weight
/// (deterministic based on key). This ensures consistent placement even
/// as the cluster changes.
pub fn hrw_hash(key: &str, nodes: &[u64]) -> Vec<u64> {
    let mut weights: Vec<(u64, u64)> = nodes
        .iter()
        .map(|node| {
            let combined = format!("{}/{}", key, node);
            (*node, series_hash(&combined))
        })
        .collect();

    // Sort by weight (descending), node id breaks ties
    weights.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    weights.into_iter().map(|(node, _)| node).collect()
}

/// Select N replicas using HRW hashing
pub fn select_replicas(key: &str, nodes: &[u64], n: usize) -> Vec<u64> {
    hrw_hash(key, nodes).into_iter().take(n).collect()
}

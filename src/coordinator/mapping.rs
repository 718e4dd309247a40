//! Shard mapping: the points of one write request grouped by target shard

use crate::coordinator::metadata::ShardInfo;
use crate::coordinator::points::Point;
use std::collections::BTreeMap;

/// The points routed to one shard
#[derive(Debug, Clone)]
pub struct ShardBucket {
    pub shard: ShardInfo,
    pub points: Vec<Point>,
}

/// Shard id → shard + points. Each input point lands in exactly one bucket,
/// in input order within that bucket.
#[derive(Debug, Clone, Default)]
pub struct ShardMapping {
    buckets: BTreeMap<u64, ShardBucket>,
}

impl ShardMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_point(&mut self, shard: &ShardInfo, point: Point) {
        self.buckets
            .entry(shard.id)
            .or_insert_with(|| ShardBucket {
                shard: shard.clone(),
                points: Vec::new(),
            })
            .points
            .push(point);
    }

    /// Number of distinct shards
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn shard(&self, shard_id: u64) -> Option<&ShardInfo> {
        self.buckets.get(&shard_id).map(|b| &b.shard)
    }

    pub fn points(&self, shard_id: u64) -> Option<&[Point]> {
        self.buckets.get(&shard_id).map(|b| b.points.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShardBucket> {
        self.buckets.values()
    }

    /// Total points across all shards
    pub fn point_count(&self) -> usize {
        self.buckets.values().map(|b| b.points.len()).sum()
    }
}

impl IntoIterator for ShardMapping {
    type Item = ShardBucket;
    type IntoIter = std::collections::btree_map::IntoValues<u64, ShardBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::points::FieldValue;

    fn point(time: i64) -> Point {
        let mut fields = BTreeMap::new();
        fields.insert("value".to_string(), FieldValue::Integer(time));
        Point::new("cpu", BTreeMap::new(), fields, time)
    }

    #[test]
    fn test_points_grouped_in_input_order() {
        let a = ShardInfo { id: 1, owners: vec![1] };
        let b = ShardInfo { id: 2, owners: vec![2] };

        let mut mapping = ShardMapping::new();
        mapping.map_point(&a, point(1));
        mapping.map_point(&b, point(2));
        mapping.map_point(&a, point(3));

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.point_count(), 3);
        let times: Vec<i64> = mapping.points(1).unwrap().iter().map(Point::time).collect();
        assert_eq!(times, vec![1, 3]);
        assert_eq!(mapping.shard(2), Some(&b));
        assert!(mapping.points(3).is_none());
    }
}

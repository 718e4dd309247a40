//! Shard mapping against a real metadata store

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use minits::common::{Error, WriteMetrics};
use minits::coordinator::fanout::ReplicaWriter;
use minits::coordinator::metadata::{
    MetadataStore, NodeInfo, RetentionPolicyInfo, ShardGroupDirectory,
};
use minits::coordinator::shard_writer::{HttpTransport, LocalShardWriter, RemoteShardWriter};
use minits::coordinator::{ConsistencyLevel, Coordinator, WriteRequest};
use minits::storage::MemShardStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Cluster {
    _dir: TempDir,
    metadata: Arc<MetadataStore>,
    store: Arc<MemShardStore>,
    coordinator: Coordinator,
}

fn cluster(nodes: u64, replica_n: usize) -> Cluster {
    let dir = TempDir::new().unwrap();
    let metadata = Arc::new(MetadataStore::open(dir.path().join("meta")).unwrap());
    for id in 1..=nodes {
        metadata
            .register_node(&NodeInfo {
                id,
                address: format!("http://127.0.0.1:{}", 18000 + id),
            })
            .unwrap();
    }
    metadata.create_database("mydb").unwrap();
    metadata
        .create_retention_policy(
            "mydb",
            RetentionPolicyInfo::new("myrp", replica_n, Duration::ZERO, Duration::from_secs(3600)),
            true,
        )
        .unwrap();

    let store = Arc::new(MemShardStore::new(0));
    let metrics = Arc::new(WriteMetrics::new());
    let transport = HttpTransport::new(HashMap::new(), Duration::from_secs(1)).unwrap();
    let replicas = ReplicaWriter::new(
        1,
        LocalShardWriter::new(store.clone()),
        RemoteShardWriter::new(Arc::new(transport)),
        metrics.clone(),
    );
    let coordinator = Coordinator::new(metadata.clone(), replicas, Duration::from_secs(5), metrics);

    Cluster {
        _dir: dir,
        metadata,
        store,
        coordinator,
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(0, 0).unwrap()
}

#[test]
fn test_single_point_single_bucket() {
    let c = cluster(1, 1);
    let mut req = WriteRequest::new("mydb", "myrp", ConsistencyLevel::One);
    req.add_point("cpu", 1.0, epoch(), &[("host", "server01")]);

    let mapping = c.coordinator.map_shards(&req).unwrap();
    assert_eq!(mapping.len(), 1);

    let bucket = mapping.iter().next().unwrap();
    assert_eq!(bucket.points, req.points);
    assert_eq!(bucket.shard.owners, vec![1]);
}

#[test]
fn test_points_split_by_shard_group_window() {
    let c = cluster(1, 1);
    let mut req = WriteRequest::new("mydb", "myrp", ConsistencyLevel::One);
    let t0 = epoch();
    req.add_point("cpu", 1.0, t0, &[]);
    req.add_point("cpu", 2.0, t0 + ChronoDuration::hours(1), &[]);
    req.add_point(
        "cpu",
        3.0,
        t0 + ChronoDuration::hours(1) + ChronoDuration::seconds(1),
        &[],
    );

    let mapping = c.coordinator.map_shards(&req).unwrap();
    assert_eq!(mapping.len(), 2);

    let mut buckets: Vec<Vec<i64>> = mapping
        .iter()
        .map(|b| b.points.iter().map(|p| p.time()).collect())
        .collect();
    buckets.sort();

    let hour = 3_600_000_000_000i64;
    assert_eq!(buckets, vec![vec![0], vec![hour, hour + 1_000_000_000]]);
}

#[test]
fn test_multi_window_batch_partitions_points() {
    let c = cluster(4, 2);
    let mut req = WriteRequest::new("mydb", "", ConsistencyLevel::Quorum);
    let hosts = ["a", "b", "c", "d", "e", "f"];
    for i in 0..60i64 {
        let host = hosts[(i % hosts.len() as i64) as usize];
        req.add_point(
            "cpu",
            i,
            epoch() + ChronoDuration::minutes(i * 7),
            &[("host", host)],
        );
    }

    let mapping = c.coordinator.map_shards(&req).unwrap();
    assert_eq!(mapping.point_count(), req.len());

    let rp = c
        .metadata
        .database("mydb")
        .unwrap()
        .unwrap()
        .retention_policies
        .remove(0);
    let windows: HashSet<i64> = req
        .points
        .iter()
        .map(|p| p.time().div_euclid(3_600_000_000_000))
        .collect();
    assert_eq!(rp.shard_groups.len(), windows.len());

    for bucket in mapping.iter() {
        let group = rp
            .shard_groups
            .iter()
            .find(|g| g.shards.iter().any(|s| s.id == bucket.shard.id))
            .expect("bucket shard belongs to a group");
        assert_eq!(bucket.shard.owners.len(), 2);
        for point in &bucket.points {
            assert!(group.contains(point.time()));
            assert_eq!(group.shard_for(&point.series_key()), Some(&bucket.shard));
        }
    }
}

#[test]
fn test_missing_database_or_policy() {
    let c = cluster(1, 1);

    let mut req = WriteRequest::new("nodb", "", ConsistencyLevel::One);
    req.add_point("cpu", 1.0, epoch(), &[]);
    assert!(matches!(
        c.coordinator.map_shards(&req),
        Err(Error::RetentionPolicyNotFound { .. })
    ));

    let mut req = WriteRequest::new("mydb", "nope", ConsistencyLevel::One);
    req.add_point("cpu", 1.0, epoch(), &[]);
    assert!(matches!(
        c.coordinator.map_shards(&req),
        Err(Error::RetentionPolicyNotFound { .. })
    ));
}

#[tokio::test]
async fn test_local_write_end_to_end() {
    let c = cluster(1, 1);
    let mut req = WriteRequest::new("mydb", "myrp", ConsistencyLevel::All);
    req.add_point("cpu", 0.5, epoch(), &[("host", "server01")]);
    req.add_point("cpu", 0.7, epoch() + ChronoDuration::seconds(10), &[("host", "server01")]);

    c.coordinator.write(&req).await.unwrap();

    let shard_ids = c.store.shard_ids();
    assert_eq!(shard_ids.len(), 1);
    let points = c.store.points(shard_ids[0], "cpu,host=server01").unwrap();
    assert_eq!(points.len(), 2);
}

#[test]
fn test_clamped_timestamps_at_range_ends() {
    let c = cluster(1, 1);

    // Year 1500 clamps to i64::MIN and still gets a covering group
    let ancient = DateTime::parse_from_rfc3339("1500-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let mut req = WriteRequest::new("mydb", "myrp", ConsistencyLevel::One);
    req.add_point("cpu", 1.0, ancient, &[]);
    assert_eq!(req.points[0].time(), i64::MIN);

    let mapping = c.coordinator.map_shards(&req).unwrap();
    assert_eq!(mapping.len(), 1);
    let group = c
        .metadata
        .shard_group_by_timestamp("mydb", "myrp", i64::MIN)
        .unwrap()
        .unwrap();
    assert!(group.contains(i64::MIN));

    // Year 2300 clamps to i64::MAX, which no group can cover
    let distant = DateTime::parse_from_rfc3339("2300-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let mut req = WriteRequest::new("mydb", "myrp", ConsistencyLevel::One);
    req.add_point("cpu", 1.0, distant, &[]);
    assert!(matches!(
        c.coordinator.map_shards(&req),
        Err(Error::InvalidRequest(_))
    ));

    let rp = c.metadata.retention_policy("mydb", "myrp").unwrap().unwrap();
    assert_eq!(rp.shard_groups.len(), 1);
}

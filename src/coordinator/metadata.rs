//! Cluster metadata store using RocksDB
//!
//! Stores:
//! - Databases, their retention policies and shard groups
//! - Data node registry (node_id → address)
//! - Id allocation counter
//!
//! The write path only needs the `ShardGroupDirectory` view of it.

use crate::common::utils::duration_nanos;
use crate::common::{format_timestamp, select_replicas, shard_index, timestamp_now_nanos};
use crate::common::{DatabaseConfig, Error, Result};
use rocksdb::{Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const CF_DATABASES: &str = "databases";
const CF_NODES: &str = "nodes";
const CF_CONFIG: &str = "config";

const KEY_NEXT_ID: &[u8] = b"next_id";

/// A data node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: u64,
    pub address: String,
}

/// A shard and the nodes replicating it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInfo {
    pub id: u64,
    /// Never empty, fixed for the lifetime of the shard
    pub owners: Vec<u64>,
}

impl ShardInfo {
    pub fn owned_by(&self, node_id: u64) -> bool {
        self.owners.contains(&node_id)
    }
}

/// The shards covering `[start_time, end_time)` of one retention policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardGroupInfo {
    pub id: u64,
    pub start_time: i64,
    pub end_time: i64,
    /// Set when the group was deleted; deleted groups cover nothing
    pub deleted_at: Option<i64>,
    pub shards: Vec<ShardInfo>,
}

impl ShardGroupInfo {
    pub fn contains(&self, timestamp: i64) -> bool {
        self.start_time <= timestamp && timestamp < self.end_time
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The shard holding a series within this group
    pub fn shard_for(&self, series_key: &str) -> Option<&ShardInfo> {
        if self.shards.is_empty() {
            return None;
        }
        self.shards.get(shard_index(series_key, self.shards.len()))
    }
}

/// Retention policy metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicyInfo {
    pub name: String,
    pub replica_n: usize,
    /// Zero keeps data forever
    pub duration: Duration,
    pub shard_group_duration: Duration,
    /// Ordered by start time
    pub shard_groups: Vec<ShardGroupInfo>,
}

impl RetentionPolicyInfo {
    pub fn new(
        name: impl Into<String>,
        replica_n: usize,
        duration: Duration,
        shard_group_duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            replica_n: replica_n.max(1),
            duration,
            shard_group_duration,
            shard_groups: Vec::new(),
        }
    }

    /// The live group covering `timestamp`
    pub fn shard_group_by_timestamp(&self, timestamp: i64) -> Option<&ShardGroupInfo> {
        self.shard_groups
            .iter()
            .find(|g| !g.is_deleted() && g.contains(timestamp))
    }

    /// Window for a new group holding `timestamp`: aligned to the shard group
    /// duration, then clipped so it never overlaps a live neighbour. Windows
    /// are cut at the ends of the i64 range; `i64::MAX` itself can never be
    /// covered since window ends are exclusive.
    pub fn shard_group_window(&self, timestamp: i64) -> Result<(i64, i64)> {
        let width = duration_nanos(self.shard_group_duration).max(1);
        let offset = timestamp.rem_euclid(width);
        let mut start = timestamp.checked_sub(offset).unwrap_or(i64::MIN);
        let mut end = timestamp.checked_add(width - offset).unwrap_or(i64::MAX);

        for group in self.shard_groups.iter().filter(|g| !g.is_deleted()) {
            if group.end_time <= timestamp && group.end_time > start {
                start = group.end_time;
            }
            if group.start_time > timestamp && group.start_time < end {
                end = group.start_time;
            }
        }

        if !(start <= timestamp && timestamp < end) {
            return Err(Error::InvalidRequest(format!(
                "timestamp {} cannot be covered by a shard group",
                timestamp
            )));
        }
        Ok((start, end))
    }
}

/// Database metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub name: String,
    pub default_retention_policy: String,
    pub retention_policies: Vec<RetentionPolicyInfo>,
}

impl DatabaseInfo {
    /// Policy by name; an empty name selects the default policy
    pub fn retention_policy(&self, name: &str) -> Option<&RetentionPolicyInfo> {
        let name = self.resolve_policy_name(name);
        self.retention_policies.iter().find(|rp| rp.name == name)
    }

    fn retention_policy_mut(&mut self, name: &str) -> Option<&mut RetentionPolicyInfo> {
        let name = self.resolve_policy_name(name).to_string();
        self.retention_policies.iter_mut().find(|rp| rp.name == name)
    }

    fn resolve_policy_name<'a>(&'a self, name: &'a str) -> &'a str {
        if name.is_empty() {
            &self.default_retention_policy
        } else {
            name
        }
    }
}

/// Lookup and on-demand creation of shard groups, as consumed by the
/// coordinator's shard mapper.
pub trait ShardGroupDirectory: Send + Sync {
    /// Policy metadata; `Ok(None)` when the database or policy does not exist.
    /// An empty policy name selects the database's default policy.
    fn retention_policy(&self, database: &str, policy: &str)
        -> Result<Option<RetentionPolicyInfo>>;

    /// The live group covering `timestamp`, created if none exists.
    /// Idempotent: concurrent callers for one window get the same group.
    fn create_shard_group_if_not_exists(
        &self,
        database: &str,
        policy: &str,
        timestamp: i64,
    ) -> Result<ShardGroupInfo>;
}

/// Metadata store
pub struct MetadataStore {
    db: DB,
    /// Serializes read-modify-write cycles so creators see a single winner
    write_lock: Mutex<()>,
}

impl MetadataStore {
    /// Open or create metadata store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, path, vec![CF_DATABASES, CF_NODES, CF_CONFIG])?;

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::MetadataCorrupted(format!("missing column family {}", name)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Database operations ===

    /// Get database metadata
    pub fn database(&self, name: &str) -> Result<Option<DatabaseInfo>> {
        match self.db.get_cf(self.cf(CF_DATABASES)?, name.as_bytes())? {
            Some(bytes) => {
                let info: DatabaseInfo = bincode::deserialize(&bytes)
                    .map_err(|e| Error::MetadataCorrupted(e.to_string()))?;
                Ok(Some(info))
            }
            None => Ok(None),
        }
    }

    /// List all databases
    pub fn databases(&self) -> Result<Vec<DatabaseInfo>> {
        let iter = self
            .db
            .iterator_cf(self.cf(CF_DATABASES)?, rocksdb::IteratorMode::Start);

        let mut databases = Vec::new();
        for item in iter {
            let (_, value) = item?;
            let info: DatabaseInfo = bincode::deserialize(&value)
                .map_err(|e| Error::MetadataCorrupted(e.to_string()))?;
            databases.push(info);
        }
        Ok(databases)
    }

    fn put_database(&self, batch: &mut WriteBatch, info: &DatabaseInfo) -> Result<()> {
        let value = bincode::serialize(info)
            .map_err(|e| Error::Internal(format!("Serialize error: {}", e)))?;
        batch.put_cf(self.cf(CF_DATABASES)?, info.name.as_bytes(), value);
        Ok(())
    }

    /// Create a database without policies; returns the existing one if present
    pub fn create_database(&self, name: &str) -> Result<DatabaseInfo> {
        if name.is_empty() {
            return Err(Error::InvalidRequest("database name cannot be empty".into()));
        }

        let _guard = self.lock();
        if let Some(existing) = self.database(name)? {
            return Ok(existing);
        }

        let info = DatabaseInfo {
            name: name.to_string(),
            default_retention_policy: String::new(),
            retention_policies: Vec::new(),
        };
        let mut batch = WriteBatch::default();
        self.put_database(&mut batch, &info)?;
        self.db.write(batch)?;

        tracing::info!(database = %name, "Created database");
        Ok(info)
    }

    /// Add a retention policy to a database. The first policy of a database
    /// (or any policy with `make_default`) becomes its default. Creating a
    /// policy that already exists returns the stored one.
    pub fn create_retention_policy(
        &self,
        database: &str,
        policy: RetentionPolicyInfo,
        make_default: bool,
    ) -> Result<RetentionPolicyInfo> {
        if policy.name.is_empty() {
            return Err(Error::InvalidRequest("retention policy name cannot be empty".into()));
        }
        if policy.shard_group_duration.is_zero() {
            return Err(Error::InvalidRequest(
                "shard group duration must be greater than zero".into(),
            ));
        }

        let _guard = self.lock();
        let mut info = self
            .database(database)?
            .ok_or_else(|| Error::DatabaseNotFound(database.to_string()))?;

        if let Some(existing) = info.retention_policy(&policy.name) {
            return Ok(existing.clone());
        }

        if make_default || info.retention_policies.is_empty() {
            info.default_retention_policy = policy.name.clone();
        }
        info.retention_policies.push(policy.clone());

        let mut batch = WriteBatch::default();
        self.put_database(&mut batch, &info)?;
        self.db.write(batch)?;

        tracing::info!(
            database = %database,
            policy = %policy.name,
            replica_n = policy.replica_n,
            shard_group_duration = ?policy.shard_group_duration,
            "Created retention policy"
        );
        Ok(policy)
    }

    /// Create the database and policy described by `config` if missing,
    /// making that policy the database default.
    pub fn ensure_database(&self, config: &DatabaseConfig) -> Result<DatabaseInfo> {
        config.validate()?;

        self.create_database(&config.name)?;
        let policy = RetentionPolicyInfo::new(
            config.retention_policy.clone(),
            config.replica_n,
            config.duration()?,
            config.shard_group_duration()?,
        );
        self.create_retention_policy(&config.name, policy, true)?;

        self.database(&config.name)?
            .ok_or_else(|| Error::DatabaseNotFound(config.name.clone()))
    }

    // === Node operations ===

    /// Register or update a data node
    pub fn register_node(&self, node: &NodeInfo) -> Result<()> {
        let value = bincode::serialize(node)
            .map_err(|e| Error::Internal(format!("Serialize error: {}", e)))?;
        self.db
            .put_cf(self.cf(CF_NODES)?, node.id.to_be_bytes(), value)?;
        Ok(())
    }

    /// Get a data node
    pub fn node(&self, id: u64) -> Result<Option<NodeInfo>> {
        match self.db.get_cf(self.cf(CF_NODES)?, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes).map_err(|e| Error::MetadataCorrupted(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// List data nodes, ordered by id
    pub fn nodes(&self) -> Result<Vec<NodeInfo>> {
        let iter = self
            .db
            .iterator_cf(self.cf(CF_NODES)?, rocksdb::IteratorMode::Start);

        let mut nodes = Vec::new();
        for item in iter {
            let (_, value) = item?;
            let node: NodeInfo = bincode::deserialize(&value)
                .map_err(|e| Error::MetadataCorrupted(e.to_string()))?;
            nodes.push(node);
        }
        Ok(nodes)
    }

    // === Shard group operations ===

    /// The live group covering `timestamp`, without creating one
    pub fn shard_group_by_timestamp(
        &self,
        database: &str,
        policy: &str,
        timestamp: i64,
    ) -> Result<Option<ShardGroupInfo>> {
        Ok(self
            .retention_policy(database, policy)?
            .and_then(|rp| rp.shard_group_by_timestamp(timestamp).cloned()))
    }

    /// Mark a shard group deleted. Deleted groups stay listed but no longer
    /// cover any timestamp, so a later write into their window creates a
    /// fresh group.
    pub fn delete_shard_group(&self, database: &str, policy: &str, group_id: u64) -> Result<()> {
        let _guard = self.lock();
        let mut info = self
            .database(database)?
            .ok_or_else(|| Error::DatabaseNotFound(database.to_string()))?;
        let rp = info
            .retention_policy_mut(policy)
            .ok_or_else(|| Error::RetentionPolicyNotFound {
                database: database.to_string(),
                policy: policy.to_string(),
            })?;

        let group = rp
            .shard_groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| Error::Other(format!("shard group {} not found", group_id)))?;
        if group.deleted_at.is_none() {
            group.deleted_at = Some(timestamp_now_nanos());
        }

        let mut batch = WriteBatch::default();
        self.put_database(&mut batch, &info)?;
        self.db.write(batch)?;

        tracing::info!(database = %database, policy = %policy, group_id, "Deleted shard group");
        Ok(())
    }

    fn next_id(&self) -> Result<u64> {
        match self.db.get_cf(self.cf(CF_CONFIG)?, KEY_NEXT_ID)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::MetadataCorrupted("invalid id counter".into()))?;
                Ok(u64::from_le_bytes(raw))
            }
            None => Ok(1),
        }
    }

    /// Flush to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl ShardGroupDirectory for MetadataStore {
    fn retention_policy(
        &self,
        database: &str,
        policy: &str,
    ) -> Result<Option<RetentionPolicyInfo>> {
        Ok(self
            .database(database)?
            .and_then(|db| db.retention_policy(policy).cloned()))
    }

    fn create_shard_group_if_not_exists(
        &self,
        database: &str,
        policy: &str,
        timestamp: i64,
    ) -> Result<ShardGroupInfo> {
        // Fast path without the lock
        if let Some(group) = self.shard_group_by_timestamp(database, policy, timestamp)? {
            return Ok(group);
        }

        let _guard = self.lock();
        let mut info = self
            .database(database)?
            .ok_or_else(|| Error::DatabaseNotFound(database.to_string()))?;
        let rp = info
            .retention_policy_mut(policy)
            .ok_or_else(|| Error::RetentionPolicyNotFound {
                database: database.to_string(),
                policy: policy.to_string(),
            })?;

        // Re-check under the lock: another caller may have created it
        if let Some(group) = rp.shard_group_by_timestamp(timestamp) {
            return Ok(group.clone());
        }

        let node_ids: Vec<u64> = self.nodes()?.into_iter().map(|n| n.id).collect();
        if node_ids.is_empty() {
            return Err(Error::ShardGroupUnavailable(
                "no data nodes registered".into(),
            ));
        }

        let (start_time, end_time) = rp.shard_group_window(timestamp)?;
        let replica_n = rp.replica_n.clamp(1, node_ids.len());
        let shard_n = (node_ids.len() / replica_n).max(1);

        let mut next_id = self.next_id()?;
        let group_id = next_id;
        next_id += 1;

        let mut shards = Vec::with_capacity(shard_n);
        for i in 0..shard_n {
            let owners = select_replicas(&format!("{}/{}", group_id, i), &node_ids, replica_n);
            shards.push(ShardInfo { id: next_id, owners });
            next_id += 1;
        }

        let group = ShardGroupInfo {
            id: group_id,
            start_time,
            end_time,
            deleted_at: None,
            shards,
        };
        if !group.contains(timestamp) {
            return Err(Error::MetadataCorrupted(format!(
                "new shard group [{}, {}) does not cover timestamp {}",
                start_time, end_time, timestamp
            )));
        }
        rp.shard_groups.push(group.clone());
        rp.shard_groups.sort_by_key(|g| g.start_time);

        let mut batch = WriteBatch::default();
        self.put_database(&mut batch, &info)?;
        batch.put_cf(self.cf(CF_CONFIG)?, KEY_NEXT_ID, next_id.to_le_bytes());
        self.db.write(batch)?;

        tracing::info!(
            database = %database,
            policy = %policy,
            group_id,
            start = %format_timestamp(start_time),
            end = %format_timestamp(end_time),
            shards = shard_n,
            "Created shard group"
        );
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HOUR: i64 = 3600 * 1_000_000_000;

    fn hourly_policy() -> RetentionPolicyInfo {
        RetentionPolicyInfo::new("rp0", 1, Duration::ZERO, Duration::from_secs(3600))
    }

    fn group(id: u64, start: i64, end: i64) -> ShardGroupInfo {
        ShardGroupInfo {
            id,
            start_time: start,
            end_time: end,
            deleted_at: None,
            shards: vec![ShardInfo {
                id: id * 10,
                owners: vec![1],
            }],
        }
    }

    #[test]
    fn test_window_alignment() {
        let rp = hourly_policy();
        assert_eq!(rp.shard_group_window(0).unwrap(), (0, HOUR));
        assert_eq!(rp.shard_group_window(HOUR + 1).unwrap(), (HOUR, 2 * HOUR));
        // Negative timestamps align downwards
        assert_eq!(rp.shard_group_window(-1).unwrap(), (-HOUR, 0));
    }

    #[test]
    fn test_window_at_range_ends() {
        let rp = hourly_policy();

        // The aligned start lies below i64::MIN and is cut there
        let (start, end) = rp.shard_group_window(i64::MIN).unwrap();
        assert_eq!(start, i64::MIN);
        assert!(end > i64::MIN && end - i64::MIN <= HOUR);
        assert_eq!(rp.shard_group_window(i64::MIN + 1).unwrap(), (start, end));

        // The last aligned window is cut at i64::MAX, which stays uncovered
        let (start, end) = rp.shard_group_window(i64::MAX - 1).unwrap();
        assert_eq!(end, i64::MAX);
        assert!(start <= i64::MAX - 1);
        assert!(matches!(
            rp.shard_group_window(i64::MAX),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_window_clipped_by_neighbours() {
        let mut rp = hourly_policy();
        // Existing groups end mid-hour and start mid-hour
        rp.shard_groups.push(group(1, -HOUR, HOUR / 4));
        rp.shard_groups.push(group(2, 3 * HOUR / 4, 2 * HOUR));

        let (start, end) = rp.shard_group_window(HOUR / 2).unwrap();
        assert_eq!((start, end), (HOUR / 4, 3 * HOUR / 4));

        // Deleted neighbours do not clip
        rp.shard_groups[1].deleted_at = Some(1);
        assert_eq!(rp.shard_group_window(HOUR / 2).unwrap(), (HOUR / 4, HOUR));
    }

    #[test]
    fn test_shard_group_lookup_skips_deleted() {
        let mut rp = hourly_policy();
        rp.shard_groups.push(group(1, 0, HOUR));
        assert_eq!(rp.shard_group_by_timestamp(10).map(|g| g.id), Some(1));
        assert!(rp.shard_group_by_timestamp(HOUR).is_none());

        rp.shard_groups[0].deleted_at = Some(5);
        assert!(rp.shard_group_by_timestamp(10).is_none());
    }

    #[test]
    fn test_database_and_policy() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::open(dir.path().join("meta")).unwrap();

        store.create_database("db0").unwrap();
        store
            .create_retention_policy("db0", hourly_policy(), false)
            .unwrap();

        let db = store.database("db0").unwrap().unwrap();
        assert_eq!(db.default_retention_policy, "rp0");

        // Empty name resolves to the default policy
        let rp = store.retention_policy("db0", "").unwrap().unwrap();
        assert_eq!(rp.name, "rp0");
        assert!(store.retention_policy("db0", "missing").unwrap().is_none());
        assert!(store.retention_policy("nodb", "rp0").unwrap().is_none());

        let err = store
            .create_retention_policy("nodb", hourly_policy(), false)
            .unwrap_err();
        assert!(matches!(err, Error::DatabaseNotFound(_)));
    }

    #[test]
    fn test_create_shard_group() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::open(dir.path().join("meta")).unwrap();
        store.create_database("db0").unwrap();
        store
            .create_retention_policy(
                "db0",
                RetentionPolicyInfo::new("rp0", 2, Duration::ZERO, Duration::from_secs(3600)),
                true,
            )
            .unwrap();

        // No nodes yet
        let err = store
            .create_shard_group_if_not_exists("db0", "rp0", 0)
            .unwrap_err();
        assert!(matches!(err, Error::ShardGroupUnavailable(_)));

        for id in 1..=4 {
            store
                .register_node(&NodeInfo {
                    id,
                    address: format!("http://node{}:8086", id),
                })
                .unwrap();
        }

        let group = store
            .create_shard_group_if_not_exists("db0", "rp0", HOUR + 5)
            .unwrap();
        assert_eq!((group.start_time, group.end_time), (HOUR, 2 * HOUR));
        // 4 nodes / replica_n 2 → 2 shards of 2 owners
        assert_eq!(group.shards.len(), 2);
        for shard in &group.shards {
            assert_eq!(shard.owners.len(), 2);
            assert_ne!(shard.owners[0], shard.owners[1]);
        }

        let again = store
            .create_shard_group_if_not_exists("db0", "rp0", 2 * HOUR - 1)
            .unwrap();
        assert_eq!(again, group);

        let next = store
            .create_shard_group_if_not_exists("db0", "rp0", 2 * HOUR)
            .unwrap();
        assert_ne!(next.id, group.id);
        assert!(next.shards.iter().all(|s| group.shards.iter().all(|g| g.id != s.id)));
    }

    #[test]
    fn test_shard_groups_at_range_ends() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::open(dir.path().join("meta")).unwrap();
        store.create_database("db0").unwrap();
        store
            .create_retention_policy("db0", hourly_policy(), true)
            .unwrap();
        store
            .register_node(&NodeInfo {
                id: 1,
                address: "http://localhost:8086".into(),
            })
            .unwrap();

        let low = store
            .create_shard_group_if_not_exists("db0", "rp0", i64::MIN)
            .unwrap();
        assert!(low.contains(i64::MIN));
        assert_eq!(low.start_time, i64::MIN);

        let err = store
            .create_shard_group_if_not_exists("db0", "rp0", i64::MAX)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        // Nothing was persisted for the rejected timestamp
        let rp = store.retention_policy("db0", "rp0").unwrap().unwrap();
        assert_eq!(rp.shard_groups.len(), 1);
        assert_eq!(rp.shard_groups[0].id, low.id);
    }

    #[test]
    fn test_delete_shard_group() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::open(dir.path().join("meta")).unwrap();
        store.create_database("db0").unwrap();
        store
            .create_retention_policy("db0", hourly_policy(), true)
            .unwrap();
        store
            .register_node(&NodeInfo {
                id: 1,
                address: "http://localhost:8086".into(),
            })
            .unwrap();

        let group = store.create_shard_group_if_not_exists("db0", "rp0", 0).unwrap();
        store.delete_shard_group("db0", "rp0", group.id).unwrap();
        assert!(store.shard_group_by_timestamp("db0", "rp0", 0).unwrap().is_none());

        let fresh = store.create_shard_group_if_not_exists("db0", "rp0", 0).unwrap();
        assert_ne!(fresh.id, group.id);
        assert!(store.delete_shard_group("db0", "rp0", 9999).is_err());
    }

    #[test]
    fn test_reopen_keeps_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta");
        let group = {
            let store = MetadataStore::open(&path).unwrap();
            store.create_database("db0").unwrap();
            store
                .create_retention_policy("db0", hourly_policy(), true)
                .unwrap();
            store
                .register_node(&NodeInfo {
                    id: 7,
                    address: "http://localhost:8086".into(),
                })
                .unwrap();
            let group = store.create_shard_group_if_not_exists("db0", "", 0).unwrap();
            store.flush().unwrap();
            group
        };

        let store = MetadataStore::open(&path).unwrap();
        assert_eq!(store.nodes().unwrap().len(), 1);
        assert_eq!(store.node(7).unwrap().unwrap().address, "http://localhost:8086");
        assert_eq!(
            store.shard_group_by_timestamp("db0", "rp0", 0).unwrap(),
            Some(group)
        );
    }
}

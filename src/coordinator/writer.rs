//! Points writer: maps a write request onto shards, fans every shard out to
//! its owners and reduces the per-shard outcomes to one result.

use crate::common::{Error, Result, WriteMetrics};
use crate::coordinator::consistency::ConsistencyLevel;
use crate::coordinator::fanout::{ReplicaWriter, ShardOutcome};
use crate::coordinator::mapping::ShardMapping;
use crate::coordinator::metadata::{ShardGroupDirectory, ShardGroupInfo};
use crate::coordinator::points::WriteRequest;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, warn};

pub struct Coordinator {
    directory: Arc<dyn ShardGroupDirectory>,
    replicas: Arc<ReplicaWriter>,
    write_timeout: Duration,
    metrics: Arc<WriteMetrics>,
}

impl Coordinator {
    pub fn new(
        directory: Arc<dyn ShardGroupDirectory>,
        replicas: ReplicaWriter,
        write_timeout: Duration,
        metrics: Arc<WriteMetrics>,
    ) -> Self {
        Self {
            directory,
            replicas: Arc::new(replicas),
            write_timeout,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<WriteMetrics> {
        &self.metrics
    }

    /// Group the request's points by destination shard, creating shard
    /// groups for uncovered time windows on the way. Nothing is written.
    pub fn map_shards(&self, req: &WriteRequest) -> Result<ShardMapping> {
        let not_found = || Error::RetentionPolicyNotFound {
            database: req.database.clone(),
            policy: req.retention_policy.clone(),
        };

        let rp = self
            .directory
            .retention_policy(&req.database, &req.retention_policy)
            .map_err(|e| match e {
                e @ Error::RetentionPolicyNotFound { .. } => e,
                e => Error::ShardGroupUnavailable(e.to_string()),
            })?
            .ok_or_else(not_found)?;

        // Groups resolved so far in this call
        let mut groups: Vec<ShardGroupInfo> = Vec::new();
        let mut mapping = ShardMapping::new();

        for point in &req.points {
            let ts = point.time();
            let idx = match groups.iter().position(|g| g.contains(ts)) {
                Some(idx) => idx,
                None => {
                    let group = self
                        .directory
                        .create_shard_group_if_not_exists(&req.database, &rp.name, ts)
                        .map_err(|e| match e {
                            e @ (Error::RetentionPolicyNotFound { .. }
                            | Error::ShardGroupUnavailable(_)
                            | Error::InvalidRequest(_)) => e,
                            e => Error::ShardGroupUnavailable(e.to_string()),
                        })?;
                    if !group.contains(ts) {
                        return Err(Error::ShardGroupUnavailable(format!(
                            "shard group {} does not cover timestamp {}",
                            group.id, ts
                        )));
                    }
                    groups.push(group);
                    groups.len() - 1
                }
            };

            let shard = groups[idx].shard_for(&point.series_key()).ok_or_else(|| {
                Error::ShardGroupUnavailable(format!("shard group {} has no shards", groups[idx].id))
            })?;
            mapping.map_point(shard, point.clone());
        }

        debug!(
            database = %req.database,
            policy = %rp.name,
            points = req.points.len(),
            shards = mapping.len(),
            "Mapped write request"
        );
        Ok(mapping)
    }

    /// Write a batch with its requested consistency. Succeeds only if every
    /// touched shard met the level; otherwise `WriteFailed` wrapping the
    /// first unsatisfied shard's last owner error.
    pub async fn write(&self, req: &WriteRequest) -> Result<()> {
        let start = Instant::now();
        self.metrics.write_requests.inc();
        self.metrics.point_requests.add(req.points.len() as u64);

        let res = match self.map_shards(req) {
            Ok(mapping) => self.write_mapping(mapping, req.consistency).await,
            Err(e) => Err(e),
        };

        self.metrics.record_write(start.elapsed(), res.is_ok());
        res
    }

    /// Fan an already computed mapping out to the owners of every shard
    pub async fn write_mapping(&self, mapping: ShardMapping, level: ConsistencyLevel) -> Result<()> {
        if mapping.is_empty() {
            return Ok(());
        }

        let deadline = tokio::time::Instant::now() + self.write_timeout;
        let mut shards = JoinSet::new();
        for bucket in mapping {
            let replicas = self.replicas.clone();
            let points = Arc::new(bucket.points);
            let shard = bucket.shard;
            debug!(shard_id = shard.id, owners = ?shard.owners, points = points.len(), "Dispatching shard write");
            shards.spawn(async move {
                replicas
                    .write_shard(shard.id, &shard.owners, points, deadline)
                    .await
            });
        }

        let mut failed: Option<ShardOutcome> = None;
        while let Some(res) = shards.join_next().await {
            let outcome =
                res.map_err(|e| Error::Internal(format!("shard write task failed: {}", e)))?;

            if level.is_satisfied(outcome.owners, outcome.successes) {
                continue;
            }
            warn!(
                shard_id = outcome.shard_id,
                owners = outcome.owners,
                successes = outcome.successes,
                required = level.required_acks(outcome.owners),
                consistency = %level,
                "Shard write did not meet consistency level"
            );
            if failed.is_none() {
                failed = Some(outcome);
            }
        }

        match failed {
            None => Ok(()),
            Some(outcome) => {
                let shard_id = outcome.shard_id;
                let source = outcome.into_last_error().unwrap_or_else(|| {
                    Error::Internal("no owner reported an error".to_string())
                });
                Err(Error::WriteFailed {
                    shard_id,
                    source: Box::new(source),
                })
            }
        }
    }
}

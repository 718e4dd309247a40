//! Replica fan-out for a single shard
//!
//! One task per owner, all started together. The writer waits until every
//! owner has answered or the deadline passes; it never stops at the first
//! failure and never retries. Owners still pending at the deadline count as
//! failed.

use crate::common::{Error, WriteMetrics};
use crate::coordinator::points::Point;
use crate::coordinator::shard_writer::{LocalShardWriter, RemoteShardWriter, ShardWriter};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::{self, JoinSet};
use tokio::time::{timeout_at, Instant};
use tracing::warn;

/// Result of fanning one shard out to its owners
#[derive(Debug)]
pub struct ShardOutcome {
    pub shard_id: u64,
    /// Number of owners the shard was sent to
    pub owners: usize,
    pub successes: usize,
    /// One entry per owner that failed or timed out, in arrival order
    pub failures: Vec<Error>,
}

impl ShardOutcome {
    /// The most recently observed owner failure
    pub fn into_last_error(mut self) -> Option<Error> {
        self.failures.pop()
    }
}

/// Dispatches shard batches to the local store or to remote owners
pub struct ReplicaWriter {
    node_id: u64,
    local: LocalShardWriter,
    remote: RemoteShardWriter,
    metrics: Arc<WriteMetrics>,
}

impl ReplicaWriter {
    pub fn new(
        node_id: u64,
        local: LocalShardWriter,
        remote: RemoteShardWriter,
        metrics: Arc<WriteMetrics>,
    ) -> Self {
        Self {
            node_id,
            local,
            remote,
            metrics,
        }
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// Local writer for this node, remote writer for every other owner
    pub fn writer_for(&self, owner: u64) -> ShardWriter {
        if owner == self.node_id {
            ShardWriter::Local(self.local.clone())
        } else {
            ShardWriter::Remote(self.remote.clone())
        }
    }

    /// Write `points` to every owner of `shard_id` concurrently.
    pub async fn write_shard(
        &self,
        shard_id: u64,
        owners: &[u64],
        points: Arc<Vec<Point>>,
        deadline: Instant,
    ) -> ShardOutcome {
        let mut tasks = JoinSet::new();
        // Task id of every spawned write, so a failed task still names its owner
        let mut task_owners: HashMap<task::Id, u64> = HashMap::with_capacity(owners.len());
        for &owner in owners {
            let writer = self.writer_for(owner);
            if writer.is_local() {
                self.metrics.local_shard_writes.inc();
            } else {
                self.metrics.remote_shard_writes.inc();
            }

            let points = points.clone();
            let handle = tasks.spawn(async move {
                let res = writer.write(shard_id, owner, &points).await;
                (owner, res)
            });
            task_owners.insert(handle.id(), owner);
        }

        let mut outcome = ShardOutcome {
            shard_id,
            owners: owners.len(),
            successes: 0,
            failures: Vec::new(),
        };
        let mut pending: HashSet<u64> = owners.iter().copied().collect();

        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((owner, Ok(()))))) => {
                    pending.remove(&owner);
                    outcome.successes += 1;
                }
                Ok(Some(Ok((owner, Err(e))))) => {
                    pending.remove(&owner);
                    warn!(shard_id, owner, error = %e, "Shard write to owner failed");
                    self.metrics.shard_write_errors.inc();
                    outcome.failures.push(e);
                }
                Ok(Some(Err(e))) => {
                    let Some(owner) = task_owners.get(&e.id()).copied() else {
                        self.metrics.shard_write_errors.inc();
                        outcome
                            .failures
                            .push(Error::Internal(format!("shard write task failed: {}", e)));
                        continue;
                    };
                    pending.remove(&owner);
                    warn!(shard_id, owner, error = %e, "Shard write task failed");
                    self.metrics.shard_write_errors.inc();
                    outcome.failures.push(Error::ReplicaWrite {
                        shard_id,
                        node_id: owner,
                        reason: format!("write task failed: {}", e),
                    });
                }
                Ok(None) => break,
                Err(_) => {
                    tasks.abort_all();
                    // Owner order keeps the reported failures deterministic
                    let timed_out: Vec<u64> = owners
                        .iter()
                        .copied()
                        .filter(|o| pending.contains(o))
                        .collect();
                    warn!(shard_id, pending = ?timed_out, "Shard write deadline exceeded");
                    self.metrics.write_timeouts.add(timed_out.len() as u64);
                    for node_id in timed_out {
                        outcome
                            .failures
                            .push(Error::ReplicaTimeout { shard_id, node_id });
                    }
                    break;
                }
            }
        }

        outcome
    }
}

//! Shard writers: deliver a shard's points to one owner
//!
//! The local owner is served by the node's `ShardStore`; remote owners are
//! reached through a `ShardTransport`, HTTP by default.

use crate::common::{Error, Result};
use crate::coordinator::points::Point;
use crate::storage::ShardStore;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Sends a shard batch to a remote node
#[async_trait]
pub trait ShardTransport: Send + Sync {
    async fn write_shard(&self, shard_id: u64, node_id: u64, points: &[Point]) -> Result<()>;
}

/// Writes to shards hosted on this node
#[derive(Clone)]
pub struct LocalShardWriter {
    store: Arc<dyn ShardStore>,
}

impl LocalShardWriter {
    pub fn new(store: Arc<dyn ShardStore>) -> Self {
        Self { store }
    }

    pub fn write(&self, shard_id: u64, points: &[Point]) -> Result<()> {
        self.store.write_to_shard(shard_id, points)
    }
}

/// Writes to shards hosted on other nodes
#[derive(Clone)]
pub struct RemoteShardWriter {
    transport: Arc<dyn ShardTransport>,
}

impl RemoteShardWriter {
    pub fn new(transport: Arc<dyn ShardTransport>) -> Self {
        Self { transport }
    }

    pub async fn write(&self, shard_id: u64, node_id: u64, points: &[Point]) -> Result<()> {
        self.transport.write_shard(shard_id, node_id, points).await
    }
}

/// The writer selected for one owner
#[derive(Clone)]
pub enum ShardWriter {
    Local(LocalShardWriter),
    Remote(RemoteShardWriter),
}

impl ShardWriter {
    pub fn is_local(&self) -> bool {
        matches!(self, ShardWriter::Local(_))
    }

    /// Write `points` to `shard_id` on `node_id`. Failures are reported as
    /// `ReplicaWrite` naming the shard and owner.
    pub async fn write(&self, shard_id: u64, node_id: u64, points: &[Point]) -> Result<()> {
        let res = match self {
            ShardWriter::Local(w) => w.write(shard_id, points),
            ShardWriter::Remote(w) => w.write(shard_id, node_id, points).await,
        };

        res.map_err(|e| match e {
            e @ Error::ReplicaWrite { .. } => e,
            e => Error::ReplicaWrite {
                shard_id,
                node_id,
                reason: e.to_string(),
            },
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// JSON over HTTP: `POST {address}/internal/shards/{shard_id}`
pub struct HttpTransport {
    client: reqwest::Client,
    addresses: HashMap<u64, String>,
}

impl HttpTransport {
    pub fn new(addresses: HashMap<u64, String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(Self { client, addresses })
    }

    fn url(&self, node_id: u64, shard_id: u64) -> Result<String> {
        let address = self
            .addresses
            .get(&node_id)
            .ok_or_else(|| Error::ConnectionFailed(format!("no address for node {}", node_id)))?;
        Ok(format!(
            "{}/internal/shards/{}",
            address.trim_end_matches('/'),
            shard_id
        ))
    }
}

#[async_trait]
impl ShardTransport for HttpTransport {
    async fn write_shard(&self, shard_id: u64, node_id: u64, points: &[Point]) -> Result<()> {
        let url = self.url(node_id, shard_id)?;
        let resp = self.client.post(&url).json(points).send().await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let reason = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        match status {
            StatusCode::NOT_FOUND => Err(Error::ShardNotFound(shard_id)),
            _ => Err(Error::Http(format!("{} from node {}: {}", status, node_id, reason))),
        }
    }
}

//! Data node server

use crate::common::{Config, IdentityMap, Result, WriteMetrics};
use crate::coordinator::fanout::ReplicaWriter;
use crate::coordinator::http::{create_router, HttpState};
use crate::coordinator::metadata::{MetadataStore, NodeInfo};
use crate::coordinator::shard_writer::{HttpTransport, LocalShardWriter, RemoteShardWriter};
use crate::coordinator::writer::Coordinator;
use crate::storage::MemShardStore;
use std::collections::HashMap;
use std::sync::Arc;

pub struct DataNode {
    config: Config,
}

impl DataNode {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Wire metadata, storage and the coordinator together into the HTTP state
    pub fn build_state(&self) -> Result<HttpState> {
        let config = &self.config;
        config.validate()?;

        let metadata = Arc::new(MetadataStore::open(&config.meta_dir)?);
        for peer in &config.peers {
            metadata.register_node(&NodeInfo {
                id: peer.id,
                address: peer.address.clone(),
            })?;
        }
        // A node always owns data, even when it is not listed among its peers
        if !config.peers.iter().any(|p| p.id == config.node_id) {
            metadata.register_node(&NodeInfo {
                id: config.node_id,
                address: format!("http://{}", config.bind_addr),
            })?;
        }
        if let Some(db) = &config.default_database {
            metadata.ensure_database(db)?;
        }

        let addresses: HashMap<u64, String> = metadata
            .nodes()?
            .into_iter()
            .map(|n| (n.id, n.address))
            .collect();

        let metrics = Arc::new(WriteMetrics::new());
        let series = Arc::new(IdentityMap::new());
        let store = Arc::new(MemShardStore::with_series_index(
            series,
            config.storage.cache_max_memory_size,
        ));
        let transport = HttpTransport::new(addresses, config.remote_request_timeout())?;

        let replicas = ReplicaWriter::new(
            config.node_id,
            LocalShardWriter::new(store.clone()),
            RemoteShardWriter::new(Arc::new(transport)),
            metrics.clone(),
        );
        let coordinator = Arc::new(Coordinator::new(
            metadata.clone(),
            replicas,
            config.write_timeout(),
            metrics.clone(),
        ));

        Ok(HttpState {
            node_id: config.node_id,
            coordinator,
            store,
            metadata,
            metrics,
        })
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting data node {}", self.config.node_id);
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Meta dir: {}", self.config.meta_dir.display());
        tracing::info!("  Peers: {}", self.config.peers.len());
        tracing::info!("  Write timeout: {:?}", self.config.write_timeout());

        let state = self.build_state()?;
        let metadata = state.metadata.clone();
        let router = create_router(state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Data node ready");

        let res = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        if let Err(e) = &res {
            tracing::error!("HTTP server error: {}", e);
        }

        metadata.flush()?;
        tracing::info!("Data node stopped");
        res.map_err(Into::into)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

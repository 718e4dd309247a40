//! HTTP API for a data node
//!
//! - `POST /write?db=&rp=&consistency=`: coordinated write of a JSON point array
//! - `POST /internal/shards/:shard_id`: apply a batch to a local shard (used by peers)
//! - `GET|POST /admin/databases`, `GET /admin/status`
//! - `GET /health`, `GET /metrics`

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{DatabaseConfig, Error, WriteMetrics};
use crate::coordinator::consistency::ConsistencyLevel;
use crate::coordinator::metadata::MetadataStore;
use crate::coordinator::points::{Point, WriteRequest};
use crate::coordinator::writer::Coordinator;
use crate::storage::{MemShardStore, ShardStore};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body
pub const MAX_BODY_SIZE: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct HttpState {
    pub node_id: u64,
    pub coordinator: Arc<Coordinator>,
    pub store: Arc<MemShardStore>,
    pub metadata: Arc<MetadataStore>,
    pub metrics: Arc<WriteMetrics>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.to_http_status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn create_router(state: HttpState) -> Router {
    Router::new()
        .route("/write", post(write_points))
        .route("/internal/shards/:shard_id", post(write_local_shard))
        .route("/admin/databases", post(create_database).get(list_databases))
        .route("/admin/status", get(admin_status))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(axum::middleware::from_fn(request_tracing_middleware))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct WriteParams {
    db: String,
    #[serde(default)]
    rp: String,
    consistency: Option<String>,
}

async fn write_points(
    State(state): State<HttpState>,
    Query(params): Query<WriteParams>,
    Json(points): Json<Vec<Point>>,
) -> Result<StatusCode, Error> {
    let consistency = match params.consistency.as_deref() {
        Some(level) if !level.is_empty() => level.parse()?,
        _ => ConsistencyLevel::default(),
    };

    let mut req = WriteRequest::new(params.db, params.rp, consistency);
    for point in points {
        point.validate()?;
        req.push_point(point);
    }

    state.coordinator.write(&req).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn write_local_shard(
    State(state): State<HttpState>,
    Path(shard_id): Path<u64>,
    Json(points): Json<Vec<Point>>,
) -> Result<StatusCode, Error> {
    state.store.write_to_shard(shard_id, &points)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_database(
    State(state): State<HttpState>,
    Json(config): Json<DatabaseConfig>,
) -> Result<impl IntoResponse, Error> {
    let info = state.metadata.ensure_database(&config).map_err(|e| match e {
        Error::InvalidConfig(msg) => Error::InvalidRequest(msg),
        e => e,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "name": info.name,
            "default_retention_policy": info.default_retention_policy,
        })),
    ))
}

async fn list_databases(State(state): State<HttpState>) -> Result<impl IntoResponse, Error> {
    let databases: Vec<_> = state
        .metadata
        .databases()?
        .into_iter()
        .map(|db| {
            let policies: Vec<_> = db
                .retention_policies
                .iter()
                .map(|rp| {
                    json!({
                        "name": rp.name,
                        "replica_n": rp.replica_n,
                        "duration_secs": rp.duration.as_secs(),
                        "shard_group_duration_secs": rp.shard_group_duration.as_secs(),
                        "shard_groups": rp.shard_groups.iter().filter(|g| !g.is_deleted()).count(),
                    })
                })
                .collect();
            json!({
                "name": db.name,
                "default_retention_policy": db.default_retention_policy,
                "retention_policies": policies,
            })
        })
        .collect();

    Ok(Json(json!({ "databases": databases })))
}

/// Node summary for operators and the CLI
async fn admin_status(State(state): State<HttpState>) -> Result<impl IntoResponse, Error> {
    let nodes = state.metadata.nodes()?;
    let databases = state.metadata.databases()?;
    let shard_ids = state.store.shard_ids();

    Ok(Json(json!({
        "node_id": state.node_id,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.metrics.uptime_seconds(),
        "nodes": nodes,
        "databases": databases.len(),
        "local_shards": shard_ids,
        "series": state.store.series_count(),
        "cache_size": state.store.size(),
    })))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn metrics(State(state): State<HttpState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

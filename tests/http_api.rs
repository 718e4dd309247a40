//! HTTP API tests, served in-process

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use minits::common::tracing_middleware::REQUEST_ID_HEADER;
use minits::common::{Config, DatabaseConfig};
use minits::coordinator::http::{create_router, HttpState};
use minits::DataNode;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn node() -> (TempDir, HttpState) {
    let dir = TempDir::new().unwrap();
    let config = Config {
        node_id: 1,
        meta_dir: dir.path().join("meta"),
        default_database: Some(DatabaseConfig {
            name: "telegraf".into(),
            retention_policy: "autogen".into(),
            replica_n: 1,
            duration: "0s".into(),
            shard_group_duration: "1h".into(),
        }),
        ..Default::default()
    };
    let state = DataNode::new(config).build_state().unwrap();
    (dir, state)
}

fn app(state: &HttpState) -> Router {
    create_router(state.clone())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn points() -> Value {
    json!([
        {"measurement": "cpu", "tags": {"host": "server01"}, "fields": {"value": 0.64}, "time": 0},
        {"measurement": "cpu", "tags": {"host": "server02"}, "fields": {"value": 0.12}, "time": 10}
    ])
}

#[tokio::test]
async fn test_write_accepted() {
    let (_dir, state) = node();

    let resp = app(&state)
        .oneshot(post_json("/write?db=telegraf&consistency=all", points()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));

    let shard_ids = state.store.shard_ids();
    assert_eq!(shard_ids.len(), 1);
    assert_eq!(state.store.point_count(shard_ids[0]), 2);
    assert_eq!(state.metrics.write_ok.get(), 1);
}

#[tokio::test]
async fn test_write_errors() {
    let (_dir, state) = node();

    let resp = app(&state)
        .oneshot(post_json("/write?db=missing", points()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_json(resp).await["error"]
        .as_str()
        .unwrap()
        .contains("Retention policy not found"));

    let resp = app(&state)
        .oneshot(post_json("/write?db=telegraf&consistency=most", points()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let no_fields = json!([{"measurement": "cpu", "fields": {}, "time": 0}]);
    let resp = app(&state)
        .oneshot(post_json("/write?db=telegraf", no_fields))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(state.store.shard_ids().is_empty());
}

#[tokio::test]
async fn test_internal_shard_write() {
    let (_dir, state) = node();

    let resp = app(&state)
        .oneshot(post_json("/internal/shards/42", points()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.store.point_count(42), 2);
}

#[tokio::test]
async fn test_admin_databases() {
    let (_dir, state) = node();

    let resp = app(&state)
        .oneshot(post_json(
            "/admin/databases",
            json!({"name": "metrics", "replica_n": 1, "shard_group_duration": "1d"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["default_retention_policy"], "autogen");

    let resp = app(&state)
        .oneshot(post_json(
            "/admin/databases",
            json!({"name": "bad", "shard_group_duration": "0s"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app(&state)
        .oneshot(Request::get("/admin/databases").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let names: Vec<String> = body_json(resp).await["databases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|db| db["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["metrics", "telegraf"]);
}

#[tokio::test]
async fn test_health_status_and_metrics() {
    let (_dir, state) = node();

    let resp = app(&state)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "healthy");

    let resp = app(&state)
        .oneshot(Request::get("/admin/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = body_json(resp).await;
    assert_eq!(status["node_id"], 1);
    assert_eq!(status["databases"], 1);
    assert_eq!(status["nodes"].as_array().unwrap().len(), 1);

    app(&state)
        .oneshot(post_json("/write?db=telegraf", points()))
        .await
        .unwrap();
    let resp = app(&state)
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("minits_write_requests_total 1"));
    assert!(text.contains("minits_point_requests_total 2"));
    assert!(text.contains("minits_local_shard_writes_total 1"));
}

//! Control surface integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use reolink_gateway::device::RawResponse;
use reolink_gateway::server::{self, ServerState};
use reolink_gateway::{Daemon, StateStore, StateValue};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;

mod common;
use common::{Reply, harness};

/// Router over the daemon's pieces; the receiver keeps the refresh queue open
fn build_test_router(daemon: &Daemon) -> (axum::Router, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(1);
    let state = ServerState {
        store: daemon.store(),
        health: daemon.client().health().clone(),
        client: daemon.client().clone(),
        refresh: tx,
    };
    (server::router(state), rx)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn put(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// -- health --------------------------------------------------------------

#[tokio::test]
async fn test_health_endpoint() {
    let (_transport, daemon) = harness(10);
    let (app, _rx) = build_test_router(&daemon);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["connected"], false);
    assert!(json.get("last_error").is_none());
}

#[tokio::test]
async fn test_health_reports_last_error() {
    let (transport, daemon) = harness(10);
    transport.reply("GetMdState", Reply::Timeout);
    daemon.refresher().motion().await;
    let (app, _rx) = build_test_router(&daemon);

    let json = body_json(app.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(json["connected"], false);
    assert!(json["last_error"].as_str().unwrap().contains("timeout"));
}

// -- states --------------------------------------------------------------

#[tokio::test]
async fn test_list_states() {
    let (transport, daemon) = harness(10);
    transport.reply("GetMdState", Reply::value(json!({ "state": 1 })));
    daemon.refresher().motion().await;
    let (app, _rx) = build_test_router(&daemon);

    let json = body_json(app.oneshot(get("/states")).await.unwrap()).await;
    assert_eq!(json["sensor.motion"]["val"], true);
    assert_eq!(json["sensor.motion"]["ack"], true);
    assert_eq!(json["network.connected"]["val"], true);
}

#[tokio::test]
async fn test_get_missing_state() {
    let (_transport, daemon) = harness(10);
    let (app, _rx) = build_test_router(&daemon);

    let response = app.oneshot(get("/states/sensor.motion")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_write_is_recorded_unacknowledged() {
    let (transport, daemon) = harness(10);
    let (app, _rx) = build_test_router(&daemon);

    let response = app
        .oneshot(put("/states/settings.ledBrightness", &json!({ "val": 40 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let entry = daemon.store().entry("settings.ledBrightness").await.unwrap();
    assert_eq!(entry.value, StateValue::Int(40));
    assert!(!entry.ack);
    // Dispatch happens in the daemon loop, not the handler
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_write_to_read_only_state() {
    let (_transport, daemon) = harness(10);
    let (app, _rx) = build_test_router(&daemon);

    let response = app
        .oneshot(put("/states/sensor.motion", &json!({ "val": true })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(daemon.store().get("sensor.motion").await, None);
}

#[tokio::test]
async fn test_write_requires_exact_state_id() {
    let (_transport, daemon) = harness(10);
    let (app, _rx) = build_test_router(&daemon);

    for id in ["foo.bar.ir", "ir", "reolink.0.settings.ir"] {
        let response = app
            .clone()
            .oneshot(put(&format!("/states/{id}"), &json!({ "val": "On" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{id}");
        assert_eq!(daemon.store().get(id).await, None);
    }

    let response = app
        .oneshot(put("/states/settings.ir", &json!({ "val": "On" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

// -- refresh -------------------------------------------------------------

#[tokio::test]
async fn test_refresh_request() {
    let (_transport, daemon) = harness(10);
    let (app, mut rx) = build_test_router(&daemon);

    let response = app.clone().oneshot(post("/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Queue already full: still accepted
    let response = app.oneshot(post("/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    assert_eq!(rx.try_recv(), Ok(()));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_refresh_without_scheduler() {
    let (_transport, daemon) = harness(10);
    let (app, rx) = build_test_router(&daemon);
    drop(rx);

    let response = app.oneshot(post("/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// -- snapshot ------------------------------------------------------------

#[tokio::test]
async fn test_snapshot() {
    let (transport, daemon) = harness(10);
    transport.reply(
        "Snap",
        Reply::Raw(RawResponse {
            status: 200,
            content_type: Some("image/jpeg".to_string()),
            body: vec![0xff, 0xd8, 0xff],
        }),
    );
    let (app, _rx) = build_test_router(&daemon);

    let response = app.oneshot(post("/snapshot")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json, json!({ "type": "image/jpeg", "base64": "/9j/" }));
}

#[tokio::test]
async fn test_snapshot_error_body() {
    let (transport, daemon) = harness(10);
    transport.reply("Snap", Reply::device_error("please login first"));
    let (app, _rx) = build_test_router(&daemon);

    let response = app.oneshot(post("/snapshot")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("please login first"));
}

#[tokio::test]
async fn test_snapshot_leaves_health_alone() {
    let (transport, daemon) = harness(10);
    transport.reply("Snap", Reply::Refused);
    let (app, _rx) = build_test_router(&daemon);

    let response = app.oneshot(post("/snapshot")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(daemon.client().health().snapshot().last_error.is_none());
}

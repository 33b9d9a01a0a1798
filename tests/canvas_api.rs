// tests/canvas_api.rs
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use pixel_canvas::{api, Canvas, CanvasConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let config = CanvasConfig {
        rows: 4,
        cols: 4,
        ..CanvasConfig::default()
    };
    api::router(Arc::new(Canvas::new(&config).unwrap()))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_dimensions() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], 4);
    assert_eq!(body["cols"], 4);
}

#[tokio::test]
async fn grid_lists_row_major() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/blocks", None).await;
    assert_eq!(status, StatusCode::OK);
    let blocks = body["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 16);
    assert_eq!(blocks[5]["row"], 1);
    assert_eq!(blocks[5]["col"], 1);
    assert_eq!(blocks[5]["status"], "available");
}

#[tokio::test]
async fn lock_submit_flow() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/blocks/1-2/lock",
        Some(json!({"holder": "A"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["block"]["status"], "locked");
    assert_eq!(body["block"]["holder"], "A");
    assert!(body["lease"]["expiresAt"].is_string());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/blocks/1-2/lock",
        Some(json!({"holder": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let submission = json!({
        "holder": "B",
        "pixelData": [{"row": 0, "column": 0, "color": "#FF0000"}],
        "imageBase64": "art",
    });
    let (status, body) = call(&app, Method::PUT, "/api/blocks/1-2", Some(submission)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "holder_mismatch");

    let submission = json!({
        "holder": "A",
        "pixelData": [{"row": 0, "column": 0, "color": "#FF0000"}],
        "imageBase64": "art",
    });
    let (status, body) = call(&app, Method::PUT, "/api/blocks/1-2", Some(submission.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["block"]["status"], "completed");
    assert_eq!(body["block"]["pixelData"][0]["color"], "#FF0000");
    assert!(body["block"]["holder"].is_null());

    let (status, body) = call(&app, Method::PUT, "/api/blocks/1-2", Some(submission)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_completed");

    let (status, body) = call(&app, Method::GET, "/api/blocks/1-2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imageBase64"], "art");

    let (_, stats) = call(&app, Method::GET, "/api/blocks/stats", None).await;
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["available"], 15);
}

#[tokio::test]
async fn release_returns_block() {
    let app = app();
    call(&app, Method::POST, "/api/blocks/0-0/lock", Some(json!({"holder": "A"}))).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/blocks/0-0/release",
        Some(json!({"holder": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "holder_mismatch");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/blocks/0-0/release",
        Some(json!({"holder": "A"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["block"]["status"], "available");
}

#[tokio::test]
async fn bad_requests() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/api/blocks/nope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(&app, Method::GET, "/api/blocks/9-9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    call(&app, Method::POST, "/api/blocks/3-3/lock", Some(json!({"holder": "A"}))).await;
    let submission = json!({
        "holder": "A",
        "pixelData": [{"row": 8, "column": 0, "color": "#FF0000"}],
        "imageBase64": "art",
    });
    let (status, body) = call(&app, Method::PUT, "/api/blocks/3-3", Some(submission)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_payload");

    let (_, body) = call(&app, Method::GET, "/api/blocks/3-3", None).await;
    assert_eq!(body["status"], "locked");
}

#[tokio::test]
async fn malformed_bodies_use_error_envelope() {
    let app = app();

    let (status, body) = call(&app, Method::POST, "/api/blocks/0-0/lock", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("holder"));

    call(&app, Method::POST, "/api/blocks/0-1/lock", Some(json!({"holder": "A"}))).await;
    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/blocks/0-1",
        Some(json!({"holder": "A", "pixelData": "red"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    // no content-type header at all
    let (status, body) = call(&app, Method::POST, "/api/blocks/0-1/release", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    // nothing was mutated by the rejected requests
    let (_, body) = call(&app, Method::GET, "/api/blocks/0-0", None).await;
    assert_eq!(body["status"], "available");
    let (_, body) = call(&app, Method::GET, "/api/blocks/0-1", None).await;
    assert_eq!(body["status"], "locked");
}

#[tokio::test]
async fn signed_block_ids_are_rejected() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/blocks/+1-2", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/blocks/1-+2/lock",
        Some(json!({"holder": "A"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = call(&app, Method::GET, "/api/blocks/1-2", None).await;
    assert_eq!(body["status"], "available");
}

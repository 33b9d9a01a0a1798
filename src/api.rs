// src/api.rs
// Top-level router: health, canvas routes, request logging
use crate::canvas::Canvas;
use crate::config::CanvasConfig;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

async fn health(State(canvas): State<Arc<Canvas>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "rows": canvas.rows(),
        "cols": canvas.cols(),
    }))
}

/// Logs every request with its status and latency
async fn logging_middleware<B>(req: Request<B>, next: Next<B>) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    info!(
        "{} {} {} - {:.3}s",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64()
    );
    response
}

pub fn router(canvas: Arc<Canvas>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .with_state(canvas.clone());

    Router::new()
        .merge(public_routes)
        .nest("/api", crate::canvas::api::router(canvas))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(logging_middleware))
}

/// Serves the canvas until ctrl-c
pub async fn serve(config: &CanvasConfig, canvas: Arc<Canvas>) -> Result<()> {
    let addr: SocketAddr = config
        .api_addr
        .parse()
        .with_context(|| format!("invalid API address '{}'", config.api_addr))?;

    info!(
        "canvas API listening on {} ({}x{} blocks, {}x{} pixels each, lease ttl {}ms)",
        addr, config.rows, config.cols, config.sub_rows, config.sub_cols, config.lease_ttl_ms
    );

    axum::Server::bind(&addr)
        .serve(router(canvas).into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await
        .context("API server failed")?;
    Ok(())
}

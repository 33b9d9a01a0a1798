// src/canvas/api.rs
// Block routes: list, inspect, lock, submit, release
use crate::canvas::{BlockView, Canvas, CanvasError, GridStats, Lease, PixelData};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone)]
pub struct CanvasState {
    pub canvas: Arc<Canvas>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Canvas(e) => {
                let status = match e {
                    CanvasError::NotFound { .. } => StatusCode::NOT_FOUND,
                    CanvasError::Conflict { .. }
                    | CanvasError::NotLocked { .. }
                    | CanvasError::AlreadyCompleted { .. } => StatusCode::CONFLICT,
                    CanvasError::LeaseExpired { .. } => StatusCode::GONE,
                    CanvasError::HolderMismatch { .. } => StatusCode::FORBIDDEN,
                    CanvasError::InvalidPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    CanvasError::GridTooLarge { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
        };
        let body = serde_json::json!({
            "success": false,
            "error": code,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Parses the `"{row}-{col}"` form used in block paths
pub fn parse_block_id(id: &str) -> Result<(usize, usize), ApiError> {
    let bad = || ApiError::BadRequest(format!("invalid block id '{}', expected ROW-COL", id));
    let (row, col) = id.split_once('-').ok_or_else(bad)?;
    let part = |s: &str| {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        s.parse::<usize>().map_err(|_| bad())
    };
    Ok((part(row)?, part(col)?))
}

#[derive(Deserialize)]
pub struct HolderRequest {
    pub holder: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub holder: String,
    #[serde(default)]
    pub pixel_data: Vec<PixelData>,
    pub image_base64: String,
}

#[derive(Serialize)]
pub struct BlocksResponse {
    pub blocks: Vec<BlockView>,
}

#[derive(Serialize)]
pub struct LockResponse {
    pub success: bool,
    pub message: String,
    pub lease: Lease,
    pub block: BlockView,
}

#[derive(Serialize)]
pub struct BlockResponse {
    pub success: bool,
    pub block: BlockView,
}

pub async fn list_blocks(State(state): State<CanvasState>) -> Result<Json<BlocksResponse>, ApiError> {
    let blocks = state.canvas.list_grid()?.iter().map(|b| b.view()).collect();
    Ok(Json(BlocksResponse { blocks }))
}

pub async fn grid_stats(State(state): State<CanvasState>) -> Result<Json<GridStats>, ApiError> {
    Ok(Json(state.canvas.stats()?))
}

pub async fn get_block(
    State(state): State<CanvasState>,
    Path(id): Path<String>,
) -> Result<Json<BlockView>, ApiError> {
    let (row, col) = parse_block_id(&id)?;
    Ok(Json(state.canvas.get_block(row, col)?.view()))
}

pub async fn lock_block(
    State(state): State<CanvasState>,
    Path(id): Path<String>,
    payload: Result<Json<HolderRequest>, JsonRejection>,
) -> Result<Json<LockResponse>, ApiError> {
    let (row, col) = parse_block_id(&id)?;
    let Json(req) = payload?;
    let lease = state.canvas.acquire(row, col, &req.holder)?;
    let block = state.canvas.get_block(row, col)?;
    Ok(Json(LockResponse {
        success: true,
        message: "Block locked successfully".to_string(),
        lease,
        block: block.view(),
    }))
}

pub async fn submit_block(
    State(state): State<CanvasState>,
    Path(id): Path<String>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<BlockResponse>, ApiError> {
    let (row, col) = parse_block_id(&id)?;
    let Json(req) = payload?;
    let block = state
        .canvas
        .submit(row, col, &req.holder, req.pixel_data, req.image_base64)?;
    Ok(Json(BlockResponse {
        success: true,
        block: block.view(),
    }))
}

pub async fn release_block(
    State(state): State<CanvasState>,
    Path(id): Path<String>,
    payload: Result<Json<HolderRequest>, JsonRejection>,
) -> Result<Json<BlockResponse>, ApiError> {
    let (row, col) = parse_block_id(&id)?;
    let Json(req) = payload?;
    let block = state.canvas.release(row, col, &req.holder)?;
    Ok(Json(BlockResponse {
        success: true,
        block: block.view(),
    }))
}

pub fn router(canvas: Arc<Canvas>) -> Router {
    let state = CanvasState { canvas };
    Router::new()
        .route("/blocks", get(list_blocks))
        .route("/blocks/stats", get(grid_stats))
        .route("/blocks/:id", get(get_block).put(submit_block))
        .route("/blocks/:id/lock", post(lock_block))
        .route("/blocks/:id/release", post(release_block))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_ids_parse() {
        assert_eq!(parse_block_id("3-12").unwrap(), (3, 12));
        assert_eq!(parse_block_id("0-0").unwrap(), (0, 0));
        for bad in [
            "3", "3-", "-3", "a-b", "1-2-3", "-1-2", "+1-2", "1-+2", " 1-2", "1-2 ",
        ] {
            assert!(parse_block_id(bad).is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn errors_map_to_statuses() {
        let cases = [
            (CanvasError::NotFound { row: 0, col: 0 }, StatusCode::NOT_FOUND),
            (
                CanvasError::Conflict {
                    row: 0,
                    col: 0,
                    status: crate::canvas::BlockStatus::Locked,
                },
                StatusCode::CONFLICT,
            ),
            (CanvasError::LeaseExpired { row: 0, col: 0 }, StatusCode::GONE),
            (CanvasError::HolderMismatch { row: 0, col: 0 }, StatusCode::FORBIDDEN),
            (CanvasError::AlreadyCompleted { row: 0, col: 0 }, StatusCode::CONFLICT),
            (
                CanvasError::InvalidPayload("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CanvasError::GridTooLarge { rows: 1, cols: 1 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}

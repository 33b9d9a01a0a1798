// src/canvas/error.rs
use crate::canvas::block::BlockStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CanvasError>;

/// Every failure the canvas core reports. All are recoverable by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("block {row}-{col} not found")]
    NotFound { row: usize, col: usize },

    #[error("block {row}-{col} is {status}")]
    Conflict {
        row: usize,
        col: usize,
        status: BlockStatus,
    },

    #[error("block {row}-{col} is not locked")]
    NotLocked { row: usize, col: usize },

    #[error("lease on block {row}-{col} has expired")]
    LeaseExpired { row: usize, col: usize },

    #[error("block {row}-{col} is locked by another holder")]
    HolderMismatch { row: usize, col: usize },

    #[error("block {row}-{col} is already completed")]
    AlreadyCompleted { row: usize, col: usize },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("grid of {rows}x{cols} blocks is too large")]
    GridTooLarge { rows: usize, cols: usize },
}

impl CanvasError {
    /// Stable machine-readable code for transport layers
    pub fn code(&self) -> &'static str {
        match self {
            CanvasError::NotFound { .. } => "not_found",
            CanvasError::Conflict { .. } => "conflict",
            CanvasError::NotLocked { .. } => "not_locked",
            CanvasError::LeaseExpired { .. } => "lease_expired",
            CanvasError::HolderMismatch { .. } => "holder_mismatch",
            CanvasError::AlreadyCompleted { .. } => "already_completed",
            CanvasError::InvalidPayload(_) => "invalid_payload",
            CanvasError::GridTooLarge { .. } => "grid_too_large",
        }
    }

    /// Re-labels a status conflict for operations that need a lock to act on.
    pub(crate) fn into_lock_required(self) -> Self {
        match self {
            CanvasError::Conflict {
                row,
                col,
                status: BlockStatus::Completed,
            } => CanvasError::AlreadyCompleted { row, col },
            CanvasError::Conflict { row, col, .. } => CanvasError::NotLocked { row, col },
            other => other,
        }
    }
}

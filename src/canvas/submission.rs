// src/canvas/submission.rs
use crate::canvas::block::{Artwork, Block, BlockStatus};
use crate::canvas::error::{CanvasError, Result};
use crate::canvas::lease::{check_holder, LeaseManager};
use crate::canvas::pixels::{normalize_pixels, validate_artifact, PixelData, SubGrid};
use crate::canvas::store::GridStore;
use log::{info, warn};
use std::sync::Arc;

/// Commits finished artwork into a leased block
pub struct SubmissionHandler {
    store: Arc<GridStore>,
    leases: Arc<LeaseManager>,
    sub_grid: SubGrid,
}

impl SubmissionHandler {
    pub fn new(store: Arc<GridStore>, leases: Arc<LeaseManager>, sub_grid: SubGrid) -> Self {
        Self {
            store,
            leases,
            sub_grid,
        }
    }

    pub fn sub_grid(&self) -> SubGrid {
        self.sub_grid
    }

    /// Moves a locked block to completed.
    ///
    /// Checks run in order under the block's lock: status, lease expiry,
    /// holder, payload. Expiry is checked against the clock here even when no sweep
    /// has reclaimed the lease yet. Either everything is committed or the
    /// block is left as it was.
    pub fn submit(
        &self,
        row: usize,
        col: usize,
        holder: &str,
        pixel_data: Vec<PixelData>,
        artifact: String,
    ) -> Result<Block> {
        let now = self.leases.now();
        let sub_grid = self.sub_grid;

        let outcome = self
            .store
            .compare_and_update(row, col, BlockStatus::Locked, |block| {
                if block.lease_expired(now) {
                    return Err(CanvasError::LeaseExpired { row, col });
                }
                check_holder(holder)?;
                if block.lease().map(|l| l.holder.as_str()) != Some(holder) {
                    return Err(CanvasError::HolderMismatch { row, col });
                }
                let pixel_data = normalize_pixels(pixel_data, sub_grid)?;
                validate_artifact(&artifact)?;

                block.complete(Artwork {
                    artifact,
                    pixel_data,
                    submitted_at: now,
                });
                Ok(block.clone())
            })
            .map_err(CanvasError::into_lock_required);

        match outcome {
            Ok(block) => {
                info!("block {}-{} completed by {}", row, col, holder);
                Ok(block)
            }
            Err(e @ CanvasError::LeaseExpired { .. }) => {
                // reclaim now rather than waiting for the next read
                self.leases.expire_if_due(row, col, now)?;
                warn!("late submission for block {}-{} from {}", row, col, holder);
                Err(e)
            }
            Err(e) => {
                warn!("submission for block {}-{} rejected: {}", row, col, e);
                Err(e)
            }
        }
    }
}

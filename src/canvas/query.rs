// src/canvas/query.rs
use crate::canvas::block::{Block, BlockStatus};
use crate::canvas::error::Result;
use crate::canvas::lease::LeaseManager;
use crate::canvas::store::GridStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Block counts by status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridStats {
    pub total: usize,
    pub available: usize,
    pub locked: usize,
    pub completed: usize,
}

/// Read side of the canvas. Every read sweeps expired leases first so
/// callers never see a lock that outlived its ttl.
pub struct CanvasQuery {
    store: Arc<GridStore>,
    leases: Arc<LeaseManager>,
}

impl CanvasQuery {
    pub fn new(store: Arc<GridStore>, leases: Arc<LeaseManager>) -> Self {
        Self { store, leases }
    }

    /// All blocks in row-major order
    pub fn list_grid(&self) -> Result<Vec<Block>> {
        let now = self.leases.now();
        let mut blocks = Vec::with_capacity(self.store.len());
        for row in 0..self.store.rows() {
            for col in 0..self.store.cols() {
                blocks.push(self.leases.expire_if_due(row, col, now)?);
            }
        }
        Ok(blocks)
    }

    pub fn get_block(&self, row: usize, col: usize) -> Result<Block> {
        self.leases.expire_if_due(row, col, self.leases.now())
    }

    pub fn stats(&self) -> Result<GridStats> {
        let mut stats = GridStats::default();
        for block in self.list_grid()? {
            stats.total += 1;
            match block.status() {
                BlockStatus::Available => stats.available += 1,
                BlockStatus::Locked => stats.locked += 1,
                BlockStatus::Completed => stats.completed += 1,
            }
        }
        Ok(stats)
    }
}

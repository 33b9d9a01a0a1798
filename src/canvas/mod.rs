// src/canvas/mod.rs
//! Shared pixel canvas split into lockable blocks.
//!
//! A block goes `available -> locked -> completed`. Locks are leases with a
//! fixed ttl; an unsubmitted lease is reclaimed lazily the next time the
//! block is read or mutated.
pub mod api;
pub mod block;
pub mod clock;
pub mod error;
pub mod lease;
pub mod pixels;
pub mod query;
pub mod store;
pub mod submission;

pub use block::{Artwork, Block, BlockStatus, BlockView, Lease};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CanvasError;
pub use lease::LeaseManager;
pub use pixels::{PixelData, SubGrid, PLACEHOLDER_ARTIFACT};
pub use query::{CanvasQuery, GridStats};
pub use store::GridStore;
pub use submission::SubmissionHandler;

use crate::config::CanvasConfig;
use log::info;
use std::sync::Arc;

/// One canvas: the grid plus the components allowed to change it
pub struct Canvas {
    store: Arc<GridStore>,
    leases: Arc<LeaseManager>,
    submissions: SubmissionHandler,
    query: CanvasQuery,
}

impl Canvas {
    pub fn new(config: &CanvasConfig) -> error::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Fails only when the configured grid cannot be allocated
    pub fn with_clock(config: &CanvasConfig, clock: Arc<dyn Clock>) -> error::Result<Self> {
        let mut grid = GridStore::new(config.rows, config.cols)?;
        if let Some(every) = config.seed_every {
            let seeded = grid.seed_completed(every, PLACEHOLDER_ARTIFACT, clock.now());
            info!("seeded {} completed blocks", seeded);
        }

        let store = Arc::new(grid);
        let leases = Arc::new(LeaseManager::new(
            store.clone(),
            clock,
            config.lease_ttl(),
        ));
        let submissions = SubmissionHandler::new(store.clone(), leases.clone(), config.sub_grid());
        let query = CanvasQuery::new(store.clone(), leases.clone());

        Ok(Self {
            store,
            leases,
            submissions,
            query,
        })
    }

    pub fn rows(&self) -> usize {
        self.store.rows()
    }

    pub fn cols(&self) -> usize {
        self.store.cols()
    }

    pub fn sub_grid(&self) -> SubGrid {
        self.submissions.sub_grid()
    }

    pub fn list_grid(&self) -> error::Result<Vec<Block>> {
        self.query.list_grid()
    }

    pub fn get_block(&self, row: usize, col: usize) -> error::Result<Block> {
        self.query.get_block(row, col)
    }

    pub fn stats(&self) -> error::Result<GridStats> {
        self.query.stats()
    }

    pub fn acquire(&self, row: usize, col: usize, holder: &str) -> error::Result<Lease> {
        self.leases.acquire(row, col, holder)
    }

    pub fn release(&self, row: usize, col: usize, holder: &str) -> error::Result<Block> {
        self.leases.release(row, col, holder)
    }

    pub fn submit(
        &self,
        row: usize,
        col: usize,
        holder: &str,
        pixel_data: Vec<PixelData>,
        artifact: String,
    ) -> error::Result<Block> {
        self.submissions
            .submit(row, col, holder, pixel_data, artifact)
    }
}

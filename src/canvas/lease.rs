// src/canvas/lease.rs
use crate::canvas::block::{Block, BlockStatus, Lease};
use crate::canvas::clock::Clock;
use crate::canvas::error::{CanvasError, Result};
use crate::canvas::store::GridStore;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::sync::Arc;

/// Holders are opaque, but a blank one can never match a lease.
pub(crate) fn check_holder(holder: &str) -> Result<()> {
    if holder.trim().is_empty() {
        return Err(CanvasError::InvalidPayload("holder must not be empty".into()));
    }
    Ok(())
}

/// Drives blocks through available -> locked and back.
///
/// Expiry is lazy: nothing runs in the background, stale leases are
/// reclaimed whenever a block is read or mutated.
pub struct LeaseManager {
    store: Arc<GridStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl LeaseManager {
    pub fn new(store: Arc<GridStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Locks an available block for `holder`.
    ///
    /// A lease that ran out is reclaimed first, so an abandoned block can be
    /// taken over without waiting for a read.
    pub fn acquire(&self, row: usize, col: usize, holder: &str) -> Result<Lease> {
        check_holder(holder)?;
        let now = self.now();
        self.expire_if_due(row, col, now)?;

        let lease = self
            .store
            .compare_and_update(row, col, BlockStatus::Available, |block| {
                let lease = Lease::new(holder, now, self.ttl);
                block.lock(lease.clone());
                Ok(lease)
            })?;

        info!(
            "block {}-{} locked by {} until {}",
            row, col, lease.holder, lease.expires_at
        );
        Ok(lease)
    }

    /// Reverts a locked block whose lease ran out before `now`.
    /// Any other block comes back unchanged.
    pub fn expire_if_due(&self, row: usize, col: usize, now: DateTime<Utc>) -> Result<Block> {
        let swept = self
            .store
            .compare_and_update(row, col, BlockStatus::Locked, |block| {
                if block.lease_expired(now) {
                    if let Some(lease) = block.clear_lease() {
                        debug!(
                            "lease on block {}-{} held by {} expired at {}",
                            row, col, lease.holder, lease.expires_at
                        );
                    }
                }
                Ok(block.clone())
            });

        match swept {
            Ok(block) => Ok(block),
            Err(CanvasError::Conflict { .. }) => self.store.get(row, col),
            Err(e) => Err(e),
        }
    }

    /// Gives a block back before its lease runs out
    pub fn release(&self, row: usize, col: usize, holder: &str) -> Result<Block> {
        check_holder(holder)?;
        let now = self.now();
        self.expire_if_due(row, col, now)?;

        let block = self
            .store
            .compare_and_update(row, col, BlockStatus::Locked, |block| {
                if block.lease().map(|l| l.holder.as_str()) != Some(holder) {
                    return Err(CanvasError::HolderMismatch { row, col });
                }
                block.clear_lease();
                Ok(block.clone())
            })
            .map_err(CanvasError::into_lock_required)?;

        info!("block {}-{} released by {}", row, col, holder);
        Ok(block)
    }
}

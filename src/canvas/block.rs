// src/canvas/block.rs
use crate::canvas::pixels::PixelData;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a block
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    /// Free to be locked
    Available,
    /// Held by a lease; `drawing` is the name older clients use
    #[serde(alias = "drawing")]
    Locked,
    /// Artwork committed, terminal
    Completed,
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockStatus::Available => "available",
            BlockStatus::Locked => "locked",
            BlockStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Time-bounded exclusive claim on a block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub holder: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Lease {
    /// Ttl below one millisecond is raised to one so `expires_at > acquired_at` holds.
    pub fn new(holder: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = ttl.max(Duration::milliseconds(1));
        Self {
            holder: holder.into(),
            acquired_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// A lease is still valid at exactly `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Committed contents of a completed block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub artifact: String,
    pub pixel_data: Vec<PixelData>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BlockState {
    Available,
    Locked(Lease),
    Completed(Artwork),
}

/// One cell of the shared canvas.
///
/// The lease exists only while locked and the artwork only once completed;
/// both are carried inside the state so no other combination can be built.
/// State changes are crate-private and only reachable through
/// [`GridStore`](crate::canvas::store::GridStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    row: usize,
    col: usize,
    state: BlockState,
}

impl Block {
    pub(crate) fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            state: BlockState::Available,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn status(&self) -> BlockStatus {
        match self.state {
            BlockState::Available => BlockStatus::Available,
            BlockState::Locked(_) => BlockStatus::Locked,
            BlockState::Completed(_) => BlockStatus::Completed,
        }
    }

    pub fn lease(&self) -> Option<&Lease> {
        match &self.state {
            BlockState::Locked(lease) => Some(lease),
            _ => None,
        }
    }

    pub fn artwork(&self) -> Option<&Artwork> {
        match &self.state {
            BlockState::Completed(art) => Some(art),
            _ => None,
        }
    }

    /// True when locked and the lease ran out before `now`
    pub fn lease_expired(&self, now: DateTime<Utc>) -> bool {
        self.lease().map_or(false, |l| l.is_expired(now))
    }

    pub(crate) fn lock(&mut self, lease: Lease) {
        self.state = BlockState::Locked(lease);
    }

    /// Drops the lease and returns it, leaving the block available
    pub(crate) fn clear_lease(&mut self) -> Option<Lease> {
        match std::mem::replace(&mut self.state, BlockState::Available) {
            BlockState::Locked(lease) => Some(lease),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub(crate) fn complete(&mut self, artwork: Artwork) {
        self.state = BlockState::Completed(artwork);
    }

    /// Transport shape used by the HTTP layer
    pub fn view(&self) -> BlockView {
        let lease = self.lease();
        let art = self.artwork();
        BlockView {
            row: self.row,
            col: self.col,
            status: self.status(),
            image_base64: art.map(|a| a.artifact.clone()),
            pixel_data: art.map(|a| a.pixel_data.clone()).unwrap_or_default(),
            locked_at: lease.map(|l| l.acquired_at),
            expires_at: lease.map(|l| l.expires_at),
            submitted_at: art.map(|a| a.submitted_at),
            holder: lease.map(|l| l.holder.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockView {
    pub row: usize,
    pub col: usize,
    pub status: BlockStatus,
    pub image_base64: Option<String>,
    pub pixel_data: Vec<PixelData>,
    pub locked_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub holder: Option<String>,
}

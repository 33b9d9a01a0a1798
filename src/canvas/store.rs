// src/canvas/store.rs
use crate::canvas::block::{Artwork, Block, BlockStatus};
use crate::canvas::error::{CanvasError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Upper bound on blocks in one grid
pub const MAX_BLOCKS: usize = 1 << 20;

/// Authoritative set of blocks, addressed by (row, col).
///
/// Each block sits behind its own mutex, so operations on different blocks
/// never contend. Callers only ever receive clones; the one way to change a
/// block is [`GridStore::compare_and_update`].
pub struct GridStore {
    rows: usize,
    cols: usize,
    cells: Vec<Mutex<Block>>,
}

impl GridStore {
    /// Fails with [`CanvasError::GridTooLarge`] above [`MAX_BLOCKS`] blocks.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .filter(|n| *n <= MAX_BLOCKS)
            .ok_or(CanvasError::GridTooLarge { rows, cols })?;
        let cells = (0..len)
            .map(|i| Mutex::new(Block::new(i / cols, i % cols)))
            .collect();
        Ok(Self { rows, cols, cells })
    }

    /// Marks every `every`-th block (row-major, starting at index 0) completed
    /// with `artifact`. Needs exclusive access, so it can only run before the
    /// store is shared.
    pub fn seed_completed(&mut self, every: usize, artifact: &str, at: DateTime<Utc>) -> usize {
        if every == 0 {
            return 0;
        }
        let mut seeded = 0;
        for cell in self.cells.iter_mut().step_by(every) {
            cell.get_mut().complete(Artwork {
                artifact: artifact.to_string(),
                pixel_data: Vec::new(),
                submitted_at: at,
            });
            seeded += 1;
        }
        seeded
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(CanvasError::NotFound { row, col });
        }
        Ok(row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Block> {
        let idx = self.index(row, col)?;
        Ok(self.cells[idx].lock().clone())
    }

    /// Applies `mutator` to the block only if its status equals `expected`
    /// while the block's lock is held.
    ///
    /// The mutator works on a draft copy. If it returns an error the stored
    /// block is left exactly as it was, so a failed transition never leaves
    /// partial state behind. A status mismatch yields
    /// [`CanvasError::Conflict`] carrying the status actually found.
    pub(crate) fn compare_and_update<T, F>(
        &self,
        row: usize,
        col: usize,
        expected: BlockStatus,
        mutator: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Block) -> Result<T>,
    {
        let idx = self.index(row, col)?;
        let mut guard = self.cells[idx].lock();
        let status = guard.status();
        if status != expected {
            return Err(CanvasError::Conflict { row, col, status });
        }

        let mut draft = guard.clone();
        let out = mutator(&mut draft)?;
        *guard = draft;
        Ok(out)
    }

    /// Snapshot of every block in row-major order
    pub fn list_all(&self) -> Vec<Block> {
        self.cells.iter().map(|c| c.lock().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::block::Lease;
    use chrono::Duration;

    #[test]
    fn list_is_row_major() {
        let store = GridStore::new(2, 3).unwrap();
        let coords: Vec<_> = store.list_all().iter().map(|b| (b.row(), b.col())).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert!(store
            .list_all()
            .iter()
            .all(|b| b.status() == BlockStatus::Available));
    }

    #[test]
    fn out_of_range_is_not_found() {
        let store = GridStore::new(2, 2).unwrap();
        assert_eq!(
            store.get(2, 0).unwrap_err(),
            CanvasError::NotFound { row: 2, col: 0 }
        );
        let err = store
            .compare_and_update(0, 5, BlockStatus::Available, |_| Ok(()))
            .unwrap_err();
        assert_eq!(err, CanvasError::NotFound { row: 0, col: 5 });
    }

    #[test]
    fn status_mismatch_is_conflict_and_mutator_not_called() {
        let store = GridStore::new(1, 1).unwrap();
        let mut called = false;
        let err = store
            .compare_and_update(0, 0, BlockStatus::Locked, |_| {
                called = true;
                Ok(())
            })
            .unwrap_err();
        assert!(!called);
        assert_eq!(
            err,
            CanvasError::Conflict {
                row: 0,
                col: 0,
                status: BlockStatus::Available
            }
        );
    }

    #[test]
    fn failed_mutator_leaves_block_untouched() {
        let store = GridStore::new(1, 1).unwrap();
        let err = store
            .compare_and_update(0, 0, BlockStatus::Available, |b| {
                b.lock(Lease::new("a", Utc::now(), Duration::seconds(10)));
                Err::<(), _>(CanvasError::InvalidPayload("nope".into()))
            })
            .unwrap_err();
        assert!(matches!(err, CanvasError::InvalidPayload(_)));
        assert_eq!(store.get(0, 0).unwrap().status(), BlockStatus::Available);
    }

    #[test]
    fn successful_mutator_commits() {
        let store = GridStore::new(1, 2).unwrap();
        store
            .compare_and_update(0, 1, BlockStatus::Available, |b| {
                b.lock(Lease::new("a", Utc::now(), Duration::seconds(10)));
                Ok(())
            })
            .unwrap();
        let block = store.get(0, 1).unwrap();
        assert_eq!(block.status(), BlockStatus::Locked);
        assert_eq!(block.lease().unwrap().holder, "a");
        assert_eq!(store.get(0, 0).unwrap().status(), BlockStatus::Available);
    }

    #[test]
    fn seeding_marks_every_nth_block() {
        let mut store = GridStore::new(3, 3).unwrap();
        let n = store.seed_completed(3, "img", Utc::now());
        assert_eq!(n, 3);
        let completed: Vec<_> = store
            .list_all()
            .iter()
            .filter(|b| b.status() == BlockStatus::Completed)
            .map(|b| (b.row(), b.col()))
            .collect();
        assert_eq!(completed, vec![(0, 0), (1, 0), (2, 0)]);
        assert_eq!(store.seed_completed(0, "img", Utc::now()), 0);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        assert_eq!(
            GridStore::new(usize::MAX, 2).err(),
            Some(CanvasError::GridTooLarge {
                rows: usize::MAX,
                cols: 2
            })
        );
        assert!(GridStore::new(MAX_BLOCKS + 1, 1).is_err());
        assert!(GridStore::new(MAX_BLOCKS, 2).is_err());
    }
}

//! The shared detection board.
//!
//! One slot per sensor worker holding the most recent detection that
//! worker has published. Slots are last-write-wins with no versioning;
//! whoever reads sees whatever was most recently written. Writes and
//! reads go through the same lock, so a reader always observes complete
//! polygons, never a partially-written one.
//!
//! The single-writer-per-slot invariant is enforced by construction:
//! [`DetectionBoard::new`] hands out exactly one [`SlotWriter`] per slot
//! and there is no other write path.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use vantage_types::Polygon;

/// Shared per-sensor detection slots plus a change signal for the fusion
/// side.
#[derive(Debug)]
pub struct DetectionBoard {
    slots: Mutex<Vec<Option<Polygon>>>,
    dirty: Notify,
}

impl DetectionBoard {
    /// Create a board with `slots` empty slots and one writer token per
    /// slot. The writers are ordered by slot index.
    pub fn new(slots: usize) -> (Arc<Self>, Vec<SlotWriter>) {
        let board = Arc::new(Self {
            slots: Mutex::new(vec![None; slots]),
            dirty: Notify::new(),
        });
        let writers = (0..slots)
            .map(|index| SlotWriter {
                board: Arc::clone(&board),
                index,
            })
            .collect();
        (board, writers)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .expect("detection board lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every slot, taken under the shared lock. The lock is held
    /// only for the clone; callers merge outside it, so writers are never
    /// starved.
    pub fn snapshot(&self) -> Vec<Option<Polygon>> {
        self.slots
            .lock()
            .expect("detection board lock poisoned")
            .clone()
    }

    /// Suspend until some worker publishes a detection.
    pub async fn changed(&self) {
        self.dirty.notified().await;
    }
}

/// Write capability for exactly one board slot.
///
/// Each sensor worker owns one; ownership, not locking discipline, is
/// what guarantees a slot has a single writer.
#[derive(Debug)]
pub struct SlotWriter {
    board: Arc<DetectionBoard>,
    index: usize,
}

impl SlotWriter {
    /// Index of the slot this writer feeds.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Overwrite the slot with the latest detection and wake the fusion
    /// side. Last write wins.
    pub fn publish(&self, shape: Polygon) {
        {
            let mut slots = self
                .board
                .slots
                .lock()
                .expect("detection board lock poisoned");
            slots[self.index] = Some(shape);
        }
        self.board.dirty.notify_one();
    }
}

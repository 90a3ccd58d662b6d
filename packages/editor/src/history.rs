//! # Undo/Redo History
//!
//! Linear history of full document snapshots with a cursor.
//!
//! ## Design
//!
//! - Each committed state is a complete `{blocks, pageData}` snapshot
//! - Capture is debounced: a burst of edits collapses into one entry
//! - Recording after an undo discards every snapshot past the cursor
//! - Beyond `capacity` undo steps the oldest snapshot is dropped
//!
//! ```text
//! [s0, s1, s2, s3]      cursor = 3
//!  undo, undo    →      cursor = 1
//!  new edit s4   →      [s0, s1, s4], cursor = 2
//! ```

use std::time::{Duration, Instant};

use pagecraft_document::Snapshot;

use crate::debounce::Debouncer;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: Vec<Snapshot>,
    cursor: usize,
    capacity: usize,

    /// Latest state waiting for the capture timer
    pending: Option<Snapshot>,
    timer: Debouncer,
}

impl HistoryManager {
    pub fn new(initial: Snapshot, capacity: usize, debounce: Duration) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            capacity: capacity.max(1),
            pending: None,
            timer: Debouncer::new(debounce),
        }
    }

    /// Forget all history and start over from `initial`
    pub fn reset(&mut self, initial: Snapshot) {
        self.snapshots = vec![initial];
        self.cursor = 0;
        self.pending = None;
        self.timer.cancel();
    }

    /// Queue `snapshot` for capture once edits settle
    pub fn schedule(&mut self, snapshot: Snapshot, now: Instant) {
        self.pending = Some(snapshot);
        self.timer.schedule(now);
    }

    /// Capture the pending snapshot if its timer has expired
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.timer.fire_if_due(now) {
            self.flush()
        } else {
            false
        }
    }

    /// Capture the pending snapshot immediately
    pub fn flush(&mut self) -> bool {
        self.timer.cancel();
        match self.pending.take() {
            Some(snapshot) => self.record(snapshot),
            None => false,
        }
    }

    /// Append a snapshot, discarding redo history. Redo history is dropped
    /// even when the snapshot equals the current one; nothing is appended
    /// then and this returns false.
    pub fn record(&mut self, snapshot: Snapshot) -> bool {
        self.snapshots.truncate(self.cursor + 1);
        if self.snapshots.get(self.cursor) == Some(&snapshot) {
            return false;
        }

        self.snapshots.push(snapshot);

        // `capacity` undo steps plus the state they lead back to
        if self.snapshots.len() > self.capacity + 1 {
            let overflow = self.snapshots.len() - self.capacity - 1;
            self.snapshots.drain(..overflow);
        }
        self.cursor = self.snapshots.len() - 1;
        true
    }

    /// Step back one snapshot, capturing any pending edit first
    pub fn undo(&mut self) -> Option<&Snapshot> {
        self.flush();
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        self.flush();
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }

    /// A pending capture counts: flushing it makes the previous state reachable
    pub fn can_undo(&self) -> bool {
        self.cursor > 0 || self.pending.is_some()
    }

    /// A pending capture would discard the forward snapshots
    pub fn can_redo(&self) -> bool {
        self.pending.is_none() && self.cursor + 1 < self.snapshots.len()
    }

    /// Swap the snapshot under the cursor without touching the rest
    pub fn replace_current(&mut self, snapshot: Snapshot) {
        if let Some(current) = self.snapshots.get_mut(self.cursor) {
            *current = snapshot;
        }
    }

    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_capture_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::{Block, PageData};

    fn snapshot(n: usize) -> Snapshot {
        Snapshot::new(
            (0..n).map(|i| Block::new(format!("b{}", i), "text")).collect(),
            PageData::new(),
        )
    }

    fn manager() -> HistoryManager {
        HistoryManager::new(snapshot(0), DEFAULT_HISTORY_CAPACITY, Duration::from_millis(500))
    }

    #[test]
    fn test_history_creation() {
        let history = manager();
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_and_undo_redo() {
        let mut history = manager();
        history.record(snapshot(1));
        history.record(snapshot(2));

        assert_eq!(history.undo().unwrap(), &snapshot(1));
        assert_eq!(history.undo().unwrap(), &snapshot(0));
        assert!(history.undo().is_none());
        assert!(history.can_redo());

        assert_eq!(history.redo().unwrap(), &snapshot(1));
        assert_eq!(history.redo().unwrap(), &snapshot(2));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut history = manager();
        history.record(snapshot(1));
        history.record(snapshot(2));
        history.undo();
        history.undo();

        history.record(snapshot(5));

        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), &snapshot(5));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = HistoryManager::new(snapshot(0), 3, Duration::from_millis(500));
        for n in 1..=5 {
            history.record(snapshot(n));
        }

        assert_eq!(history.len(), 4);
        assert_eq!(history.cursor(), 3);
        assert_eq!(history.undo().unwrap(), &snapshot(4));
        assert_eq!(history.undo().unwrap(), &snapshot(3));
        assert_eq!(history.undo().unwrap(), &snapshot(2));
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_debounced_burst_is_one_entry() {
        let start = Instant::now();
        let mut history = manager();

        history.schedule(snapshot(1), start);
        history.schedule(snapshot(2), start + Duration::from_millis(100));
        history.schedule(snapshot(3), start + Duration::from_millis(200));

        assert!(!history.tick(start + Duration::from_millis(600)));
        assert!(history.tick(start + Duration::from_millis(700)));

        assert_eq!(history.len(), 2);
        assert_eq!(history.undo().unwrap(), &snapshot(0));
    }

    #[test]
    fn test_undo_flushes_pending_capture() {
        let mut history = manager();
        history.schedule(snapshot(1), Instant::now());
        assert!(history.can_undo());

        assert_eq!(history.undo().unwrap(), &snapshot(0));
        assert_eq!(history.redo().unwrap(), &snapshot(1));
    }

    #[test]
    fn test_identical_snapshot_not_recorded() {
        let mut history = manager();
        assert!(!history.record(snapshot(0)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_unchanged_capture_after_undo_clears_redo() {
        let mut history = manager();
        history.record(snapshot(1));
        history.record(snapshot(2));
        history.undo();

        assert!(!history.record(snapshot(1)));
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), &snapshot(1));
    }
}

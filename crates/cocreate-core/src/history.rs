//! Linear undo/redo over raster snapshots.

use crate::raster::Snapshot;
use std::collections::VecDeque;

/// Undo and redo sequences of snapshots.
///
/// The top of the undo sequence always mirrors what is on the raster. Once
/// initialized the undo sequence never drops below one entry, so the initial
/// state can't be undone past.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// Maximum undo entries to keep; `None` is unbounded.
    limit: Option<usize>,
}

impl History {
    /// Create an unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history that keeps at most `limit` undo entries.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit: limit.map(|l| l.max(1)),
            ..Self::default()
        }
    }

    /// Append a snapshot and clear the redo sequence.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        self.redo_stack.clear();

        if let Some(limit) = self.limit {
            while self.undo_stack.len() > limit {
                self.undo_stack.pop_front();
            }
        }
    }

    /// Step back one snapshot.
    ///
    /// Returns the snapshot to repaint, or `None` when only the initial
    /// state is left.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.undo_stack.len() <= 1 {
            return None;
        }
        let top = self.undo_stack.pop_back()?;
        self.redo_stack.push(top);
        self.undo_stack.back()
    }

    /// Re-apply the last undone snapshot.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push_back(snapshot);
        self.undo_stack.back()
    }

    /// The snapshot matching the current raster.
    pub fn current(&self) -> Option<&Snapshot> {
        self.undo_stack.back()
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of entries in the undo sequence.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of entries in the redo sequence.
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Configured undo limit.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

//! Linear undo/redo history.
//!
//! Whole-state snapshots on two stacks. Pushing after a fresh mutation
//! clears the redo stack (standard linear-history invalidation); replayed
//! mutations never push, so undoing an undo cannot double up.

use serde::{Deserialize, Serialize};
use tabula_engine::engine::CellRef;

use super::cell::CellStore;

/// Maximum number of history entries to keep. Snapshots are whole cell
/// stores, so the stack must stay bounded.
pub(crate) const MAX_HISTORY: usize = 100;

/// A rectangular cell selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: CellRef,
    pub end: CellRef,
}

/// Immutable copy of the engine state at a point in time.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub cells: CellStore,
    pub active_cell: Option<CellRef>,
    pub selection: Option<Selection>,
}

#[derive(Debug, Default)]
pub struct HistoryManager {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot after a fresh mutation. Invalidates redo.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Step back: returns the previous snapshot and parks `current` on the
    /// redo stack. None when there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward again: returns the next snapshot and parks `current`
    /// on the undo stack. None when there is nothing to redo.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

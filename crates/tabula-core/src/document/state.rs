//! Sheet state: the one engine instance that owns a document's cells.

use tabula_engine::engine::{CellRef, DependencyGraph, Evaluator, parse};

use super::cell::CellStore;
use super::history::{HistoryManager, Selection, Snapshot};

/// A single open spreadsheet document.
///
/// Owns the cell store, the dependency graph, the evaluator and the
/// undo/redo history. All mutation is synchronous and single-threaded:
/// every edit runs to completion, cascading recalculation included,
/// before the next is accepted. The sheet itself never performs I/O;
/// a host persists via [`Sheet::snapshot`].
pub struct Sheet {
    pub(crate) cells: CellStore,
    pub(crate) graph: DependencyGraph,
    pub(crate) evaluator: Evaluator,
    pub(crate) history: HistoryManager,
    pub(crate) active_cell: Option<CellRef>,
    pub(crate) selection: Option<Selection>,
    /// True while applying history or batch-importing: replayed mutations
    /// must not push history entries of their own.
    pub(crate) replaying: bool,
}

impl Sheet {
    pub fn new() -> Self {
        Sheet {
            cells: CellStore::new(),
            graph: DependencyGraph::new(),
            evaluator: Evaluator::new(),
            history: HistoryManager::new(),
            active_cell: None,
            selection: None,
            replaying: false,
        }
    }

    /// Full-state snapshot for history and host-side persistence.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cells: self.cells.clone(),
            active_cell: self.active_cell.clone(),
            selection: self.selection.clone(),
        }
    }

    pub(crate) fn record_history(&mut self, before: Snapshot) {
        if !self.replaying {
            self.history.push(before);
        }
    }

    /// Rebuild every dependency edge from the stored formulas. Used after
    /// wholesale cell replacement (undo/redo, import with clear).
    pub(crate) fn rebuild_graph(&mut self) {
        self.graph.clear();
        let formulas: Vec<(CellRef, String)> = self
            .cells
            .iter()
            .filter_map(|(cell_ref, cell)| {
                cell.formula
                    .as_ref()
                    .map(|f| (cell_ref.clone(), f.clone()))
            })
            .collect();
        for (cell_ref, formula) in formulas {
            if let Some(parsed) = parse(&formula) {
                self.graph.set_dependencies(&cell_ref, &parsed.dependencies);
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn active_cell(&self) -> Option<&CellRef> {
        self.active_cell.as_ref()
    }

    /// Set the active cell. Cursor movement is not an edit; no history.
    pub fn set_active_cell(&mut self, cell_ref: Option<CellRef>) {
        self.active_cell = cell_ref;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Set the selection rectangle. No history.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    pub fn cells(&self) -> &CellStore {
        &self.cells
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

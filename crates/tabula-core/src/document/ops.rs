//! The mutation pipeline: cell edits, cascading recalculation, undo/redo.

use std::collections::HashSet;

use tabula_engine::engine::{CellRef, parse};

use super::cell::{Cell, CellFormat, CellStore};
use super::state::Sheet;
use crate::error::{Result, SheetError};

/// Formula chains deeper than this are treated as an internal error while
/// depth-ranking; the committed graph is acyclic, so only pathological
/// inputs can get near it.
const MAX_DEPENDENCY_DEPTH: usize = 64;

fn parse_id(id: &str) -> Result<CellRef> {
    CellRef::from_str(id).ok_or_else(|| SheetError::InvalidCellRef(id.to_string()))
}

/// Resolver used during recalculation. Precedence: a formula cell's cached
/// calculated value, then the raw value parsed as a number; absent, empty
/// and non-numeric cells are unresolvable.
fn resolve_in(cells: &CellStore) -> impl Fn(&CellRef) -> Option<f64> + '_ {
    move |cell_ref: &CellRef| {
        let cell = cells.get(cell_ref)?;
        if cell.is_formula() {
            if let Some(calc) = &cell.calculated_value {
                if let Ok(n) = calc.parse::<f64>() {
                    return Some(n);
                }
            }
        }
        let raw = cell.raw_value.trim();
        if raw.is_empty() {
            return None;
        }
        raw.parse::<f64>().ok()
    }
}

impl Sheet {
    /// Write raw content into a cell and recalculate everything affected.
    ///
    /// Plain input clears any formula state; `=`-prefixed input is parsed,
    /// wired into the dependency graph (cycle-forming edges are rejected
    /// softly) and evaluated immediately. Dependent formula cells are then
    /// refreshed in ascending dependency-depth order. One history snapshot
    /// per edit, taken from the pre-mutation state.
    pub fn set_cell(&mut self, id: &str, raw_value: &str) -> Result<()> {
        let cell_ref = parse_id(id)?;

        // No-op writes must not pollute history.
        if let Some(existing) = self.cells.get(&cell_ref) {
            if existing.raw_value == raw_value {
                self.active_cell = Some(cell_ref);
                return Ok(());
            }
        }

        let before = self.snapshot();
        self.active_cell = Some(cell_ref.clone());

        self.write_cell(&cell_ref, raw_value);
        self.recalculate_dependents(&cell_ref);

        self.record_history(before);
        Ok(())
    }

    /// Clear a cell's content (formatting survives) and refresh dependents.
    pub fn delete_cell(&mut self, id: &str) -> Result<()> {
        let cell_ref = parse_id(id)?;
        if self.cells.get(&cell_ref).is_none() {
            return Ok(());
        }

        let before = self.snapshot();
        self.graph.clear_dependencies(&cell_ref);
        self.cells.delete(&cell_ref);
        self.recalculate_dependents(&cell_ref);
        self.record_history(before);
        Ok(())
    }

    /// Merge formatting into a cell, materializing it if absent.
    /// Formatting is orthogonal to computation; no recalculation happens.
    pub fn set_format(&mut self, id: &str, format: &CellFormat) -> Result<()> {
        self.set_format_many(std::slice::from_ref(&id), format)
    }

    /// Merge the same formatting into several cells under one history entry.
    pub fn set_format_many<S: AsRef<str>>(&mut self, ids: &[S], format: &CellFormat) -> Result<()> {
        let mut refs = Vec::with_capacity(ids.len());
        for id in ids {
            refs.push(parse_id(id.as_ref())?);
        }

        let before = self.snapshot();
        for cell_ref in refs {
            let cell = self.cells.entry(&cell_ref);
            match &mut cell.format {
                Some(existing) => existing.merge(format),
                None => cell.format = Some(format.clone()),
            }
        }
        self.record_history(before);
        Ok(())
    }

    /// Calculated value for formula cells, raw value otherwise. Unknown or
    /// invalid ids display as empty.
    pub fn get_display_value(&self, id: &str) -> String {
        let Some(cell_ref) = CellRef::from_str(id) else {
            return String::new();
        };
        self.display_value(&cell_ref)
    }

    pub(crate) fn display_value(&self, cell_ref: &CellRef) -> String {
        let Some(cell) = self.cells.get(cell_ref) else {
            return String::new();
        };
        if cell.is_formula() {
            cell.calculated_value
                .clone()
                .or_else(|| cell.error.clone())
                .unwrap_or_default()
        } else {
            cell.raw_value.clone()
        }
    }

    pub fn is_formula(&self, id: &str) -> bool {
        CellRef::from_str(id)
            .and_then(|cell_ref| self.cells.get(&cell_ref).map(Cell::is_formula))
            .unwrap_or(false)
    }

    pub fn get_error(&self, id: &str) -> Option<String> {
        let cell_ref = CellRef::from_str(id)?;
        self.cells.get(&cell_ref)?.error.clone()
    }

    /// Restore the previous snapshot. The restore is a replay: it rebuilds
    /// the dependency graph and pushes nothing onto history itself.
    pub fn undo(&mut self) -> Result<()> {
        let current = self.snapshot();
        let previous = self
            .history
            .undo(current)
            .ok_or(SheetError::NothingToUndo)?;
        self.restore(previous);
        Ok(())
    }

    /// Reapply the next snapshot after an undo.
    pub fn redo(&mut self) -> Result<()> {
        let current = self.snapshot();
        let next = self.history.redo(current).ok_or(SheetError::NothingToRedo)?;
        self.restore(next);
        Ok(())
    }

    fn restore(&mut self, snapshot: super::history::Snapshot) {
        self.replaying = true;
        self.cells = snapshot.cells;
        self.active_cell = snapshot.active_cell;
        self.selection = snapshot.selection;
        self.rebuild_graph();
        self.replaying = false;
    }

    /// Re-evaluate every formula cell in the document in dependency-depth
    /// order. Used after bulk loads where streaming order may have
    /// evaluated a formula before its inputs existed.
    pub fn recalculate_all(&mut self) {
        self.rebuild_graph();
        let mut formula_cells: Vec<CellRef> = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.is_formula())
            .map(|(cell_ref, _)| cell_ref.clone())
            .collect();
        formula_cells.sort_by_cached_key(|c| (self.dependency_depth(c), c.clone()));
        for cell_ref in formula_cells {
            self.refresh_formula_cell(&cell_ref);
        }
    }

    fn write_cell(&mut self, cell_ref: &CellRef, raw_value: &str) {
        let format = self.cells.get(cell_ref).and_then(|c| c.format.clone());

        match parse(raw_value) {
            Some(parsed) => {
                self.graph.set_dependencies(cell_ref, &parsed.dependencies);
                let result = {
                    let resolve = resolve_in(&self.cells);
                    self.evaluator.calculate(&parsed, &resolve)
                };
                self.cells.set(
                    cell_ref.clone(),
                    Cell {
                        raw_value: raw_value.to_string(),
                        formula: Some(raw_value.to_string()),
                        calculated_value: Some(result.value),
                        error: result.error,
                        format,
                    },
                );
            }
            None => {
                self.graph.clear_dependencies(cell_ref);
                self.cells.set(
                    cell_ref.clone(),
                    Cell {
                        raw_value: raw_value.to_string(),
                        formula: None,
                        calculated_value: None,
                        error: None,
                        format,
                    },
                );
            }
        }
    }

    /// Refresh every formula cell affected by a change to `changed`,
    /// shallowest dependency chains first so each cell sees fresh inputs.
    /// Best-effort under soft-rejected edges; failures stay cell-local and
    /// never abort the batch.
    pub(crate) fn recalculate_dependents(&mut self, changed: &CellRef) {
        let mut affected = self.graph.evaluation_order(changed);
        affected.sort_by_cached_key(|c| (self.dependency_depth(c), c.clone()));
        for cell_ref in affected {
            if &cell_ref == changed {
                continue;
            }
            self.refresh_formula_cell(&cell_ref);
        }
    }

    fn refresh_formula_cell(&mut self, cell_ref: &CellRef) {
        let Some(formula) = self
            .cells
            .get(cell_ref)
            .and_then(|cell| cell.formula.clone())
        else {
            return; // non-formula dependents are never touched
        };
        let Some(parsed) = parse(&formula) else {
            return;
        };
        let result = {
            let resolve = resolve_in(&self.cells);
            self.evaluator.calculate(&parsed, &resolve)
        };
        if let Some(cell) = self.cells.get_mut(cell_ref) {
            cell.calculated_value = Some(result.value);
            cell.error = result.error;
        }
    }

    /// Longest chain of committed dependency edges below a cell. Ranks the
    /// recalculation batch. Only edges that passed the cycle check exist in
    /// the graph, so a soft-rejected reference is never walked and revisits
    /// along one walk are internal errors rather than loops.
    pub(crate) fn dependency_depth(&self, cell_ref: &CellRef) -> usize {
        let mut walking = HashSet::new();
        self.depth_walk(cell_ref, &mut walking)
    }

    fn depth_walk(&self, cell_ref: &CellRef, walking: &mut HashSet<CellRef>) -> usize {
        if !self.cells.get(cell_ref).is_some_and(Cell::is_formula) {
            return 0;
        }
        let deps = match self.graph.dependencies_of(cell_ref) {
            Some(deps) if !deps.is_empty() => deps,
            _ => return 1,
        };

        if !walking.insert(cell_ref.clone()) {
            log::error!("dependency depth walk revisited {}", cell_ref);
            return MAX_DEPENDENCY_DEPTH;
        }
        if walking.len() > MAX_DEPENDENCY_DEPTH {
            log::error!(
                "dependency chain below {} exceeds {} levels",
                cell_ref,
                MAX_DEPENDENCY_DEPTH
            );
            walking.remove(cell_ref);
            return MAX_DEPENDENCY_DEPTH;
        }

        let mut max_depth = 0;
        for dep in deps {
            if dep == cell_ref {
                continue;
            }
            max_depth = max_depth.max(self.depth_walk(dep, walking) + 1);
        }

        walking.remove(cell_ref);
        max_depth
    }
}

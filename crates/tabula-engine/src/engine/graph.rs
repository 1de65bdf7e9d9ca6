//! Cell dependency graph.
//!
//! Tracks "cell A's formula reads cell B" edges in both directions: the
//! forward map answers "what does this cell read" and the inverse map
//! answers "who must recompute when this cell changes". Edges are only
//! inserted after a cycle check, so at rest the graph is always acyclic;
//! an edge that would close a cycle is rejected with a logged warning and
//! nothing else (the formula keeps whatever value it produced, it simply
//! never refreshes when the phantom dependency changes).

use std::collections::{HashMap, HashSet};

use super::CellRef;

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// cell -> cells its formula reads
    depends_on: HashMap<CellRef, HashSet<CellRef>>,
    /// cell -> cells whose formulas read it
    dependents: HashMap<CellRef, HashSet<CellRef>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all outgoing edges from a cell. Called before re-adding a
    /// cell's fresh dependency set on every edit.
    pub fn clear_dependencies(&mut self, cell: &CellRef) {
        if let Some(deps) = self.depends_on.remove(cell) {
            for dep in deps {
                if let Some(set) = self.dependents.get_mut(&dep) {
                    set.remove(cell);
                    if set.is_empty() {
                        self.dependents.remove(&dep);
                    }
                }
            }
        }
    }

    /// Insert the edge `cell -> depends_on_cell` unless it would close a
    /// cycle. Returns false when the edge was rejected.
    pub fn add_dependency(&mut self, cell: &CellRef, depends_on_cell: &CellRef) -> bool {
        if self.has_circular_dependency(depends_on_cell, cell) {
            log::warn!(
                "circular dependency rejected: {} depends on {}, which already depends on {}",
                cell,
                depends_on_cell,
                cell
            );
            return false;
        }
        self.depends_on
            .entry(cell.clone())
            .or_default()
            .insert(depends_on_cell.clone());
        self.dependents
            .entry(depends_on_cell.clone())
            .or_default()
            .insert(cell.clone());
        true
    }

    /// Replace a cell's outgoing edges with a fresh dependency set,
    /// cycle-checking each edge individually.
    pub fn set_dependencies(&mut self, cell: &CellRef, deps: &[CellRef]) {
        self.clear_dependencies(cell);
        for dep in deps {
            self.add_dependency(cell, dep);
        }
    }

    /// True iff `from` reads `target`, directly or transitively (a cell
    /// trivially reaches itself, so a self-edge is always circular).
    pub fn has_circular_dependency(&self, from: &CellRef, target: &CellRef) -> bool {
        let mut stack = vec![from.clone()];
        let mut visited = HashSet::new();

        while let Some(current) = stack.pop() {
            if &current == target {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(deps) = self.depends_on.get(&current) {
                stack.extend(deps.iter().cloned());
            }
        }
        false
    }

    /// All cells that must recompute because `cell` changed: the transitive
    /// closure of dependents, excluding `cell` itself. Completeness only;
    /// the caller ranks the result by dependency depth before evaluating.
    pub fn evaluation_order(&self, cell: &CellRef) -> Vec<CellRef> {
        let mut affected = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(cell.clone());
        let mut stack = vec![cell.clone()];

        while let Some(current) = stack.pop() {
            if let Some(deps) = self.dependents.get(&current) {
                for dependent in deps {
                    if visited.insert(dependent.clone()) {
                        affected.push(dependent.clone());
                        stack.push(dependent.clone());
                    }
                }
            }
        }
        affected
    }

    /// Drop every edge.
    pub fn clear(&mut self) {
        self.depends_on.clear();
        self.dependents.clear();
    }

    /// The cells a given cell's formula reads, if any edges are registered.
    pub fn dependencies_of(&self, cell: &CellRef) -> Option<&HashSet<CellRef>> {
        self.depends_on.get(cell)
    }
}

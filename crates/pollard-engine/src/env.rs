//! Variable bindings into the buffered tree.
//!
//! The evaluator binds query variables to buffered nodes as matches close.
//! Reclamation can free a bound node at any time, so after every batch of
//! sign-offs the evaluator feeds the freed handles back through
//! `retain_reachable` to drop bindings that now dangle.

use indexmap::IndexMap;

use pollard_core::Var;

use crate::buffer::BufId;

/// Bindings of one evaluation scope, in insertion order.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: IndexMap<Var, Vec<BufId>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a match for `var`. A variable accumulates one node per match.
    pub fn bind(&mut self, var: Var, node: BufId) {
        self.bindings.entry(var).or_default().push(node);
    }

    /// Matches bound to `var` so far, in document order.
    pub fn get(&self, var: Var) -> &[BufId] {
        self.bindings.get(&var).map_or(&[], Vec::as_slice)
    }

    /// Remove all matches for `var`, returning them.
    pub fn unbind(&mut self, var: Var) -> Vec<BufId> {
        self.bindings.shift_remove(&var).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Var, &[BufId])> {
        self.bindings
            .iter()
            .map(|(&var, nodes)| (var, nodes.as_slice()))
    }

    /// Drop every binding whose node was just reclaimed.
    pub fn retain_reachable(&mut self, freed: &[BufId]) {
        for nodes in self.bindings.values_mut() {
            nodes.retain(|node| !freed.contains(node));
        }
        self.bindings.retain(|_, nodes| !nodes.is_empty());
    }
}

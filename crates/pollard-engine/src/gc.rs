//! Reclamation of buffered nodes.
//!
//! A node is reclaimable when it is closed, its subtree holds no outstanding
//! role claim, and no inherited cumulative role is still pending on an
//! ancestor. Sign-offs are the only thing that drives counts down, so
//! reclamation runs from there, plus a cheap check when a roleless node
//! closes.

use pollard_core::{RoleId, RoleKind, RoleTable};

use crate::buffer::{BufId, BufferTree};
use crate::error::GcError;

impl BufferTree {
    /// Retire one claim of `role` on `node`.
    ///
    /// Returns the nodes reclaimed as a consequence, in detach order. The
    /// caller decides what to do with handles into freed territory.
    pub fn sign_off(
        &mut self,
        role: RoleId,
        node: BufId,
        table: &RoleTable,
    ) -> Result<Vec<BufId>, GcError> {
        let stale = GcError::StaleSignOff {
            role: role.as_u32(),
            node: node.as_u32(),
        };
        if !self.is_alive(node) {
            return Err(stale);
        }
        if !self.node_mut(node).own.remove(role) {
            return Err(stale);
        }
        self.bump_sub_totals(node, -1);

        let mut freed = Vec::new();
        if table.kind(role) == RoleKind::Cumulative {
            // Descendants pinned only by this (node, role) pair may be free.
            self.sweep_subtree(node, &mut freed);
        }
        if self.is_alive(node) {
            self.reclaim_upward(node, &mut freed);
        }
        Ok(freed)
    }

    /// Check the node just closed, typically a roleless intermediate whose
    /// retained descendants have all been reclaimed already.
    pub fn reap_on_close(&mut self, node: BufId) -> Vec<BufId> {
        let mut freed = Vec::new();
        self.reclaim_upward(node, &mut freed);
        freed
    }

    /// Closed, no outstanding claim anywhere below, and no pending inherited
    /// cumulative role.
    pub fn reclaimable(&self, id: BufId) -> bool {
        let node = self.node(id);
        node.closed && node.sub_total == 0 && !self.inherited_pending(id)
    }

    /// Is some cumulative role this node inherited still outstanding on its
    /// ancestor? The ancestor is alive whenever this node is: freeing always
    /// takes whole subtrees, descendants first.
    pub fn inherited_pending(&self, id: BufId) -> bool {
        self.node(id)
            .inherited
            .iter()
            .any(|&(anc, role)| self.role_count(anc, role) > 0)
    }

    /// Free the topmost reclaimable node on the chain from `from` to the
    /// root, subtree and all. The chain stops at the first node that is
    /// still pinned; nothing above it can be free either.
    fn reclaim_upward(&mut self, from: BufId, freed: &mut Vec<BufId>) {
        let mut target = None;
        let mut cur = from;
        while cur != self.root() && self.reclaimable(cur) {
            target = Some(cur);
            cur = self.parent(cur).expect("non-root node without parent");
        }
        if let Some(id) = target {
            self.detach(id);
            self.free_subtree(id, freed);
        }
    }

    /// Free every reclaimable subtree strictly below `node`.
    fn sweep_subtree(&mut self, node: BufId, freed: &mut Vec<BufId>) {
        let children: Vec<BufId> = self.children(node).collect();
        for child in children {
            if self.reclaimable(child) {
                self.detach(child);
                self.free_subtree(child, freed);
            } else {
                self.sweep_subtree(child, freed);
            }
        }
    }

    fn detach(&mut self, id: BufId) {
        if let Some(parent) = self.parent(id) {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
    }

    fn free_subtree(&mut self, id: BufId, freed: &mut Vec<BufId>) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child, freed);
        }
        self.release_slot(id);
        freed.push(id);
    }
}

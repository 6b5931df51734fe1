//! Retention roles.
//!
//! A role is one reason a buffered subtree must not yet be discarded: an
//! active variable binding, an unresolved path continuation, or a pending
//! predicate. Roles are created by query analysis, numbered densely, and
//! immutable for the lifetime of one query run; the buffer tracks how many
//! times each role currently pins each node.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identity of a query variable, assigned by analysis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Var(pub u32);

/// Dense handle into a `RoleTable`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct RoleId(u32);

impl RoleId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

/// How far a role's claim reaches.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleKind {
    /// Pins the node it is counted on and, by inheritance, every descendant
    /// appended while the role is outstanding.
    Cumulative,
    /// Pins exactly the node it is counted on.
    NonCumulative,
}

/// Behavior markers of a role beyond its kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleFlags {
    /// The role only needs a witness that a match exists, not its content.
    pub existence_only: bool,
    /// Matched subtrees contribute to query output, so character data is kept.
    pub output: bool,
    /// Matched subtrees are re-emitted verbatim, never navigated into.
    /// Implies `output`.
    pub verbatim: bool,
}

/// One reason a subtree may still be needed.
#[derive(Clone, Copy, Debug)]
pub struct Role {
    pub id: RoleId,
    pub kind: RoleKind,
    /// The variable whose evaluation this role serves.
    pub var: Var,
    pub flags: RoleFlags,
}

/// All roles of one query run, indexed by `RoleId`. Built once, immutable.
#[derive(Debug, Default)]
pub struct RoleTable {
    roles: Vec<Role>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a role, returning its dense id. Verbatim implies output.
    pub fn push(&mut self, kind: RoleKind, var: Var, mut flags: RoleFlags) -> RoleId {
        flags.output |= flags.verbatim;
        let id = RoleId(self.roles.len() as u32);
        self.roles.push(Role { id, kind, var, flags });
        id
    }

    /// # Panics
    /// Panics if the id was not created by this table.
    #[inline]
    pub fn get(&self, id: RoleId) -> &Role {
        &self.roles[id.0 as usize]
    }

    #[inline]
    pub fn kind(&self, id: RoleId) -> RoleKind {
        self.get(id).kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }
}

/// A small role multiset: role id → outstanding count.
///
/// Buffer nodes carry one of these as a manual reference count. Iteration
/// order is insertion order, which keeps dumps and tests deterministic.
#[derive(Debug, Clone, Default)]
pub struct RoleCounts {
    counts: IndexMap<RoleId, u32>,
}

impl RoleCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more claim of `role`.
    pub fn add(&mut self, role: RoleId) {
        *self.counts.entry(role).or_insert(0) += 1;
    }

    /// Release one claim of `role`. Returns `false` if the role has no
    /// outstanding count here; the caller surfaces that as a consistency
    /// error, it is never absorbed.
    #[must_use]
    pub fn remove(&mut self, role: RoleId) -> bool {
        match self.counts.get_mut(&role) {
            Some(n) if *n > 0 => {
                *n -= 1;
                if *n == 0 {
                    self.counts.shift_remove(&role);
                }
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn count(&self, role: RoleId) -> u32 {
        self.counts.get(&role).copied().unwrap_or(0)
    }

    /// Total outstanding claims across all roles.
    #[inline]
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (RoleId, u32)> + '_ {
        self.counts.iter().map(|(&id, &n)| (id, n))
    }
}

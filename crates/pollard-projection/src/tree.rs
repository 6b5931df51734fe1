//! The projection tree: the merge of every navigation path the query may take.
//!
//! Each node is an (axis, tag-test) pair. Two paths share a node exactly when
//! axis and test agree, so the tree is a trie over steps. Roles terminate at
//! the node their path ends on; `finalize` then derives, per node, how much of
//! a matching input subtree must be retained.

use pollard_core::{Axis, RoleId, RoleTable, Step, TagTest};

/// Handle into a `ProjectionTree` arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PathNodeId(u32);

impl PathNodeId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Retention class of a tree node, ordered by how much is kept.
///
/// - `Aux`: position matters for matching, the node itself is not buffered.
/// - `Dom`: the node is buffered structurally (element shell, no text).
/// - `Out`: the node's content is needed too (text, or verbatim re-emission).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Class {
    Aux,
    Dom,
    Out,
}

/// One node of the projection tree.
#[derive(Debug)]
pub struct PathNode {
    pub step: Step,
    /// Roles whose path terminates here.
    pub roles: Vec<RoleId>,
    pub children: Vec<PathNodeId>,
    /// Derived: how much of a matching subtree is retained.
    pub class: Class,
    /// Derived: every terminating role only needs a witness, and no path
    /// continues below, so one buffered match per scope suffices.
    pub existence_only: bool,
    /// Derived: matching subtrees are serialized verbatim, not built
    /// structurally.
    pub verbatim: bool,
}

/// Arena-owned projection tree. Built once per query run, then immutable.
#[derive(Debug)]
pub struct ProjectionTree {
    nodes: Vec<PathNode>,
    root: PathNodeId,
}

impl ProjectionTree {
    /// Create a tree holding only the synthetic document-root node.
    pub fn new() -> Self {
        let root = PathNode {
            step: Step::new(Axis::Stay, TagTest::Wildcard),
            roles: Vec::new(),
            children: Vec::new(),
            class: Class::Dom,
            existence_only: false,
            verbatim: false,
        };
        Self {
            nodes: vec![root],
            root: PathNodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> PathNodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: PathNodeId) -> &PathNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false // the root always exists
    }

    /// Merge a path into the tree, returning the node its last step lands on.
    ///
    /// Steps are matched against existing children by (axis, test) equality;
    /// missing suffixes are appended.
    pub fn add_path(&mut self, steps: &[Step]) -> PathNodeId {
        let mut cur = self.root;
        for &step in steps {
            cur = self.child_for(cur, step);
        }
        cur
    }

    /// Attach a terminating role to a node.
    pub fn add_role(&mut self, node: PathNodeId, role: RoleId) {
        self.nodes[node.0 as usize].roles.push(role);
    }

    fn child_for(&mut self, parent: PathNodeId, step: Step) -> PathNodeId {
        let existing = self.nodes[parent.0 as usize]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0 as usize].step == step);
        if let Some(id) = existing {
            return id;
        }

        let id = PathNodeId(self.nodes.len() as u32);
        self.nodes.push(PathNode {
            step,
            roles: Vec::new(),
            children: Vec::new(),
            class: Class::Aux,
            existence_only: false,
            verbatim: false,
        });
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    /// Derive per-node retention classes and markers from the attached roles.
    ///
    /// Called once, after all paths and roles are in. A node with a verbatim
    /// role is `Out` and verbatim; a node with any other role is at least
    /// `Dom`; a role-free node is `Aux` (the stream-side automaton may still
    /// promote it when child/descendant identity is syntactically ambiguous).
    pub fn finalize(&mut self, roles: &RoleTable) {
        for node in &mut self.nodes[1..] {
            let mut class = Class::Aux;
            let mut all_existence = !node.roles.is_empty();
            let mut all_verbatim = !node.roles.is_empty();
            for &rid in &node.roles {
                let role = roles.get(rid);
                let wanted = if role.flags.output {
                    Class::Out
                } else {
                    Class::Dom
                };
                class = class.max(wanted);
                all_existence &= role.flags.existence_only;
                all_verbatim &= role.flags.verbatim;
            }
            node.class = class;
            node.existence_only = all_existence && node.children.is_empty();
            node.verbatim = all_verbatim;
        }
    }

    /// Steps of `parent`'s children, for the stream-side automaton's
    /// child/descendant ambiguity check.
    pub fn child_steps(&self, parent: PathNodeId) -> impl Iterator<Item = Step> + '_ {
        self.nodes[parent.0 as usize]
            .children
            .iter()
            .map(|&c| self.nodes[c.0 as usize].step)
    }
}

impl Default for ProjectionTree {
    fn default() -> Self {
        Self::new()
    }
}

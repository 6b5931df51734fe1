//! The buffered tree of retained fragments.
//!
//! Nodes live in a slab arena with a free list: the tracker appends and
//! closes only at the frontier (the most recently opened, unclosed node),
//! while the collector detaches and frees out of band. There is no other
//! relocation.
//!
//! Every node carries its own role multiset plus an append-time snapshot of
//! the cumulative roles already outstanding on its ancestors, the pairs
//! that keep the node pinned without copying counts into every descendant.

use std::fmt::Write as _;

use pollard_core::{Name, NameTable, RoleCounts, RoleId, RoleKind, RoleTable};

/// Handle to a buffered node. Stable until the node is reclaimed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufId(u32);

impl BufId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// What a buffered node is.
#[derive(Debug)]
pub enum NodeKind {
    /// The synthetic document root.
    Document,
    /// An element retained structurally.
    Element(Name),
    /// Character data under an output-class element. Always closed.
    Text(String),
    /// A subtree retained as serialized markup, not structure.
    Verbatim { name: Name, markup: String },
}

#[derive(Debug)]
pub(crate) struct BufNode {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<BufId>,
    pub(crate) children: Vec<BufId>,
    pub(crate) closed: bool,
    /// Roles counted directly on this node.
    pub(crate) own: RoleCounts,
    /// Cumulative roles outstanding on an ancestor when this node was
    /// appended. The ancestor outlives this node by construction (freeing an
    /// ancestor frees its whole subtree), so the ids never dangle.
    pub(crate) inherited: Vec<(BufId, RoleId)>,
    /// Outstanding role claims in this node's subtree, own included.
    pub(crate) sub_total: u32,
}

/// The buffer of one query run.
#[derive(Debug)]
pub struct BufferTree {
    pub(crate) slots: Vec<Option<BufNode>>,
    free: Vec<u32>,
    frontier: BufId,
    live: usize,
}

impl BufferTree {
    pub fn new() -> Self {
        let root = BufNode {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
            closed: false,
            own: RoleCounts::new(),
            inherited: Vec::new(),
            sub_total: 0,
        };
        Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            frontier: BufId(0),
            live: 1,
        }
    }

    #[inline]
    pub fn root(&self) -> BufId {
        BufId(0)
    }

    /// Currently live node count (document root included).
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    #[inline]
    pub(crate) fn frontier(&self) -> BufId {
        self.frontier
    }

    pub(crate) fn node(&self, id: BufId) -> &BufNode {
        self.slots[id.0 as usize]
            .as_ref()
            .expect("access to reclaimed buffer node")
    }

    pub(crate) fn node_mut(&mut self, id: BufId) -> &mut BufNode {
        self.slots[id.0 as usize]
            .as_mut()
            .expect("access to reclaimed buffer node")
    }

    /// Append an open element at the frontier and make it the new frontier.
    ///
    /// `roles` are the role ids the projection assigns here; every one of
    /// them lands in the node's own multiset. A nested match of a cumulative
    /// path is a distinct binding with a distinct claim, so it counts on its
    /// own node in addition to inheriting pending status from the ancestor
    /// match.
    pub fn append_element(
        &mut self,
        name: Name,
        roles: impl IntoIterator<Item = RoleId>,
        table: &RoleTable,
    ) -> BufId {
        let id = self.push_node(NodeKind::Element(name), roles, table, false);
        self.frontier = id;
        id
    }

    /// Append a witness element: open and immediately closed, never frontier.
    pub fn append_witness(
        &mut self,
        name: Name,
        roles: impl IntoIterator<Item = RoleId>,
        table: &RoleTable,
    ) -> BufId {
        self.push_node(NodeKind::Element(name), roles, table, true)
    }

    /// Append a verbatim node at the frontier and make it the new frontier.
    /// Its markup starts with the open tag.
    pub fn append_verbatim(
        &mut self,
        name: Name,
        tag: &str,
        roles: impl IntoIterator<Item = RoleId>,
        table: &RoleTable,
    ) -> BufId {
        let mut markup = String::new();
        let _ = write!(markup, "<{tag}>");
        let id = self.push_node(NodeKind::Verbatim { name, markup }, roles, table, false);
        self.frontier = id;
        id
    }

    /// Append character data under the frontier. Text is a closed leaf.
    pub fn append_text(&mut self, content: &str, table: &RoleTable) -> BufId {
        self.push_node(NodeKind::Text(content.to_owned()), std::iter::empty(), table, true)
    }

    fn push_node(
        &mut self,
        kind: NodeKind,
        roles: impl IntoIterator<Item = RoleId>,
        table: &RoleTable,
        closed: bool,
    ) -> BufId {
        let parent = self.frontier;

        let mut own = RoleCounts::new();
        for role in roles {
            own.add(role);
        }
        // Snapshot the cumulative roles active on the open ancestor chain.
        let mut inherited = Vec::new();
        self.collect_inherited(parent, table, &mut inherited);

        let claims = own.total();
        let node = BufNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            closed,
            own,
            inherited,
            sub_total: claims,
        };

        let id = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(node);
                BufId(slot)
            }
            None => {
                let id = BufId(self.slots.len() as u32);
                self.slots.push(Some(node));
                id
            }
        };

        self.node_mut(parent).children.push(id);
        self.bump_sub_totals(parent, claims as i64);
        self.live += 1;
        id
    }

    /// Record (ancestor, role) pairs for every cumulative role outstanding on
    /// the open ancestor chain at append time. This is the conservative
    /// coverage policy: roles activated on an ancestor later do not pin this
    /// node.
    fn collect_inherited(
        &self,
        from: BufId,
        table: &RoleTable,
        inherited: &mut Vec<(BufId, RoleId)>,
    ) {
        let mut cur = Some(from);
        while let Some(id) = cur {
            let node = self.node(id);
            for (role, count) in node.own.iter() {
                if count > 0 && table.kind(role) == RoleKind::Cumulative {
                    inherited.push((id, role));
                }
            }
            cur = node.parent;
        }
    }

    pub(crate) fn bump_sub_totals(&mut self, from: BufId, delta: i64) {
        let mut cur = Some(from);
        while let Some(id) = cur {
            let node = self.node_mut(id);
            node.sub_total = (node.sub_total as i64 + delta) as u32;
            cur = node.parent;
        }
    }

    /// Close the frontier and move it back to the parent. Returns the node
    /// just closed.
    ///
    /// # Panics
    /// Panics if the frontier is the document root; the tracker's balance
    /// guard never lets that happen.
    pub fn close_frontier(&mut self) -> BufId {
        let id = self.frontier;
        let node = self.node_mut(id);
        node.closed = true;
        self.frontier = node.parent.expect("close on the document root");
        id
    }

    /// Append serialized markup for an open tag inside a verbatim node.
    pub fn verbatim_open_tag(&mut self, id: BufId, tag: &str) {
        let NodeKind::Verbatim { markup, .. } = &mut self.node_mut(id).kind else {
            panic!("verbatim markup on a non-verbatim node");
        };
        let _ = write!(markup, "<{tag}>");
    }

    pub fn verbatim_close_tag(&mut self, id: BufId, tag: &str) {
        let NodeKind::Verbatim { markup, .. } = &mut self.node_mut(id).kind else {
            panic!("verbatim markup on a non-verbatim node");
        };
        let _ = write!(markup, "</{tag}>");
    }

    pub fn verbatim_text(&mut self, id: BufId, content: &str) {
        let NodeKind::Verbatim { markup, .. } = &mut self.node_mut(id).kind else {
            panic!("verbatim markup on a non-verbatim node");
        };
        escape_into(markup, content);
    }

    pub(crate) fn release_slot(&mut self, id: BufId) {
        self.slots[id.0 as usize] = None;
        self.free.push(id.0);
        self.live -= 1;
    }

    // ---- evaluator-facing reads ----

    #[inline]
    pub fn is_alive(&self, id: BufId) -> bool {
        self.slots
            .get(id.0 as usize)
            .is_some_and(|slot| slot.is_some())
    }

    pub fn is_closed(&self, id: BufId) -> bool {
        self.node(id).closed
    }

    pub fn kind(&self, id: BufId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Element or verbatim tag name; `None` for the root and text nodes.
    pub fn name(&self, id: BufId) -> Option<Name> {
        match self.node(id).kind {
            NodeKind::Element(name) | NodeKind::Verbatim { name, .. } => Some(name),
            NodeKind::Document | NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: BufId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(content) => Some(content),
            _ => None,
        }
    }

    pub fn markup(&self, id: BufId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Verbatim { markup, .. } => Some(markup),
            _ => None,
        }
    }

    pub fn parent(&self, id: BufId) -> Option<BufId> {
        self.node(id).parent
    }

    /// Children in document order.
    pub fn children(&self, id: BufId) -> impl Iterator<Item = BufId> + '_ {
        self.node(id).children.iter().copied()
    }

    /// Strict ancestors, nearest first, ending at the document root.
    pub fn ancestors(&self, id: BufId) -> impl Iterator<Item = BufId> + '_ {
        let mut cur = self.node(id).parent;
        std::iter::from_fn(move || {
            let id = cur?;
            cur = self.node(id).parent;
            Some(id)
        })
    }

    /// Outstanding count of `role` on exactly this node.
    pub fn role_count(&self, id: BufId, role: RoleId) -> u32 {
        self.node(id).own.count(role)
    }

    /// Indented one-line-per-node dump for debugging and snapshot tests.
    pub fn dump(&self, names: &NameTable) -> String {
        let mut out = String::new();
        self.dump_node(&mut out, names, self.root(), 0);
        out
    }

    fn dump_node(&self, out: &mut String, names: &NameTable, id: BufId, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        let node = self.node(id);
        match &node.kind {
            NodeKind::Document => out.push_str("doc"),
            NodeKind::Element(name) => {
                let _ = write!(out, "<{}>", names.resolve(*name));
            }
            NodeKind::Text(content) => {
                let _ = write!(out, "{content:?}");
            }
            NodeKind::Verbatim { markup, .. } => {
                let _ = write!(out, "verbatim {markup:?}");
            }
        }
        if !node.closed {
            out.push_str(" open");
        }
        if !node.own.is_empty() {
            out.push_str(" [");
            for (i, (role, count)) in node.own.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "r{}x{count}", role.as_u32());
            }
            out.push(']');
        }
        out.push('\n');
        for &child in &node.children {
            self.dump_node(out, names, child, depth + 1);
        }
    }
}

impl Default for BufferTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape character data for verbatim serialization.
pub(crate) fn escape_into(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

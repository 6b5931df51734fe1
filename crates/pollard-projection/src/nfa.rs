//! The projection NFA, compiled once from the projection tree.
//!
//! States live in an arena and reference each other through opaque `NfaId`
//! handles with per-state transition tables; the positive/negative state
//! pairs of descendant steps are mutually linked, and handles sidestep the
//! ownership cycle. Polarity encodes the descendant trick: a negative state
//! means "scanning for the first occurrence of the step's tag, excluding the
//! tag itself from re-recursion".

use pollard_core::{Axis, Name, TagTest};

use crate::tree::{PathNodeId, ProjectionTree};

/// Handle into the NFA state arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NfaId(u32);

impl NfaId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Whether a state is a real match position or a descendant-scan exclusion.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Polarity {
    Positive,
    Negative,
}

/// Label of a non-epsilon transition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum On {
    /// Exactly this tag.
    Tag(Name),
    /// Any tag except this one.
    NotTag(Name),
    /// Any tag.
    Any,
}

impl On {
    #[inline]
    pub fn matches(self, tag: Name) -> bool {
        match self {
            On::Tag(t) => t == tag,
            On::NotTag(t) => t != tag,
            On::Any => true,
        }
    }
}

#[derive(Debug)]
struct NfaState {
    tree: PathNodeId,
    polarity: Polarity,
    /// Non-epsilon transitions. Two or three entries at most in practice,
    /// so a flat list beats a map.
    edges: Vec<(On, NfaId)>,
    /// Zero-width transitions (stay and descendant-or-self steps).
    eps: Vec<NfaId>,
}

/// The compiled projection NFA.
#[derive(Debug)]
pub struct Nfa {
    states: Vec<NfaState>,
    start: NfaId,
}

impl Nfa {
    /// Compile the NFA from a finalized projection tree.
    pub fn build(tree: &ProjectionTree) -> Self {
        let mut nfa = Self {
            states: Vec::new(),
            start: NfaId(0),
        };
        let start = nfa.alloc(tree.root(), Polarity::Positive);
        nfa.start = start;
        nfa.build_from(tree, tree.root(), start);
        nfa
    }

    fn alloc(&mut self, tree: PathNodeId, polarity: Polarity) -> NfaId {
        let id = NfaId(self.states.len() as u32);
        self.states.push(NfaState {
            tree,
            polarity,
            edges: Vec::new(),
            eps: Vec::new(),
        });
        id
    }

    fn edge(&mut self, from: NfaId, on: On, to: NfaId) {
        self.states[from.0 as usize].edges.push((on, to));
    }

    fn epsilon(&mut self, from: NfaId, to: NfaId) {
        self.states[from.0 as usize].eps.push(to);
    }

    /// Recursive construction over positive tree nodes.
    fn build_from(&mut self, tree: &ProjectionTree, node: PathNodeId, state: NfaId) {
        for &child in &tree.node(node).children {
            let step = tree.node(child).step;
            match step.axis {
                Axis::Child => {
                    let pos = self.alloc(child, Polarity::Positive);
                    let on = match step.test {
                        TagTest::Tag(t) => On::Tag(t),
                        TagTest::Wildcard => On::Any,
                    };
                    self.edge(state, on, pos);
                    self.build_from(tree, child, pos);
                }
                Axis::Stay => {
                    let pos = self.alloc(child, Polarity::Positive);
                    self.epsilon(state, pos);
                    self.build_from(tree, child, pos);
                }
                Axis::DescendantOrSelf => {
                    // The node itself and everything below it.
                    let pos = self.alloc(child, Polarity::Positive);
                    self.epsilon(state, pos);
                    self.edge(pos, On::Any, pos);
                    self.build_from(tree, child, pos);
                }
                Axis::Descendant => match step.test {
                    TagTest::Wildcard => {
                        // "not t" is unreachable for the universal test, so
                        // the negative partner is omitted.
                        let pos = self.alloc(child, Polarity::Positive);
                        self.edge(state, On::Any, pos);
                        self.edge(pos, On::Any, pos);
                        self.build_from(tree, child, pos);
                    }
                    TagTest::Tag(t) => {
                        // Skip until the first t, then behave as a direct
                        // match; re-enter scanning below each match.
                        let pos = self.alloc(child, Polarity::Positive);
                        let neg = self.alloc(child, Polarity::Negative);
                        self.edge(state, On::Tag(t), pos);
                        self.edge(state, On::NotTag(t), neg);
                        self.edge(pos, On::Tag(t), pos);
                        self.edge(pos, On::NotTag(t), neg);
                        self.edge(neg, On::Tag(t), pos);
                        self.edge(neg, On::NotTag(t), neg);
                        self.build_from(tree, child, pos);
                    }
                },
            }
        }
    }

    #[inline]
    pub fn start(&self) -> NfaId {
        self.start
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn tree_node(&self, id: NfaId) -> PathNodeId {
        self.states[id.0 as usize].tree
    }

    #[inline]
    pub fn polarity(&self, id: NfaId) -> Polarity {
        self.states[id.0 as usize].polarity
    }

    #[inline]
    pub fn edges(&self, id: NfaId) -> &[(On, NfaId)] {
        &self.states[id.0 as usize].edges
    }

    #[inline]
    pub fn epsilons(&self, id: NfaId) -> &[NfaId] {
        &self.states[id.0 as usize].eps
    }

    /// All state handles, in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NfaId> + 'static {
        (0..self.states.len() as u32).map(NfaId)
    }

    /// The epsilon closure of the start state: the initial live set.
    pub fn initial(&self) -> Vec<NfaId> {
        let mut set = vec![self.start];
        self.close_over_epsilon(&mut set);
        set.sort();
        set.dedup();
        set
    }

    /// All states reachable from `from` on `tag`: matching non-epsilon
    /// transitions first, then the epsilon closure of the targets.
    ///
    /// The result is sorted and deduplicated, so equal live sets compare
    /// equal; the stream-side automaton uses this to share states.
    pub fn step_set(&self, from: &[NfaId], tag: Name) -> Vec<NfaId> {
        let mut out = Vec::new();
        for &id in from {
            for &(on, to) in self.edges(id) {
                if on.matches(tag) {
                    out.push(to);
                }
            }
        }
        self.close_over_epsilon(&mut out);
        out.sort();
        out.dedup();
        out
    }

    /// Extend `set` with everything reachable over epsilon edges.
    /// Epsilon edges never form cycles (they follow the tree downward), but
    /// the scan is worklist-based anyway so a bad input cannot hang us.
    fn close_over_epsilon(&self, set: &mut Vec<NfaId>) {
        let mut i = 0;
        while i < set.len() {
            let id = set[i];
            for &to in &self.states[id.0 as usize].eps {
                if !set.contains(&to) {
                    set.push(to);
                }
            }
            i += 1;
        }
    }
}

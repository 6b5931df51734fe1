//! The projection DFA, subset-constructed lazily while the stream runs.
//!
//! States live in an arena and form a tree discovered per parent: taking a
//! tag transition from a state either reuses a cached child or unions the
//! reachable NFA sets and allocates one. A cached `None` entry is the "no
//! transition" sentinel; the subtree under such a tag is consumed by the
//! state's skip-depth counter instead of by states.
//!
//! The state chain above the current state always mirrors the open,
//! non-skipped ancestor chain of the stream prefix.

use indexmap::IndexMap;

use pollard_core::{Axis, Name, RoleId, RoleKind, TagTest};
use pollard_projection::{Class, NfaId, Polarity, Projection};

/// Handle into the DFA state arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DfaId(u32);

impl DfaId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Result of an open-event transition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Open {
    /// Moved into the given state.
    Entered(DfaId),
    /// Moved into an existence-check state for the first time under its
    /// anchor; the caller buffers one witness. The witnessed flag is already
    /// raised.
    Witness(DfaId),
    /// Re-entry under a still-witnessed existence state; the subtree is
    /// consumed by skip counting, nothing is buffered.
    Suppressed,
    /// No live transition (or already skipping); skip depth was incremented.
    Skipped,
}

/// Result of a close event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Close {
    /// The close ended one level of a skipped subtree; position unchanged.
    StillSkipping,
    /// The close matched a real entry; position returned to the parent.
    Returned(DfaId),
}

#[derive(Debug)]
struct DfaState {
    /// Epsilon-closed, sorted, deduplicated origin set.
    origins: Vec<NfaId>,
    parent: Option<DfaId>,
    /// Cached transitions; `None` is the "no transition" sentinel.
    trans: IndexMap<Name, Option<DfaId>>,
    /// Children deduplicated by origin set: two tags leading to the same
    /// live set share one state.
    children: Vec<DfaId>,
    /// While positive, the position is inside an unmatched subtree below
    /// this state; closes decrement instead of moving.
    skip_depth: u32,
    cum_roles: Vec<RoleId>,
    noncum_roles: Vec<RoleId>,
    class: Class,
    verbatim: bool,
    /// Eligible existence-check state: every origin positive and
    /// existence-only.
    existence: bool,
    witnessed: bool,
    /// Existence-check states registered on this state as their anchor;
    /// cleared when this state closes.
    anchored: Vec<DfaId>,
}

/// The lazily built projection DFA of one query run.
#[derive(Debug)]
pub struct Dfa<'p> {
    projection: &'p Projection,
    states: Vec<DfaState>,
}

impl<'p> Dfa<'p> {
    pub fn new(projection: &'p Projection) -> Self {
        let mut dfa = Self {
            projection,
            states: Vec::new(),
        };
        let origins = projection.nfa().initial();
        dfa.alloc(origins, None);
        dfa
    }

    /// The state before the first open event.
    #[inline]
    pub fn root(&self) -> DfaId {
        DfaId(0)
    }

    /// Number of constructed states. Stable across cached transitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn class(&self, id: DfaId) -> Class {
        self.states[id.0 as usize].class
    }

    #[inline]
    pub fn verbatim(&self, id: DfaId) -> bool {
        self.states[id.0 as usize].verbatim
    }

    #[inline]
    pub fn existence(&self, id: DfaId) -> bool {
        self.states[id.0 as usize].existence
    }

    #[inline]
    pub fn witnessed(&self, id: DfaId) -> bool {
        self.states[id.0 as usize].witnessed
    }

    #[inline]
    pub fn skip_depth(&self, id: DfaId) -> u32 {
        self.states[id.0 as usize].skip_depth
    }

    #[inline]
    pub fn parent(&self, id: DfaId) -> Option<DfaId> {
        self.states[id.0 as usize].parent
    }

    #[inline]
    pub fn cum_roles(&self, id: DfaId) -> &[RoleId] {
        &self.states[id.0 as usize].cum_roles
    }

    #[inline]
    pub fn noncum_roles(&self, id: DfaId) -> &[RoleId] {
        &self.states[id.0 as usize].noncum_roles
    }

    /// Take the transition for an open event at `cur`.
    pub fn open(&mut self, cur: DfaId, tag: Name) -> Open {
        if self.states[cur.0 as usize].skip_depth > 0 {
            self.states[cur.0 as usize].skip_depth += 1;
            return Open::Skipped;
        }

        if let Some(&cached) = self.states[cur.0 as usize].trans.get(&tag) {
            return match cached {
                Some(next) => self.enter(cur, next),
                None => {
                    self.states[cur.0 as usize].skip_depth = 1;
                    Open::Skipped
                }
            };
        }

        // Uncached: compute the reachable live set once and memoize.
        let targets = self
            .projection
            .nfa()
            .step_set(&self.states[cur.0 as usize].origins, tag);
        if targets.is_empty() {
            self.states[cur.0 as usize].trans.insert(tag, None);
            self.states[cur.0 as usize].skip_depth = 1;
            return Open::Skipped;
        }

        // Share a child when some other tag already produced this live set.
        let existing = self.states[cur.0 as usize]
            .children
            .iter()
            .copied()
            .find(|&c| self.states[c.0 as usize].origins == targets);
        let next = match existing {
            Some(id) => id,
            None => self.alloc(targets, Some(cur)),
        };
        self.states[cur.0 as usize].trans.insert(tag, Some(next));
        self.enter(cur, next)
    }

    fn enter(&mut self, cur: DfaId, next: DfaId) -> Open {
        if self.states[next.0 as usize].existence {
            if self.states[next.0 as usize].witnessed {
                // Witness already buffered under the current anchor scope.
                self.states[cur.0 as usize].skip_depth = 1;
                return Open::Suppressed;
            }
            self.states[next.0 as usize].witnessed = true;
            return Open::Witness(next);
        }
        Open::Entered(next)
    }

    /// Mirror a close event at `cur`.
    ///
    /// # Panics
    /// Panics if called on the root state with no skip outstanding; the
    /// tracker's balance guard rejects such closes first.
    pub fn close(&mut self, cur: DfaId) -> Close {
        let state = &mut self.states[cur.0 as usize];
        if state.skip_depth > 0 {
            state.skip_depth -= 1;
            return Close::StillSkipping;
        }

        // Leaving this element resets the witness scopes anchored here.
        let anchored = std::mem::take(&mut self.states[cur.0 as usize].anchored);
        for &dep in &anchored {
            self.states[dep.0 as usize].witnessed = false;
        }
        self.states[cur.0 as usize].anchored = anchored;

        let parent = self.states[cur.0 as usize]
            .parent
            .expect("close on the pre-document state");
        Close::Returned(parent)
    }

    fn alloc(&mut self, origins: Vec<NfaId>, parent: Option<DfaId>) -> DfaId {
        let (cum_roles, noncum_roles) = self.gather_roles(&origins);
        let class = self.derive_class(&origins, parent);
        let verbatim = class == Class::Out && self.all_positive_verbatim(&origins);
        let existence = self.is_existence(&origins);

        let id = DfaId(self.states.len() as u32);
        self.states.push(DfaState {
            origins,
            parent,
            trans: IndexMap::new(),
            children: Vec::new(),
            skip_depth: 0,
            cum_roles,
            noncum_roles,
            class,
            verbatim,
            existence,
            witnessed: false,
            anchored: Vec::new(),
        });

        if let Some(p) = parent {
            self.states[p.0 as usize].children.push(id);
        }
        if existence {
            let anchor = self.find_anchor(id);
            self.states[anchor.0 as usize].anchored.push(id);
        }
        id
    }

    /// Roles terminating on the positive origins, split by kind.
    fn gather_roles(&self, origins: &[NfaId]) -> (Vec<RoleId>, Vec<RoleId>) {
        let nfa = self.projection.nfa();
        let tree = self.projection.tree();
        let roles = self.projection.roles();

        let mut cum = Vec::new();
        let mut noncum = Vec::new();
        for &o in origins {
            if nfa.polarity(o) != Polarity::Positive {
                continue;
            }
            for &rid in &tree.node(nfa.tree_node(o)).roles {
                match roles.kind(rid) {
                    RoleKind::Cumulative => cum.push(rid),
                    RoleKind::NonCumulative => noncum.push(rid),
                }
            }
        }
        (cum, noncum)
    }

    /// Max origin class; an aux result is promoted to dom when the parent's
    /// origin tree nodes make the child/descendant reading of some tag
    /// syntactically ambiguous (over-retention is safe, under-retention not).
    fn derive_class(&self, origins: &[NfaId], parent: Option<DfaId>) -> Class {
        let nfa = self.projection.nfa();
        let tree = self.projection.tree();

        let mut class = Class::Aux;
        for &o in origins {
            if nfa.polarity(o) != Polarity::Positive {
                continue;
            }
            class = class.max(tree.node(nfa.tree_node(o)).class);
            if class == Class::Out {
                return Class::Out;
            }
        }

        if class == Class::Aux
            && let Some(p) = parent
            && self.parent_has_ambiguous_tag(p)
        {
            return Class::Dom;
        }
        class
    }

    /// Does some tag occur both as a child step and as a descendant step
    /// among the children of this state's origin tree nodes?
    fn parent_has_ambiguous_tag(&self, parent: DfaId) -> bool {
        let nfa = self.projection.nfa();
        let tree = self.projection.tree();

        let mut child_tags = Vec::new();
        let mut desc_tags = Vec::new();
        for &o in &self.states[parent.0 as usize].origins {
            for step in tree.child_steps(nfa.tree_node(o)) {
                let TagTest::Tag(t) = step.test else { continue };
                match step.axis {
                    Axis::Child => child_tags.push(t),
                    Axis::Descendant => desc_tags.push(t),
                    Axis::DescendantOrSelf | Axis::Stay => {}
                }
            }
        }
        child_tags.iter().any(|t| desc_tags.contains(t))
    }

    fn all_positive_verbatim(&self, origins: &[NfaId]) -> bool {
        let nfa = self.projection.nfa();
        let tree = self.projection.tree();
        let mut saw_positive = false;
        for &o in origins {
            if nfa.polarity(o) != Polarity::Positive {
                continue;
            }
            saw_positive = true;
            if !tree.node(nfa.tree_node(o)).verbatim {
                return false;
            }
        }
        saw_positive
    }

    fn is_existence(&self, origins: &[NfaId]) -> bool {
        let nfa = self.projection.nfa();
        let tree = self.projection.tree();
        !origins.is_empty()
            && origins.iter().all(|&o| {
                nfa.polarity(o) == Polarity::Positive
                    && tree.node(nfa.tree_node(o)).existence_only
            })
    }

    /// Nearest strict ancestor with a positive origin and a non-aux class.
    /// The walk always terminates: the root state is positive and dom.
    fn find_anchor(&self, of: DfaId) -> DfaId {
        let nfa = self.projection.nfa();
        let mut cur = self.states[of.0 as usize].parent;
        while let Some(id) = cur {
            let st = &self.states[id.0 as usize];
            let positive = st
                .origins
                .iter()
                .any(|&o| nfa.polarity(o) == Polarity::Positive);
            if positive && st.class != Class::Aux {
                return id;
            }
            cur = st.parent;
        }
        self.root()
    }
}

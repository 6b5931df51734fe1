//! The stream tracker: the per-event decision loop.
//!
//! The driving parser feeds open, text, and close events in document order.
//! For each one the tracker consults the projection DFA and does the minimal
//! buffer work the answer requires: append a structural node, buffer an
//! existence witness, serialize into a verbatim node, or nothing at all. The
//! evaluator gets node handles back from `close` and retires them through
//! `sign_off`.
//!
//! The tracker keeps a parallel stack of what it did per open, so close
//! events undo exactly the right thing without re-deriving the decision.

use pollard_core::{Name, NameTable, RoleId, RoleTable};
use pollard_projection::{Class, Projection};

use crate::buffer::{BufId, BufferTree};
use crate::dfa::{Close, Dfa, DfaId, Open};
use crate::error::{GcError, StreamError};
use crate::trace::{NoopTracer, Tracer};

/// Resource guards for one run.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    max_depth: u32,
}

impl Limits {
    pub fn max_depth(mut self, limit: u32) -> Self {
        self.max_depth = limit;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_depth: 4096 }
    }
}

/// What the tracker did for one open event that entered a state. Skipped and
/// suppressed opens push nothing; the DFA's skip counter covers them.
#[derive(Debug)]
enum OpenAction {
    /// Appended an open element; the frontier moved.
    Structural,
    /// Buffered a closed existence witness; the frontier did not move.
    Witness(BufId),
    /// Entered an aux state without touching the buffer.
    Aux,
    /// Opened a verbatim node; everything below is serialized markup.
    VerbatimRoot(Name),
    /// An element inside a verbatim subtree. The DFA was not consulted.
    VerbatimInner(Name),
}

/// Event-driven front end over the DFA, the buffer, and the collector.
pub struct StreamTracker<'p, T: Tracer = NoopTracer> {
    dfa: Dfa<'p>,
    roles: &'p RoleTable,
    cur: DfaId,
    buffer: BufferTree,
    names: NameTable,
    actions: Vec<OpenAction>,
    depth: u32,
    limits: Limits,
    tracer: T,
    /// The verbatim node currently absorbing markup, if any.
    verbatim_open: Option<BufId>,
    unreachable: Vec<BufId>,
}

impl<'p, T: Tracer> StreamTracker<'p, T> {
    /// Consume an element open event.
    pub fn open(&mut self, tag: &str) -> Result<(), StreamError> {
        self.tracer.trace_open(tag);
        if self.depth >= self.limits.max_depth {
            return Err(StreamError::DepthLimitExceeded {
                limit: self.limits.max_depth,
            });
        }
        self.depth += 1;

        if let Some(node) = self.verbatim_open {
            let name = self.names.intern(tag);
            self.buffer.verbatim_open_tag(node, tag);
            self.actions.push(OpenAction::VerbatimInner(name));
            return Ok(());
        }

        let name = self.names.intern(tag);
        match self.dfa.open(self.cur, name) {
            Open::Skipped => {
                self.tracer.trace_skip(self.dfa.skip_depth(self.cur));
            }
            Open::Suppressed => {
                self.tracer.trace_witness(true);
            }
            Open::Witness(next) => {
                let roles = self.state_roles(next);
                let node = self.buffer.append_witness(name, roles, self.roles);
                self.tracer.trace_witness(false);
                self.tracer.trace_append(node);
                self.tracer.trace_enter(next);
                self.actions.push(OpenAction::Witness(node));
                self.cur = next;
            }
            Open::Entered(next) => {
                self.tracer.trace_enter(next);
                if self.dfa.verbatim(next) {
                    let roles = self.state_roles(next);
                    let node = self.buffer.append_verbatim(name, tag, roles, self.roles);
                    self.tracer.trace_append(node);
                    self.verbatim_open = Some(node);
                    self.actions.push(OpenAction::VerbatimRoot(name));
                } else if self.dfa.class(next) == Class::Aux {
                    self.actions.push(OpenAction::Aux);
                } else {
                    let roles = self.state_roles(next);
                    let node = self.buffer.append_element(name, roles, self.roles);
                    self.tracer.trace_append(node);
                    self.actions.push(OpenAction::Structural);
                }
                self.cur = next;
            }
        }
        Ok(())
    }

    /// Consume a character data event. Text survives only inside a verbatim
    /// subtree or directly under a buffered output-class element.
    pub fn text(&mut self, content: &str) {
        if let Some(node) = self.verbatim_open {
            self.buffer.verbatim_text(node, content);
            self.tracer.trace_text(content.len(), true);
            return;
        }
        let kept = self.dfa.skip_depth(self.cur) == 0
            && self.dfa.class(self.cur) == Class::Out
            && matches!(self.actions.last(), Some(OpenAction::Structural));
        if kept {
            let node = self.buffer.append_text(content, self.roles);
            self.tracer.trace_append(node);
        }
        self.tracer.trace_text(content.len(), kept);
    }

    /// Consume an element close event. Returns the buffered node the closed
    /// element corresponds to, if the element was retained and is still alive
    /// after close-time reclamation.
    pub fn close(&mut self) -> Result<Option<BufId>, StreamError> {
        self.tracer.trace_close();
        if self.depth == 0 {
            return Err(StreamError::UnbalancedClose);
        }
        self.depth -= 1;

        if self.verbatim_open.is_some() {
            if let Some(OpenAction::VerbatimInner(name)) = self.actions.last() {
                let name = *name;
                self.actions.pop();
                let node = self.verbatim_open.expect("verbatim node while absorbing");
                self.buffer.verbatim_close_tag(node, self.names.resolve(name));
                return Ok(None);
            }
            // Falls through: this close ends the verbatim root itself.
        }

        match self.dfa.close(self.cur) {
            Close::StillSkipping => Ok(None),
            Close::Returned(parent) => {
                let action = self.actions.pop().expect("action stack out of sync");
                self.cur = parent;
                match action {
                    OpenAction::Structural => {
                        let node = self.buffer.close_frontier();
                        let freed = self.buffer.reap_on_close(node);
                        let gone = freed.contains(&node);
                        self.note_freed(freed);
                        Ok(if gone { None } else { Some(node) })
                    }
                    OpenAction::Witness(node) => Ok(Some(node)),
                    OpenAction::Aux => Ok(None),
                    OpenAction::VerbatimRoot(name) => {
                        let node = self.verbatim_open.take().expect("verbatim root on stack");
                        self.buffer.verbatim_close_tag(node, self.names.resolve(name));
                        let closed = self.buffer.close_frontier();
                        debug_assert_eq!(closed, node);
                        Ok(Some(node))
                    }
                    OpenAction::VerbatimInner(_) => {
                        unreachable!("verbatim inner close handled before the DFA")
                    }
                }
            }
        }
    }

    /// Declare the end of input.
    pub fn finish(&self) -> Result<(), StreamError> {
        if self.depth > 0 {
            return Err(StreamError::UnclosedElements { open: self.depth });
        }
        Ok(())
    }

    /// Retire one claim of `role` on `node` on the evaluator's behalf and
    /// reclaim whatever that unpins.
    pub fn sign_off(&mut self, role: RoleId, node: BufId) -> Result<(), GcError> {
        self.tracer.trace_sign_off(role, node);
        let freed = self.buffer.sign_off(role, node, self.roles)?;
        self.note_freed(freed);
        Ok(())
    }

    /// Node handles freed since the last drain. The evaluator uses these to
    /// drop stale bindings (see `Environment::retain_reachable`).
    pub fn drain_unreachable(&mut self) -> Vec<BufId> {
        std::mem::take(&mut self.unreachable)
    }

    pub fn buffer(&self) -> &BufferTree {
        &self.buffer
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    pub fn dfa(&self) -> &Dfa<'p> {
        &self.dfa
    }

    /// Open element nesting depth of the input consumed so far.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    fn state_roles(&self, state: DfaId) -> Vec<RoleId> {
        self.dfa
            .cum_roles(state)
            .iter()
            .chain(self.dfa.noncum_roles(state))
            .copied()
            .collect()
    }

    fn note_freed(&mut self, freed: Vec<BufId>) {
        for &node in &freed {
            self.tracer.trace_reclaim(node);
        }
        self.unreachable.extend(freed);
    }
}

/// Builds a `StreamTracker` over a compiled projection.
///
/// The name table must be the one the projection was compiled against, so
/// that tag names in the stream resolve to the same handles the DFA
/// transitions on.
pub struct TrackerBuilder<'p> {
    projection: &'p Projection,
    names: NameTable,
    limits: Limits,
}

impl<'p> TrackerBuilder<'p> {
    pub fn new(projection: &'p Projection, names: NameTable) -> Self {
        Self {
            projection,
            names,
            limits: Limits::default(),
        }
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> StreamTracker<'p, NoopTracer> {
        self.build_with_tracer(NoopTracer)
    }

    pub fn build_with_tracer<T: Tracer>(self, tracer: T) -> StreamTracker<'p, T> {
        let dfa = Dfa::new(self.projection);
        let root = dfa.root();
        StreamTracker {
            dfa,
            roles: self.projection.roles(),
            cur: root,
            buffer: BufferTree::new(),
            names: self.names,
            actions: Vec::new(),
            depth: 0,
            limits: self.limits,
            tracer,
            verbatim_open: None,
            unreachable: Vec::new(),
        }
    }
}

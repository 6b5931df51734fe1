//! Tracing seam for the stream tracker.
//!
//! The tracker is generic over a `Tracer`. `NoopTracer`'s empty default
//! methods are optimized away completely, so production runs pay nothing;
//! `PrintTracer` narrates event handling to stderr for debugging.

use pollard_core::RoleId;

use crate::buffer::BufId;
use crate::dfa::DfaId;

/// Observer of tracker decisions. All methods default to no-ops.
pub trait Tracer {
    fn trace_open(&mut self, _tag: &str) {}
    fn trace_close(&mut self) {}
    fn trace_text(&mut self, _len: usize, _kept: bool) {}
    /// A transition was taken into `state`.
    fn trace_enter(&mut self, _state: DfaId) {}
    /// The event had no live transition; `depth` is the skip depth after it.
    fn trace_skip(&mut self, _depth: u32) {}
    /// A buffer node was appended.
    fn trace_append(&mut self, _node: BufId) {}
    /// An existence witness was buffered (`suppressed = false`) or a
    /// re-entry was suppressed under a still-witnessed anchor.
    fn trace_witness(&mut self, _suppressed: bool) {}
    fn trace_sign_off(&mut self, _role: RoleId, _node: BufId) {}
    fn trace_reclaim(&mut self, _node: BufId) {}
}

/// Tracer that does nothing; calls compile away.
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Tracer that narrates to stderr.
pub struct PrintTracer;

impl Tracer for PrintTracer {
    fn trace_open(&mut self, tag: &str) {
        eprintln!("open <{tag}>");
    }

    fn trace_close(&mut self) {
        eprintln!("close");
    }

    fn trace_text(&mut self, len: usize, kept: bool) {
        eprintln!("text ({len} bytes) {}", if kept { "kept" } else { "dropped" });
    }

    fn trace_enter(&mut self, state: DfaId) {
        eprintln!("  enter state d{}", state.as_u32());
    }

    fn trace_skip(&mut self, depth: u32) {
        eprintln!("  skip (depth {depth})");
    }

    fn trace_append(&mut self, node: BufId) {
        eprintln!("  append n{}", node.as_u32());
    }

    fn trace_witness(&mut self, suppressed: bool) {
        if suppressed {
            eprintln!("  witness suppressed");
        } else {
            eprintln!("  witness buffered");
        }
    }

    fn trace_sign_off(&mut self, role: RoleId, node: BufId) {
        eprintln!("sign off r{} on n{}", role.as_u32(), node.as_u32());
    }

    fn trace_reclaim(&mut self, node: BufId) {
        eprintln!("  reclaim n{}", node.as_u32());
    }
}

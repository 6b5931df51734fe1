#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! The streaming side of pollard: everything driven by input events.
//!
//! A compiled `Projection` (see `pollard-projection`) goes in; open/text/close
//! events from an external parser drive the lazily built projection DFA; the
//! stream tracker decides, per event, whether to buffer, skip, or serialize;
//! the buffered tree holds retained fragments annotated with role multisets;
//! the collector frees fragments the moment no role justifies them.
//!
//! Memory is the governed resource: buffer size is bounded by currently
//! outstanding roles, not by how much of the stream has been consumed.

mod buffer;
mod dfa;
mod env;
mod error;
mod gc;
mod trace;
mod tracker;

#[cfg(test)]
mod buffer_tests;
#[cfg(test)]
mod dfa_tests;

pub use buffer::{BufId, BufferTree, NodeKind};
pub use dfa::{Close, Dfa, DfaId, Open};
pub use env::Environment;
pub use error::{GcError, StreamError};
pub use tracker::{Limits, StreamTracker, TrackerBuilder};
pub use trace::{NoopTracer, PrintTracer, Tracer};

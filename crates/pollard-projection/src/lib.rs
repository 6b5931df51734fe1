#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Once-per-query construction of the projection automaton inputs.
//!
//! Query analysis hands us a flat inventory of navigation paths and roles;
//! this crate merges the paths into a projection tree, classifies every tree
//! node by how much of a matching subtree must be retained, and compiles the
//! tree into a projection NFA. The lazily built DFA that actually runs over
//! the stream lives in `pollard-engine`.
//!
//! - `inventory` - the analysis-supplied input and its compilation entry point
//! - `tree` - the merged projection tree
//! - `nfa` - the projection NFA
//! - `dump` - human-readable dumps for debugging and snapshot tests

mod dump;
mod error;
mod inventory;
mod nfa;
mod tree;

#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod inventory_tests;
#[cfg(test)]
mod tree_tests;

pub use dump::{dump_nfa, dump_tree};
pub use error::BuildError;
pub use inventory::{Inventory, PathEntry, Projection, RoleEntry, StepEntry};
pub use nfa::{Nfa, NfaId, On, Polarity};
pub use tree::{Class, PathNode, PathNodeId, ProjectionTree};

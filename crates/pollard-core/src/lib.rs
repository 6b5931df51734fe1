#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared across the pollard workspace.
//!
//! Everything a query run needs before any stream event arrives:
//! - `interner` - tag/variable name interning (`Name`, `NameTable`)
//! - `step` - the path step vocabulary (`Axis`, `TagTest`, `Step`)
//! - `role` - retention roles and role multisets (`Role`, `RoleTable`,
//!   `RoleCounts`)
//!
//! All registries here are explicit values constructed once per query run and
//! passed by reference into the automaton and buffer. There is no process-wide
//! state, so several runs can coexist in one process.

mod interner;
mod role;
mod step;


pub use interner::{Name, NameTable};
pub use role::{Role, RoleCounts, RoleFlags, RoleId, RoleKind, RoleTable, Var};
pub use step::{Axis, Step, TagTest};

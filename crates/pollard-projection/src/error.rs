//! Errors surfaced while compiling an inventory into a projection.
//!
//! All of these are analysis-time: once `Inventory::compile` succeeds, the
//! automaton is total over tags and no construction error can occur at
//! runtime.

use pollard_core::Var;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    /// A path entry with no steps has nothing to project.
    #[error("path for variable ${0:?} has no steps")]
    EmptyPath(Var),

    /// A role cannot both need only a witness and re-emit its match verbatim.
    #[error("role for variable ${0:?} is both existence-only and verbatim")]
    ExistenceVerbatimClash(Var),
}

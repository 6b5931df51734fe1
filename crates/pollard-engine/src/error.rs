//! Errors surfaced while consuming the stream or releasing roles.
//!
//! Both kinds are collaborator bugs, not recoverable conditions: the walk is
//! deterministic and single-pass, so an inconsistency means the driving
//! parser or the evaluator misbehaved, and there is no retry path.

#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    /// A close event arrived with no element open.
    #[error("close event without a matching open")]
    UnbalancedClose,

    /// The stream ended with elements still open.
    #[error("stream ended with {open} unclosed elements")]
    UnclosedElements { open: u32 },

    /// Element nesting exceeded the configured guard.
    #[error("open depth exceeded the limit of {limit}")]
    DepthLimitExceeded { limit: u32 },
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GcError {
    /// Sign-off for a role/node pair that is not outstanding: the node was
    /// already reclaimed, never existed, or never carried that role.
    /// Absorbing this silently would corrupt the role multiset invariant.
    #[error("stale sign-off: role r{role} is not outstanding on node n{node}")]
    StaleSignOff { role: u32, node: u32 },
}

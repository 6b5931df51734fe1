//! Path step vocabulary.
//!
//! A projection path is a sequence of steps, each an axis plus a tag test.
//! These are the only axes the buffered-tree core understands; richer axes
//! are rewritten into these by the query analysis that feeds us.

use serde::{Deserialize, Serialize};

use crate::interner::Name;

/// Navigation axis of a path step.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    /// Direct children of the context node.
    Child,
    /// All proper descendants. Compiles to a positive/negative state pair
    /// in the projection NFA.
    Descendant,
    /// The context node and all descendants. Used for fragments that are
    /// re-emitted verbatim; compiles to an any-tag self loop.
    DescendantOrSelf,
    /// The context node itself. Zero-width; compiles to an epsilon edge.
    Stay,
}

/// Tag test of a path step, after interning.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TagTest {
    /// Matches exactly this tag.
    Tag(Name),
    /// Matches any tag.
    Wildcard,
}

impl TagTest {
    /// Does this test accept the given tag?
    #[inline]
    pub fn accepts(self, tag: Name) -> bool {
        match self {
            TagTest::Tag(t) => t == tag,
            TagTest::Wildcard => true,
        }
    }
}

/// One step of a projection path.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Step {
    pub axis: Axis,
    pub test: TagTest,
}

impl Step {
    pub fn new(axis: Axis, test: TagTest) -> Self {
        Self { axis, test }
    }
}

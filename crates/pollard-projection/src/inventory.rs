//! The analysis-supplied path/role inventory and its compilation.
//!
//! Query analysis, the parser and rewriter living above this crate, boils a
//! query down to one `Inventory`: per variable, the navigation paths the
//! evaluation may take, each terminated by a role saying why (and how much of)
//! a matching subtree must be retained. The inventory is plain serde-friendly
//! data so harnesses can feed it from JSON.
//!
//! `Inventory::compile` is the single entry point: it interns tags, numbers
//! roles, merges the paths into a projection tree and compiles the NFA.

use serde::{Deserialize, Serialize};

use pollard_core::{Axis, NameTable, RoleFlags, RoleKind, RoleTable, Step, TagTest, Var};

use crate::error::BuildError;
use crate::nfa::Nfa;
use crate::tree::ProjectionTree;

/// One step of a path, before tag interning. `tag: None` is the wildcard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEntry {
    pub axis: Axis,
    #[serde(default)]
    pub tag: Option<String>,
}

/// Why a match of the owning path must be retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEntry {
    pub kind: RoleKind,
    #[serde(default)]
    pub existence_only: bool,
    #[serde(default)]
    pub output: bool,
    #[serde(default)]
    pub verbatim: bool,
}

/// One navigation path of one variable, with its terminating role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathEntry {
    pub var: u32,
    pub steps: Vec<StepEntry>,
    pub role: RoleEntry,
}

/// Everything query analysis tells the projection core, in one value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub paths: Vec<PathEntry>,
}

/// The compiled, immutable projection of one query run.
#[derive(Debug)]
pub struct Projection {
    tree: ProjectionTree,
    nfa: Nfa,
    roles: RoleTable,
}

impl Projection {
    #[inline]
    pub fn tree(&self) -> &ProjectionTree {
        &self.tree
    }

    #[inline]
    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    #[inline]
    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }
}

impl Inventory {
    /// Compile the inventory into a projection, interning tags into `names`.
    ///
    /// Fails fast on malformed entries; a successful compile means the
    /// runtime automaton is total over tags.
    pub fn compile(&self, names: &mut NameTable) -> Result<Projection, BuildError> {
        let mut tree = ProjectionTree::new();
        let mut roles = RoleTable::new();

        for path in &self.paths {
            let var = Var(path.var);
            if path.steps.is_empty() {
                return Err(BuildError::EmptyPath(var));
            }
            if path.role.existence_only && path.role.verbatim {
                return Err(BuildError::ExistenceVerbatimClash(var));
            }

            let steps: Vec<Step> = path
                .steps
                .iter()
                .map(|s| {
                    let test = match &s.tag {
                        Some(tag) => TagTest::Tag(names.intern(tag)),
                        None => TagTest::Wildcard,
                    };
                    Step::new(s.axis, test)
                })
                .collect();

            let terminal = tree.add_path(&steps);
            let role = roles.push(
                path.role.kind,
                var,
                RoleFlags {
                    existence_only: path.role.existence_only,
                    output: path.role.output,
                    verbatim: path.role.verbatim,
                },
            );
            tree.add_role(terminal, role);
        }

        tree.finalize(&roles);
        let nfa = Nfa::build(&tree);

        Ok(Projection { tree, nfa, roles })
    }
}

/// Convenience constructors for building inventories in code.
impl PathEntry {
    pub fn new(var: u32, steps: Vec<StepEntry>, role: RoleEntry) -> Self {
        Self { var, steps, role }
    }
}

impl StepEntry {
    pub fn child(tag: &str) -> Self {
        Self {
            axis: Axis::Child,
            tag: Some(tag.to_owned()),
        }
    }

    pub fn descendant(tag: &str) -> Self {
        Self {
            axis: Axis::Descendant,
            tag: Some(tag.to_owned()),
        }
    }

    pub fn wildcard_child() -> Self {
        Self {
            axis: Axis::Child,
            tag: None,
        }
    }

    pub fn subtree() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            tag: None,
        }
    }
}

impl RoleEntry {
    pub fn binding(kind: RoleKind) -> Self {
        Self {
            kind,
            existence_only: false,
            output: false,
            verbatim: false,
        }
    }

    pub fn existence(kind: RoleKind) -> Self {
        Self {
            kind,
            existence_only: true,
            output: false,
            verbatim: false,
        }
    }

    pub fn verbatim(kind: RoleKind) -> Self {
        Self {
            kind,
            existence_only: false,
            output: true,
            verbatim: true,
        }
    }
}

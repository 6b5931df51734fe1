//! Human-readable dumps of the projection tree and NFA.
//!
//! Used by snapshot tests and for debugging inventories; the formats are
//! stable line-per-node/line-per-edge text.

use std::fmt::Write as _;

use pollard_core::{NameTable, RoleTable, Step, TagTest};

use crate::nfa::{Nfa, On, Polarity};
use crate::tree::{Class, PathNodeId, ProjectionTree};

fn class_label(class: Class) -> &'static str {
    match class {
        Class::Aux => "aux",
        Class::Dom => "dom",
        Class::Out => "out",
    }
}

fn step_label(step: Step, names: &NameTable) -> String {
    let axis = match step.axis {
        pollard_core::Axis::Child => "child",
        pollard_core::Axis::Descendant => "descendant",
        pollard_core::Axis::DescendantOrSelf => "descendant-or-self",
        pollard_core::Axis::Stay => "stay",
    };
    let test = match step.test {
        TagTest::Tag(t) => names.resolve(t),
        TagTest::Wildcard => "*",
    };
    format!("{axis}::{test}")
}

/// Dump the projection tree, one indented line per node.
pub fn dump_tree(tree: &ProjectionTree, roles: &RoleTable, names: &NameTable) -> String {
    let mut out = String::new();
    dump_tree_node(&mut out, tree, roles, names, tree.root(), 0);
    out
}

fn dump_tree_node(
    out: &mut String,
    tree: &ProjectionTree,
    roles: &RoleTable,
    names: &NameTable,
    id: PathNodeId,
    depth: usize,
) {
    let node = tree.node(id);
    for _ in 0..depth {
        out.push_str("  ");
    }
    if id == tree.root() {
        out.push_str("root");
    } else {
        out.push_str(&step_label(node.step, names));
    }
    let _ = write!(out, " {}", class_label(node.class));
    if !node.roles.is_empty() {
        out.push_str(" [");
        for (i, &role) in node.roles.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let kind = match roles.kind(role) {
                pollard_core::RoleKind::Cumulative => 'c',
                pollard_core::RoleKind::NonCumulative => 'n',
            };
            let _ = write!(out, "r{}{kind}", role.as_u32());
        }
        out.push(']');
    }
    if node.existence_only {
        out.push_str(" existence");
    }
    if node.verbatim {
        out.push_str(" verbatim");
    }
    out.push('\n');
    for &child in &node.children {
        dump_tree_node(out, tree, roles, names, child, depth + 1);
    }
}

/// Dump the NFA, one block per state with its outgoing edges.
pub fn dump_nfa(nfa: &Nfa, tree: &ProjectionTree, names: &NameTable) -> String {
    let mut out = String::new();
    for id in nfa.ids() {
        let i = id.as_u32();
        let polarity = match nfa.polarity(id) {
            Polarity::Positive => '+',
            Polarity::Negative => '-',
        };
        let tree_id = nfa.tree_node(id);
        let what = if tree_id == tree.root() {
            "root".to_owned()
        } else {
            step_label(tree.node(tree_id).step, names)
        };
        let _ = writeln!(out, "s{i}{polarity} {what}");
        for &(on, to) in nfa.edges(id) {
            let label = match on {
                On::Tag(t) => names.resolve(t).to_owned(),
                On::NotTag(t) => format!("!{}", names.resolve(t)),
                On::Any => "*".to_owned(),
            };
            let _ = writeln!(out, "  {label} -> s{}", to.as_u32());
        }
        for &to in nfa.epsilons(id) {
            let _ = writeln!(out, "  eps -> s{}", to.as_u32());
        }
    }
    out
}

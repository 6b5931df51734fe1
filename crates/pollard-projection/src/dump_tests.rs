use pollard_core::{NameTable, RoleKind};

use crate::dump::{dump_nfa, dump_tree};
use crate::inventory::{Inventory, PathEntry, RoleEntry, StepEntry};

fn fixture() -> (crate::inventory::Projection, NameTable) {
    let inventory = Inventory {
        paths: vec![
            PathEntry::new(
                0,
                vec![StepEntry::child("a"), StepEntry::child("b")],
                RoleEntry::binding(RoleKind::Cumulative),
            ),
            PathEntry::new(
                1,
                vec![StepEntry::child("a"), StepEntry::descendant("c")],
                RoleEntry::existence(RoleKind::NonCumulative),
            ),
        ],
    };
    let mut names = NameTable::new();
    let projection = inventory.compile(&mut names).unwrap();
    (projection, names)
}

#[test]
fn tree_dump() {
    let (projection, names) = fixture();
    let dump = dump_tree(projection.tree(), projection.roles(), &names);
    insta::assert_snapshot!(dump, @r"
    root dom
      child::a aux
        child::b dom [r0c]
        descendant::c dom [r1n] existence
    ");
}

#[test]
fn nfa_dump() {
    let (projection, names) = fixture();
    let dump = dump_nfa(projection.nfa(), projection.tree(), &names);
    insta::assert_snapshot!(dump, @r"
    s0+ root
      a -> s1
    s1+ child::a
      b -> s2
      c -> s3
      !c -> s4
    s2+ child::b
    s3+ descendant::c
      c -> s3
      !c -> s4
    s4- descendant::c
      c -> s3
      !c -> s4
    ");
}

use indoc::indoc;
use pollard_core::NameTable;

use crate::error::BuildError;
use crate::inventory::{Inventory, PathEntry, RoleEntry, StepEntry};
use crate::tree::Class;
use pollard_core::RoleKind;

#[test]
fn compile_from_json() {
    let json = indoc! {r#"
        {
          "paths": [
            {
              "var": 0,
              "steps": [
                { "axis": "child", "tag": "library" },
                { "axis": "descendant", "tag": "book" }
              ],
              "role": { "kind": "cumulative" }
            },
            {
              "var": 1,
              "steps": [
                { "axis": "child", "tag": "library" },
                { "axis": "child" }
              ],
              "role": { "kind": "non-cumulative", "existence_only": true }
            }
          ]
        }
    "#};

    let inventory: Inventory = serde_json::from_str(json).unwrap();
    let mut names = NameTable::new();
    let projection = inventory.compile(&mut names).unwrap();

    assert_eq!(projection.roles().len(), 2);
    // root + library + book + wildcard child
    assert_eq!(projection.tree().len(), 4);
    assert!(names.lookup("library").is_some());
    assert!(names.lookup("book").is_some());
}

#[test]
fn empty_path_is_rejected() {
    let inventory = Inventory {
        paths: vec![PathEntry::new(
            7,
            vec![],
            RoleEntry::binding(RoleKind::Cumulative),
        )],
    };

    let err = inventory.compile(&mut NameTable::new()).unwrap_err();
    assert!(matches!(err, BuildError::EmptyPath(var) if var.0 == 7));
}

#[test]
fn existence_verbatim_clash_is_rejected() {
    let mut role = RoleEntry::verbatim(RoleKind::Cumulative);
    role.existence_only = true;
    let inventory = Inventory {
        paths: vec![PathEntry::new(0, vec![StepEntry::child("a")], role)],
    };

    let err = inventory.compile(&mut NameTable::new()).unwrap_err();
    assert!(matches!(err, BuildError::ExistenceVerbatimClash(_)));
}

#[test]
fn verbatim_role_marks_the_terminal_out() {
    let inventory = Inventory {
        paths: vec![PathEntry::new(
            0,
            vec![StepEntry::child("keep"), StepEntry::subtree()],
            RoleEntry::verbatim(RoleKind::Cumulative),
        )],
    };

    let mut names = NameTable::new();
    let projection = inventory.compile(&mut names).unwrap();
    let tree = projection.tree();

    let keep = tree.node(tree.root()).children[0];
    let subtree = tree.node(keep).children[0];
    assert_eq!(tree.node(subtree).class, Class::Out);
    assert!(tree.node(subtree).verbatim);
}

#[test]
fn inventory_roundtrips_through_json() {
    let inventory = Inventory {
        paths: vec![PathEntry::new(
            3,
            vec![StepEntry::child("a"), StepEntry::descendant("b")],
            RoleEntry::existence(RoleKind::NonCumulative),
        )],
    };

    let json = serde_json::to_string(&inventory).unwrap();
    let back: Inventory = serde_json::from_str(&json).unwrap();

    assert_eq!(back.paths.len(), 1);
    assert_eq!(back.paths[0].var, 3);
    assert!(back.paths[0].role.existence_only);
}

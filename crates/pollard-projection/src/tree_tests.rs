use pollard_core::{Axis, NameTable, RoleFlags, RoleKind, RoleTable, Step, TagTest, Var};

use crate::tree::{Class, ProjectionTree};

fn child(names: &mut NameTable, tag: &str) -> Step {
    Step::new(Axis::Child, TagTest::Tag(names.intern(tag)))
}

fn descendant(names: &mut NameTable, tag: &str) -> Step {
    Step::new(Axis::Descendant, TagTest::Tag(names.intern(tag)))
}

#[test]
fn paths_share_common_prefixes() {
    let mut names = NameTable::new();
    let mut tree = ProjectionTree::new();

    let ab = tree.add_path(&[child(&mut names, "a"), child(&mut names, "b")]);
    let ac = tree.add_path(&[child(&mut names, "a"), child(&mut names, "c")]);

    assert_ne!(ab, ac);
    // root + a + b + c
    assert_eq!(tree.len(), 4);

    let a = tree.node(tree.root()).children[0];
    assert_eq!(tree.node(a).children.len(), 2);
}

#[test]
fn same_tag_different_axis_does_not_merge() {
    let mut names = NameTable::new();
    let mut tree = ProjectionTree::new();

    tree.add_path(&[child(&mut names, "a")]);
    tree.add_path(&[descendant(&mut names, "a")]);

    assert_eq!(tree.node(tree.root()).children.len(), 2);
}

#[test]
fn adding_the_same_path_twice_is_idempotent() {
    let mut names = NameTable::new();
    let mut tree = ProjectionTree::new();

    let first = tree.add_path(&[child(&mut names, "a"), child(&mut names, "b")]);
    let second = tree.add_path(&[child(&mut names, "a"), child(&mut names, "b")]);

    assert_eq!(first, second);
    assert_eq!(tree.len(), 3);
}

#[test]
fn finalize_derives_classes_from_roles() {
    let mut names = NameTable::new();
    let mut roles = RoleTable::new();
    let mut tree = ProjectionTree::new();

    let binding = tree.add_path(&[child(&mut names, "a"), child(&mut names, "b")]);
    tree.add_role(
        binding,
        roles.push(RoleKind::Cumulative, Var(0), RoleFlags::default()),
    );

    let emitted = tree.add_path(&[child(&mut names, "a"), child(&mut names, "out")]);
    tree.add_role(
        emitted,
        roles.push(
            RoleKind::Cumulative,
            Var(1),
            RoleFlags {
                output: true,
                ..Default::default()
            },
        ),
    );

    tree.finalize(&roles);

    let a = tree.node(tree.root()).children[0];
    assert_eq!(tree.node(a).class, Class::Aux);
    assert_eq!(tree.node(binding).class, Class::Dom);
    assert_eq!(tree.node(emitted).class, Class::Out);
}

#[test]
fn existence_marker_requires_leaf() {
    let mut names = NameTable::new();
    let mut roles = RoleTable::new();
    let mut tree = ProjectionTree::new();

    let flags = RoleFlags {
        existence_only: true,
        ..Default::default()
    };

    // Existence role on a leaf: marked.
    let leaf = tree.add_path(&[child(&mut names, "a"), child(&mut names, "b")]);
    tree.add_role(leaf, roles.push(RoleKind::NonCumulative, Var(0), flags));

    // Existence role on a node with a continuation below: not marked,
    // the continuation may need real content.
    let inner = tree.add_path(&[child(&mut names, "c")]);
    tree.add_role(inner, roles.push(RoleKind::NonCumulative, Var(1), flags));
    tree.add_path(&[child(&mut names, "c"), child(&mut names, "d")]);

    tree.finalize(&roles);

    assert!(tree.node(leaf).existence_only);
    assert!(!tree.node(inner).existence_only);
}

#[test]
fn child_steps_exposes_sibling_steps() {
    let mut names = NameTable::new();
    let mut tree = ProjectionTree::new();

    tree.add_path(&[child(&mut names, "x")]);
    tree.add_path(&[descendant(&mut names, "x")]);

    let steps: Vec<_> = tree.child_steps(tree.root()).collect();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].axis, Axis::Child);
    assert_eq!(steps[1].axis, Axis::Descendant);
    assert_eq!(steps[0].test, steps[1].test);
}

use pollard_core::NameTable;
use pollard_projection::{Class, Inventory, PathEntry, Projection, RoleEntry, StepEntry};
use pollard_core::RoleKind;

use crate::dfa::{Close, Dfa, Open};

fn compile(paths: Vec<PathEntry>) -> (Projection, NameTable) {
    let inventory = Inventory { paths };
    let mut names = NameTable::new();
    let projection = inventory.compile(&mut names).unwrap();
    (projection, names)
}

#[test]
fn transitions_are_cached_and_states_shared() {
    let (projection, mut names) = compile(vec![PathEntry::new(
        0,
        vec![StepEntry::child("a"), StepEntry::child("b")],
        RoleEntry::binding(RoleKind::NonCumulative),
    )]);
    let a = names.intern("a");

    let mut dfa = Dfa::new(&projection);
    let root = dfa.root();

    let Open::Entered(first) = dfa.open(root, a) else {
        panic!("expected a transition on <a>");
    };
    let after = dfa.len();
    assert_eq!(dfa.close(first), Close::Returned(root));

    let Open::Entered(second) = dfa.open(root, a) else {
        panic!("expected the cached transition on <a>");
    };
    assert_eq!(first, second);
    assert_eq!(dfa.len(), after);
}

#[test]
fn unmatched_tag_skips_until_balanced() {
    let (projection, mut names) = compile(vec![PathEntry::new(
        0,
        vec![StepEntry::child("a")],
        RoleEntry::binding(RoleKind::NonCumulative),
    )]);
    let a = names.intern("a");
    let z = names.intern("z");

    let mut dfa = Dfa::new(&projection);
    let root = dfa.root();

    // <z><a>...</a></z> matches nothing; the whole subtree is counted out.
    assert_eq!(dfa.open(root, z), Open::Skipped);
    assert_eq!(dfa.skip_depth(root), 1);
    assert_eq!(dfa.open(root, a), Open::Skipped);
    assert_eq!(dfa.skip_depth(root), 2);
    assert_eq!(dfa.close(root), Close::StillSkipping);
    assert_eq!(dfa.close(root), Close::StillSkipping);
    assert_eq!(dfa.skip_depth(root), 0);

    // State restored: a top-level <a> transitions again.
    assert!(matches!(dfa.open(root, a), Open::Entered(_)));
}

#[test]
fn dead_transitions_are_cached_too() {
    let (projection, mut names) = compile(vec![PathEntry::new(
        0,
        vec![StepEntry::child("a")],
        RoleEntry::binding(RoleKind::NonCumulative),
    )]);
    let z = names.intern("z");

    let mut dfa = Dfa::new(&projection);
    let root = dfa.root();

    assert_eq!(dfa.open(root, z), Open::Skipped);
    assert_eq!(dfa.close(root), Close::StillSkipping);
    let states = dfa.len();

    assert_eq!(dfa.open(root, z), Open::Skipped);
    assert_eq!(dfa.len(), states);
}

#[test]
fn ambiguous_child_descendant_tag_promotes_aux_to_dom() {
    // Under <a>, the tag "x" is reachable both as child::x and descendant::x,
    // so an <x> kept only for navigation must still be buffered.
    let (projection, mut names) = compile(vec![
        PathEntry::new(
            0,
            vec![
                StepEntry::child("a"),
                StepEntry::child("x"),
                StepEntry::child("p"),
            ],
            RoleEntry::binding(RoleKind::NonCumulative),
        ),
        PathEntry::new(
            1,
            vec![
                StepEntry::child("a"),
                StepEntry::descendant("x"),
                StepEntry::child("q"),
            ],
            RoleEntry::binding(RoleKind::NonCumulative),
        ),
    ]);
    let a = names.intern("a");
    let x = names.intern("x");

    let mut dfa = Dfa::new(&projection);
    let Open::Entered(sa) = dfa.open(dfa.root(), a) else {
        panic!("expected a transition on <a>");
    };
    let Open::Entered(sx) = dfa.open(sa, x) else {
        panic!("expected a transition on <x>");
    };
    assert_eq!(dfa.class(sx), Class::Dom);
}

#[test]
fn unambiguous_interior_state_stays_aux() {
    let (projection, mut names) = compile(vec![PathEntry::new(
        0,
        vec![
            StepEntry::child("a"),
            StepEntry::child("x"),
            StepEntry::child("p"),
        ],
        RoleEntry::binding(RoleKind::NonCumulative),
    )]);
    let a = names.intern("a");
    let x = names.intern("x");

    let mut dfa = Dfa::new(&projection);
    let Open::Entered(sa) = dfa.open(dfa.root(), a) else {
        panic!("expected a transition on <a>");
    };
    let Open::Entered(sx) = dfa.open(sa, x) else {
        panic!("expected a transition on <x>");
    };
    assert_eq!(dfa.class(sx), Class::Aux);
}

#[test]
fn existence_state_witnesses_once_per_anchor_scope() {
    let (projection, mut names) = compile(vec![
        PathEntry::new(
            0,
            vec![StepEntry::child("a")],
            RoleEntry::binding(RoleKind::NonCumulative),
        ),
        PathEntry::new(
            1,
            vec![StepEntry::child("a"), StepEntry::child("b")],
            RoleEntry::existence(RoleKind::NonCumulative),
        ),
    ]);
    let a = names.intern("a");
    let b = names.intern("b");

    let mut dfa = Dfa::new(&projection);
    let root = dfa.root();

    let Open::Entered(sa) = dfa.open(root, a) else {
        panic!("expected a transition on <a>");
    };

    // First <b/> is the witness.
    let Open::Witness(sb) = dfa.open(sa, b) else {
        panic!("expected a witness on the first <b>");
    };
    assert!(dfa.existence(sb));
    assert!(dfa.witnessed(sb));
    assert_eq!(dfa.close(sb), Close::Returned(sa));

    // Later siblings under the same anchor are suppressed as a skip.
    assert_eq!(dfa.open(sa, b), Open::Suppressed);
    assert_eq!(dfa.close(sa), Close::StillSkipping);

    // Leaving the anchor resets the witness scope.
    assert_eq!(dfa.close(sa), Close::Returned(root));
    assert!(!dfa.witnessed(sb));
    let Open::Entered(sa2) = dfa.open(root, a) else {
        panic!("expected the cached transition on <a>");
    };
    assert_eq!(sa2, sa);
    assert!(matches!(dfa.open(sa, b), Open::Witness(_)));
}

#[test]
fn terminal_state_carries_its_roles_by_kind() {
    let (projection, mut names) = compile(vec![
        PathEntry::new(
            0,
            vec![StepEntry::child("a")],
            RoleEntry::binding(RoleKind::Cumulative),
        ),
        PathEntry::new(
            1,
            vec![StepEntry::child("a")],
            RoleEntry::binding(RoleKind::NonCumulative),
        ),
    ]);
    let a = names.intern("a");

    let mut dfa = Dfa::new(&projection);
    let Open::Entered(sa) = dfa.open(dfa.root(), a) else {
        panic!("expected a transition on <a>");
    };
    assert_eq!(dfa.cum_roles(sa).len(), 1);
    assert_eq!(dfa.noncum_roles(sa).len(), 1);
}

use pollard_core::{NameTable, RoleFlags, RoleKind, RoleTable, Var};

use crate::buffer::{BufferTree, NodeKind};

#[test]
fn frontier_tracks_append_and_close() {
    let mut names = NameTable::new();
    let a = names.intern("a");
    let b = names.intern("b");
    let roles = RoleTable::new();

    let mut buf = BufferTree::new();
    let na = buf.append_element(a, [], &roles);
    let nb = buf.append_element(b, [], &roles);

    assert_eq!(buf.parent(nb), Some(na));
    assert!(!buf.is_closed(nb));

    assert_eq!(buf.close_frontier(), nb);
    assert!(buf.is_closed(nb));
    assert_eq!(buf.close_frontier(), na);

    assert_eq!(buf.live_count(), 3);
    assert_eq!(buf.children(buf.root()).collect::<Vec<_>>(), vec![na]);
}

#[test]
fn nested_cumulative_match_counts_on_its_own_node() {
    let mut names = NameTable::new();
    let a = names.intern("a");
    let b = names.intern("b");
    let mut roles = RoleTable::new();
    let r = roles.push(RoleKind::Cumulative, Var(0), RoleFlags::default());

    let mut buf = BufferTree::new();
    let na = buf.append_element(a, [r], &roles);
    let nb = buf.append_element(b, [r], &roles);

    // Each match is a distinct claim; the inner one also inherits pending
    // status from the claim on <a>.
    assert_eq!(buf.role_count(na, r), 1);
    assert_eq!(buf.role_count(nb, r), 1);

    buf.close_frontier();
    assert!(buf.inherited_pending(nb));

    // Releasing the outer claim leaves the inner binding untouched.
    let freed = buf.sign_off(r, na, &roles).unwrap();
    assert!(freed.is_empty());
    assert!(buf.is_alive(nb));
    assert!(buf.sign_off(r, nb, &roles).is_ok());
}

#[test]
fn non_cumulative_role_is_counted_per_node() {
    let mut names = NameTable::new();
    let a = names.intern("a");
    let b = names.intern("b");
    let mut roles = RoleTable::new();
    let r = roles.push(RoleKind::NonCumulative, Var(0), RoleFlags::default());

    let mut buf = BufferTree::new();
    let na = buf.append_element(a, [r], &roles);
    let nb = buf.append_element(b, [r], &roles);

    assert_eq!(buf.role_count(na, r), 1);
    assert_eq!(buf.role_count(nb, r), 1);
}

#[test]
fn witness_append_does_not_move_the_frontier() {
    let mut names = NameTable::new();
    let a = names.intern("a");
    let b = names.intern("b");
    let roles = RoleTable::new();

    let mut buf = BufferTree::new();
    let na = buf.append_element(a, [], &roles);
    let nw = buf.append_witness(b, [], &roles);

    assert!(buf.is_closed(nw));
    assert_eq!(buf.parent(nw), Some(na));

    // The next append still lands under <a>.
    let nc = buf.append_element(b, [], &roles);
    assert_eq!(buf.parent(nc), Some(na));
}

#[test]
fn text_is_a_closed_leaf_in_document_order() {
    let mut names = NameTable::new();
    let a = names.intern("a");
    let b = names.intern("b");
    let roles = RoleTable::new();

    let mut buf = BufferTree::new();
    let na = buf.append_element(a, [], &roles);
    let t1 = buf.append_text("hello", &roles);
    let nb = buf.append_element(b, [], &roles);
    buf.close_frontier();
    let t2 = buf.append_text("world", &roles);

    assert!(buf.is_closed(t1));
    assert_eq!(buf.text(t1), Some("hello"));
    assert_eq!(buf.text(nb), None);
    assert_eq!(buf.children(na).collect::<Vec<_>>(), vec![t1, nb, t2]);
}

#[test]
fn verbatim_markup_escapes_character_data() {
    let mut names = NameTable::new();
    let m = names.intern("m");
    let roles = RoleTable::new();

    let mut buf = BufferTree::new();
    let nv = buf.append_verbatim(m, "m", [], &roles);
    buf.verbatim_open_tag(nv, "inner");
    buf.verbatim_text(nv, "1 < 2 & 3 > 0");
    buf.verbatim_close_tag(nv, "inner");
    buf.verbatim_close_tag(nv, "m");

    assert_eq!(
        buf.markup(nv),
        Some("<m><inner>1 &lt; 2 &amp; 3 &gt; 0</inner></m>")
    );
    assert!(matches!(buf.kind(nv), NodeKind::Verbatim { .. }));
}

#[test]
fn ancestors_walk_nearest_first() {
    let mut names = NameTable::new();
    let a = names.intern("a");
    let b = names.intern("b");
    let c = names.intern("c");
    let roles = RoleTable::new();

    let mut buf = BufferTree::new();
    let na = buf.append_element(a, [], &roles);
    let nb = buf.append_element(b, [], &roles);
    let nc = buf.append_element(c, [], &roles);

    assert_eq!(
        buf.ancestors(nc).collect::<Vec<_>>(),
        vec![nb, na, buf.root()]
    );
}

#[test]
fn dump_renders_the_buffered_tree() {
    let mut names = NameTable::new();
    let a = names.intern("a");
    let b = names.intern("b");
    let mut roles = RoleTable::new();
    let r = roles.push(RoleKind::NonCumulative, Var(0), RoleFlags::default());

    let mut buf = BufferTree::new();
    buf.append_element(a, [r], &roles);
    buf.append_element(b, [], &roles);
    buf.close_frontier();
    buf.append_text("hi", &roles);

    insta::assert_snapshot!(buf.dump(&names), @r#"
    doc open
      <a> open [r0x1]
        <b>
        "hi"
    "#);
}

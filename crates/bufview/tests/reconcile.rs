use bufview::{
    MountPoint, MountedNode, Position, RenderError, RopeDocument, TemplateId, ViewNode, patch,
    render, view,
};
use pretty_assertions::assert_eq;

fn digits(middle: &str) -> ViewNode {
    view!("1{}2", middle)
}

fn mount_at(doc: &mut RopeDocument, node: &ViewNode, pos: Position) -> MountedNode {
    let tree = render(doc, node, MountPoint::point(pos)).unwrap();
    doc.take_edits();
    tree
}

fn ranges(tree: &MountedNode) -> Vec<(Position, Position)> {
    let mut out = vec![(tree.start(), tree.end())];
    for child in tree.children() {
        out.extend(ranges(child));
    }
    out
}

/// Patch `current` to `next` and check the result against a fresh render of `next` at the
/// same place: same text, same ranges for every node.
fn patch_and_verify(
    doc: &mut RopeDocument,
    current: &MountedNode,
    next: &ViewNode,
) -> MountedNode {
    let patched = patch(doc, current, next, current.range()).unwrap();

    let mut fresh_doc = RopeDocument::new(&doc.text());
    let fresh = render(&mut fresh_doc, next, patched.range()).unwrap();
    assert_eq!(fresh_doc.text(), doc.text());
    assert_eq!(ranges(&patched), ranges(&fresh));
    assert_eq!(doc.slice(patched.range()).unwrap(), next.flatten());
    patched.check_positions().unwrap();
    patched
}

#[test]
fn test_empty_leaf_becomes_newline() {
    let mut doc = RopeDocument::empty();
    let tree = mount_at(&mut doc, &digits(""), Position::ZERO);

    let tree = patch(&mut doc, &tree, &digits("\n"), tree.range()).unwrap();

    assert_eq!(doc.lines(), vec!["1", "2"]);
    let leaves = tree.leaves();
    assert_eq!(
        (leaves[1].start(), leaves[1].end()),
        (Position::new(0, 1), Position::new(1, 0))
    );
    assert_eq!(
        (leaves[2].start(), leaves[2].end()),
        (Position::new(1, 0), Position::new(1, 1))
    );
    assert_eq!(doc.edits().len(), 1);
}

#[test]
fn test_identical_tree_issues_no_edits() {
    let page = |name: &str, items: &[&str]| {
        view!(
            "# {}\n{}\n",
            name,
            items
                .iter()
                .map(|item| view!("- {}\n", *item))
                .collect::<Vec<_>>()
        )
    };

    let mut doc = RopeDocument::new("before\n");
    let tree = mount_at(&mut doc, &page("list", &["a", "b"]), Position::new(1, 0));
    let before = doc.text();

    let patched = patch(&mut doc, &tree, &page("list", &["a", "b"]), tree.range()).unwrap();

    assert!(doc.edits().is_empty());
    assert_eq!(doc.text(), before);
    assert_eq!(ranges(&patched), ranges(&tree));
}

#[test]
fn test_changed_leaf_shifts_following_siblings() {
    let row = |label: &str, value: &str| view!("{}: {} | end\n", label, value);
    let mut doc = RopeDocument::empty();
    let tree = mount_at(&mut doc, &row("name", "x"), Position::ZERO);

    let tree = patch_and_verify(&mut doc, &tree, &row("name", "much longer"));
    assert_eq!(doc.lines(), vec!["name: much longer | end", ""]);
    assert_eq!(doc.edits().len(), 1);

    doc.take_edits();
    patch_and_verify(&mut doc, &tree, &row("n", "multi\nline\nvalue"));
    assert_eq!(doc.lines(), vec!["n: multi", "line", "value | end", ""]);
    assert_eq!(doc.edits().len(), 2);
}

#[test]
fn test_several_edits_on_one_row_accumulate() {
    let row = |a: &str, b: &str, c: &str| view!("{}|{}|{}", a, b, c);
    let mut doc = RopeDocument::new("<>");
    let tree = mount_at(&mut doc, &row("aa", "bb", "cc"), Position::new(0, 1));

    let tree = patch_and_verify(&mut doc, &tree, &row("a", "bbbb", "c"));
    assert_eq!(doc.text(), "<a|bbbb|c>");

    let tree = patch_and_verify(&mut doc, &tree, &row("", "\n", "é"));
    assert_eq!(doc.lines(), vec!["<|", "|é>"]);

    patch_and_verify(&mut doc, &tree, &row("x\ny", "", "z\n"));
    assert_eq!(doc.lines(), vec!["<x", "y||z", ">"]);
}

#[test]
fn test_template_change_rerenders_subtree() {
    let outer = |inner: ViewNode| view!("{}!", inner);
    let mut doc = RopeDocument::empty();
    let first = view!("[{}]", "a");
    let second = view!("({})", "a");
    let tree = mount_at(&mut doc, &outer(first), Position::ZERO);

    let tree = patch_and_verify(&mut doc, &tree, &outer(second));
    assert_eq!(doc.text(), "(a)!");
    assert_eq!(doc.edits().len(), 1);
    assert_eq!(doc.edits()[0].text(), "(a)");
    assert_eq!(tree.end(), Position::new(0, 4));
}

#[test]
fn test_kind_change_rerenders_node() {
    let wrap = |inner: ViewNode| view!("<{}>", inner);
    let mut doc = RopeDocument::empty();
    let tree = mount_at(&mut doc, &wrap(ViewNode::text("text")), Position::ZERO);

    let tree = patch_and_verify(
        &mut doc,
        &tree,
        &wrap(ViewNode::array(vec!["a".into(), "b".into()])),
    );
    assert_eq!(doc.text(), "<ab>");

    patch_and_verify(&mut doc, &tree, &wrap(view!("{}-{}", 1usize, 2usize)));
    assert_eq!(doc.text(), "<1-2>");
}

#[test]
fn test_shape_mismatch_is_rejected_before_any_edit() {
    let template = TemplateId::next();
    let mut doc = RopeDocument::empty();
    let current = ViewNode::array(vec![
        ViewNode::text("changed"),
        ViewNode::component(template, vec!["a".into(), "b".into()]),
    ]);
    let tree = mount_at(&mut doc, &current, Position::ZERO);

    let next = ViewNode::array(vec![
        ViewNode::text("CHANGED"),
        ViewNode::component(template, vec!["a".into()]),
    ]);
    let result = patch(&mut doc, &tree, &next, tree.range());

    assert_eq!(
        result.unwrap_err(),
        RenderError::TemplateShapeMismatch {
            template,
            expected: 2,
            actual: 1,
        }
    );
    assert!(doc.edits().is_empty());
    assert_eq!(doc.text(), "changedab");
}

#[test]
fn test_unchanged_text_picks_up_new_bindings_and_decorations() {
    let labelled = |class: &str, key: &str| {
        view!("{}", ViewNode::text("same").decorate(class).bind(key, || {}))
    };
    let mut doc = RopeDocument::empty();
    let tree = mount_at(&mut doc, &labelled("Old", "a"), Position::ZERO);

    let tree = patch(&mut doc, &tree, &labelled("New", "b"), tree.range()).unwrap();

    assert!(doc.edits().is_empty());
    let leaf = &tree.children()[1];
    assert_eq!(leaf.decoration().map(|d| d.as_str()), Some("New"));
    let bindings = leaf.bindings().unwrap();
    assert!(bindings.contains("b"));
    assert!(!bindings.contains("a"));
}

#[test]
fn test_text_after_mount_point_is_preserved() {
    let status = |s: &str| view!("status: {}\n", s);
    let mut doc = RopeDocument::new("top\n\nbottom line\n");
    let tree = mount_at(&mut doc, &status("idle"), Position::new(1, 0));
    assert_eq!(doc.text(), "top\nstatus: idle\n\nbottom line\n");

    let tree = patch_and_verify(&mut doc, &tree, &status("busy\nworking"));
    assert_eq!(doc.text(), "top\nstatus: busy\nworking\n\nbottom line\n");
    assert_eq!(tree.range().end, Position::new(3, 0));

    patch_and_verify(&mut doc, &tree, &status(""));
    assert_eq!(doc.text(), "top\nstatus: \n\nbottom line\n");
}

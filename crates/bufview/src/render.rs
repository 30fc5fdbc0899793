//! Full render of a view tree into a document range.

use crate::error::RenderError;
use crate::mounted::{MountedKind, MountedNode};
use crate::position::{MountPoint, OffsetIndex};
use crate::surface::TextSurface;
use crate::view::{ViewKind, ViewNode};

/// Write `view` over `mount` and return its position-annotated mirror.
///
/// The whole tree is flattened into one string and written with a single
/// [`replace_range`](TextSurface::replace_range) call, so the document never observes a
/// partially rendered tree. Node positions are then derived from offsets into the flattened
/// string, relative to `mount.start`, with columns measured by
/// [`TextSurface::byte_width`].
///
/// Rendering the same tree over the same range twice issues the same write and returns an
/// identical tree.
pub fn render<S>(
    surface: &mut S,
    view: &ViewNode,
    mount: MountPoint,
) -> Result<MountedNode, RenderError>
where
    S: TextSurface + ?Sized,
{
    let mut content = String::new();
    let mut spans = Vec::new();
    measure(view, &mut content, &mut spans);

    let lines: Vec<&str> = content.split('\n').collect();
    surface.replace_range(mount, &lines)?;

    let index = OffsetIndex::new(mount.start, &content);
    let width = |text: &str| surface.byte_width(text);
    let mut spans = spans.into_iter();
    Ok(place(view, &index, &width, &mut spans))
}

/// Pre-order pass: append leaf text to `content` and record each node's `[start, end)` byte
/// offsets. `spans[i]` belongs to the i-th node in pre-order.
fn measure(node: &ViewNode, content: &mut String, spans: &mut Vec<(usize, usize)>) {
    let slot = spans.len();
    spans.push((content.len(), content.len()));

    match &node.kind {
        ViewKind::Text(text) => content.push_str(text),
        ViewKind::Component { children, .. } | ViewKind::Array(children) => {
            for child in children {
                measure(child, content, spans);
            }
        }
    }

    spans[slot].1 = content.len();
}

/// Second pre-order pass, consuming the spans recorded by [`measure`].
fn place(
    node: &ViewNode,
    index: &OffsetIndex<'_>,
    width: &dyn Fn(&str) -> usize,
    spans: &mut impl Iterator<Item = (usize, usize)>,
) -> MountedNode {
    // `measure` pushed exactly one span per node in the same traversal order.
    let (start, end) = spans.next().unwrap_or_default();

    let kind = match &node.kind {
        ViewKind::Text(text) => MountedKind::Text(text.clone()),
        ViewKind::Component { template, children } => MountedKind::Component {
            template: *template,
            children: children
                .iter()
                .map(|child| place(child, index, width, spans))
                .collect(),
        },
        ViewKind::Array(children) => MountedKind::Array(
            children
                .iter()
                .map(|child| place(child, index, width, spans))
                .collect(),
        ),
    };

    MountedNode {
        kind,
        start: index.position(start, width),
        end: index.position(end, width),
        decoration: node.decoration.clone(),
        bindings: node.bindings.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RopeDocument;
    use crate::position::Position;

    #[test]
    fn test_measure_records_preorder_offsets() {
        let tree = ViewNode::array(vec![
            ViewNode::text("ab"),
            ViewNode::array(vec![ViewNode::empty(), ViewNode::text("c\n")]),
        ]);
        let mut content = String::new();
        let mut spans = Vec::new();
        measure(&tree, &mut content, &mut spans);

        assert_eq!(content, "abc\n");
        assert_eq!(spans, vec![(0, 4), (0, 2), (2, 4), (2, 2), (2, 4)]);
    }

    #[test]
    fn test_render_empty_tree_is_zero_width() {
        let mut doc = RopeDocument::new("xy");
        let mount = MountPoint::point(Position::new(0, 1));
        let tree = render(&mut doc, &ViewNode::array(Vec::new()), mount).unwrap();

        assert_eq!(doc.text(), "xy");
        assert_eq!(tree.range(), mount);
        assert_eq!(doc.edits().len(), 1);
    }
}

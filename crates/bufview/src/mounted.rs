//! Position-annotated mirror of a view tree.
//!
//! A [`MountedNode`] tree records what is written to the document right now: the same shape
//! as the view tree that produced it, plus the `[start, end)` range of every node. Only the
//! renderer and reconciler construct these trees.

use crate::bindings::Bindings;
use crate::error::PositionError;
use crate::position::{MountPoint, Position};
use crate::view::{Decoration, TemplateId};

/// The shape of a [`MountedNode`].
#[derive(Debug, Clone)]
pub enum MountedKind {
    /// Text leaf.
    Text(String),
    /// Fixed-shape composite.
    Component {
        /// Originating template.
        template: TemplateId,
        /// Children in document order.
        children: Vec<MountedNode>,
    },
    /// Variable-length list.
    Array(Vec<MountedNode>),
}

/// A node as currently written to the document.
#[derive(Debug, Clone)]
pub struct MountedNode {
    pub(crate) kind: MountedKind,
    pub(crate) start: Position,
    pub(crate) end: Position,
    pub(crate) decoration: Option<Decoration>,
    pub(crate) bindings: Option<Bindings>,
}

/// A decorated document range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationSpan {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
    /// The decoration tag.
    pub decoration: Decoration,
}

impl MountedNode {
    /// The node's shape.
    pub fn kind(&self) -> &MountedKind {
        &self.kind
    }

    /// Inclusive start position.
    pub fn start(&self) -> Position {
        self.start
    }

    /// Exclusive end position.
    pub fn end(&self) -> Position {
        self.end
    }

    /// `[start, end)` as a range.
    pub fn range(&self) -> MountPoint {
        MountPoint::new(self.start, self.end)
    }

    /// Text of a leaf; `None` for composites.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            MountedKind::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Direct children (empty for text leaves).
    pub fn children(&self) -> &[MountedNode] {
        match &self.kind {
            MountedKind::Text(_) => &[],
            MountedKind::Component { children, .. } | MountedKind::Array(children) => children,
        }
    }

    /// Attached decoration, if any.
    pub fn decoration(&self) -> Option<&Decoration> {
        self.decoration.as_ref()
    }

    /// Attached bindings, if any.
    pub fn bindings(&self) -> Option<&Bindings> {
        self.bindings.as_ref()
    }

    /// Concatenated leaf text; equals the document text in [`range`](Self::range).
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.walk(&mut |node| {
            if let Some(content) = node.content() {
                out.push_str(content);
            }
        });
        out
    }

    /// All text leaves in document order.
    pub fn leaves(&self) -> Vec<&MountedNode> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if matches!(node.kind, MountedKind::Text(_)) {
                out.push(node);
            }
        });
        out
    }

    /// Every decorated range, in pre-order (so enclosing ranges come before nested ones).
    pub fn decoration_spans(&self) -> Vec<DecorationSpan> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let Some(decoration) = &node.decoration {
                out.push(DecorationSpan {
                    start: node.start,
                    end: node.end,
                    decoration: decoration.clone(),
                });
            }
        });
        out
    }

    /// Verify position monotonicity over the whole tree.
    ///
    /// Every node must satisfy `start <= end`; children must lie within their parent and
    /// siblings must not overlap or run backwards.
    pub fn check_positions(&self) -> Result<(), PositionError> {
        let mut previous = self.start;
        for (index, child) in self.children().iter().enumerate() {
            if child.start < previous || child.end < child.start || child.end > self.end {
                return Err(PositionError {
                    index,
                    start: child.start,
                    end: child.end,
                    previous,
                    parent_start: self.start,
                    parent_end: self.end,
                });
            }
            child.check_positions()?;
            previous = child.end;
        }
        Ok(())
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MountedNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

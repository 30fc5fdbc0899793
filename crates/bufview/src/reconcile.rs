//! Incremental reconciliation of a mounted tree against a new view tree.
//!
//! [`patch`] walks the previous [`MountedNode`] tree and the next [`ViewNode`] tree together in
//! document order and issues the smallest set of surface writes that makes the document match
//! the new tree:
//!
//! - identical text leaves are kept and only have their positions shifted;
//! - components with the same template are diffed child by child;
//! - arrays diff their common prefix, then drop or append trailing items;
//! - anything else (different text, different template, different kind) is re-rendered in place.
//!
//! # Position bookkeeping
//!
//! Positions stored in the previous tree are *pre-patch* coordinates. Every write shifts the
//! content after it, so the reconciler carries an [`AccumulatedEdit`] that maps a pre-patch
//! position to where that content sits now. The mapping is only valid for positions at or after
//! the end of the most recent write, which is why nodes must be visited strictly left to right,
//! top to bottom.

use crate::error::RenderError;
use crate::mounted::{MountedKind, MountedNode};
use crate::position::{MountPoint, Position};
use crate::render::render;
use crate::surface::TextSurface;
use crate::view::{ViewKind, ViewNode};

/// Running position shift for one reconciliation pass.
///
/// For a pre-patch position `p` at or after the last write: the row moves by `delta_row`, and
/// if `p` is on `last_edit_row` (the pre-patch row where the last write ended) the column also
/// moves by `delta_col`. Content on later rows keeps its column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatedEdit {
    /// Rows added (positive) or removed (negative) so far.
    pub delta_row: isize,
    /// Column shift for content on `last_edit_row`.
    pub delta_col: isize,
    /// Pre-patch row on which the most recent write ended.
    pub last_edit_row: usize,
}

impl AccumulatedEdit {
    /// No edits applied yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a pre-patch position into current document coordinates.
    pub fn update_pos(&self, old: Position) -> Position {
        let row = old.row.saturating_add_signed(self.delta_row);
        let col = if old.row == self.last_edit_row {
            old.col.saturating_add_signed(self.delta_col)
        } else {
            old.col
        };
        Position::new(row, col)
    }

    /// Fold a write into the running shift.
    ///
    /// `old_end` is the pre-patch position where the replaced text ended, `new_end` the
    /// current position where the written text ends. Content that followed `old_end` now
    /// follows `new_end`.
    pub fn fold(&mut self, old_end: Position, new_end: Position) {
        let shifted = self.update_pos(old_end);
        self.delta_row += signed_delta(new_end.row, shifted.row);
        self.delta_col = signed_delta(new_end.col, old_end.col);
        self.last_edit_row = old_end.row;
    }
}

fn signed_delta(to: usize, from: usize) -> isize {
    if to >= from {
        (to - from) as isize
    } else {
        -((from - to) as isize)
    }
}

/// Bring the document under `mount` in line with `next` and return the new mounted tree.
///
/// `current` must describe the document exactly as it is now, and `mount` must be
/// `current`'s range. Shapes are checked before anything is written: if two components share
/// a template id but not a child count, [`RenderError::TemplateShapeMismatch`] is returned and
/// the document is left untouched.
///
/// Patching with a tree whose content equals `current` issues no writes at all.
pub fn patch<S>(
    surface: &mut S,
    current: &MountedNode,
    next: &ViewNode,
    mount: MountPoint,
) -> Result<MountedNode, RenderError>
where
    S: TextSurface + ?Sized,
{
    debug_assert_eq!(
        current.range(),
        mount,
        "mounted tree does not fill its mount point"
    );
    check_shape(current, next)?;

    let mut reconciler = Reconciler {
        surface,
        edit: AccumulatedEdit::new(),
    };
    let tree = reconciler.visit(current, next)?;
    log::trace!("patched {mount} -> {}", tree.range());
    Ok(tree)
}

/// Read-only walk mirroring [`Reconciler::visit`]'s pairing, failing on any component pair the
/// diff could not match up.
fn check_shape(current: &MountedNode, next: &ViewNode) -> Result<(), RenderError> {
    match (&current.kind, &next.kind) {
        (
            MountedKind::Component {
                template,
                children: old,
            },
            ViewKind::Component {
                template: next_template,
                children: new,
            },
        ) if template == next_template => {
            if old.len() != new.len() {
                return Err(RenderError::TemplateShapeMismatch {
                    template: *template,
                    expected: old.len(),
                    actual: new.len(),
                });
            }
            old.iter().zip(new).try_for_each(|(c, n)| check_shape(c, n))
        }
        (MountedKind::Array(old), ViewKind::Array(new)) => {
            old.iter().zip(new).try_for_each(|(c, n)| check_shape(c, n))
        }
        _ => Ok(()),
    }
}

struct Reconciler<'s, S: ?Sized> {
    surface: &'s mut S,
    edit: AccumulatedEdit,
}

impl<S: TextSurface + ?Sized> Reconciler<'_, S> {
    fn visit(
        &mut self,
        current: &MountedNode,
        next: &ViewNode,
    ) -> Result<MountedNode, RenderError> {
        match (&current.kind, &next.kind) {
            (MountedKind::Text(old), ViewKind::Text(new)) if old == new => Ok(MountedNode {
                kind: MountedKind::Text(old.clone()),
                start: self.edit.update_pos(current.start),
                end: self.edit.update_pos(current.end),
                // handlers may close over fresh state even when the text is unchanged
                decoration: next.decoration.clone(),
                bindings: next.bindings.clone(),
            }),
            (
                MountedKind::Component {
                    template,
                    children: old,
                },
                ViewKind::Component {
                    template: next_template,
                    children: new,
                },
            ) if template == next_template => {
                debug_assert_eq!(old.len(), new.len());
                let start = self.edit.update_pos(current.start);
                let empty_end = self.edit.update_pos(current.end);

                let children = old
                    .iter()
                    .zip(new)
                    .map(|(c, n)| self.visit(c, n))
                    .collect::<Result<Vec<_>, _>>()?;
                let end = children.last().map_or(empty_end, |child| child.end);

                Ok(MountedNode {
                    kind: MountedKind::Component {
                        template: *template,
                        children,
                    },
                    start,
                    end,
                    decoration: next.decoration.clone(),
                    bindings: next.bindings.clone(),
                })
            }
            (MountedKind::Array(old), ViewKind::Array(new)) => {
                self.visit_array(current, old, next, new)
            }
            _ => self.replace(current, next),
        }
    }

    fn visit_array(
        &mut self,
        current: &MountedNode,
        old: &[MountedNode],
        next: &ViewNode,
        new: &[ViewNode],
    ) -> Result<MountedNode, RenderError> {
        let start = self.edit.update_pos(current.start);

        let mut children = Vec::with_capacity(new.len());
        for (c, n) in old.iter().zip(new) {
            children.push(self.visit(c, n)?);
        }
        let mut tail = children.last().map_or(start, |child| child.end);

        if old.len() > new.len() {
            // Non-empty, since it is longer than `new`.
            let old_end = old.last().map_or(current.end, |child| child.end);
            let shifted_end = self.edit.update_pos(old_end);
            log::trace!(
                "dropping {} array items at {tail}..{shifted_end}",
                old.len() - new.len()
            );
            self.surface.delete_range(tail, shifted_end)?;
            self.edit.fold(old_end, tail);
        }

        // Pre-patch position of the point new items are appended at; after every fold it
        // maps to the end of the previously placed item.
        let anchor = old.last().map_or(current.start, |child| child.end);
        for n in new.iter().skip(old.len()) {
            log::trace!("appending array item at {tail}");
            let rendered = render(&mut *self.surface, n, MountPoint::point(tail))?;
            self.edit.fold(anchor, rendered.end);
            tail = rendered.end;
            children.push(rendered);
        }

        Ok(MountedNode {
            kind: MountedKind::Array(children),
            start,
            end: tail,
            decoration: next.decoration.clone(),
            bindings: next.bindings.clone(),
        })
    }

    fn replace(
        &mut self,
        current: &MountedNode,
        next: &ViewNode,
    ) -> Result<MountedNode, RenderError> {
        let range = MountPoint::new(
            self.edit.update_pos(current.start),
            self.edit.update_pos(current.end),
        );
        log::trace!("re-rendering node at {range}");
        let rendered = render(&mut *self.surface, next, range)?;
        self.edit.fold(current.end, rendered.end);
        Ok(rendered)
    }
}

//! The text surface a tree is mounted into.
//!
//! The surface is owned by the host (an editor buffer, a terminal pane, an in-memory document).
//! The renderer and reconciler only ever talk to it through [`TextSurface`].

use crate::error::SurfaceError;
use crate::mounted::DecorationSpan;
use crate::position::{self, MountPoint, Position};

/// A line-oriented, externally owned text document addressed by `(row, byte column)`.
pub trait TextSurface {
    /// Atomically replace the text in `range` with `lines` joined by `'\n'`.
    ///
    /// Must support zero-width ranges (pure insertion) and ranges spanning several rows. An
    /// empty `lines` slice deletes the range.
    fn replace_range(&mut self, range: MountPoint, lines: &[&str]) -> Result<(), SurfaceError>;

    /// Delete `[start, end)`.
    fn delete_range(&mut self, start: Position, end: Position) -> Result<(), SurfaceError> {
        self.replace_range(MountPoint::new(start, end), &[])
    }

    /// Current cursor position.
    fn cursor_position(&self) -> Position;

    /// Column width of `text` under the surface's own encoding rules.
    ///
    /// The renderer measures every node's columns with this, so it must agree with the columns
    /// [`replace_range`](Self::replace_range) and [`cursor_position`](Self::cursor_position)
    /// use. The default counts UTF-8 bytes.
    fn byte_width(&self, text: &str) -> usize {
        position::byte_width(text)
    }

    /// Replace the decorations shown in `region` with `spans`.
    ///
    /// Existing spans overlapping `region` or lying within its bounds (zero-width ones
    /// included) are removed; spans only touching its edges stay.
    ///
    /// Surfaces without highlighting support can ignore this.
    fn set_decorations(
        &mut self,
        region: MountPoint,
        spans: &[DecorationSpan],
    ) -> Result<(), SurfaceError> {
        let _ = (region, spans);
        Ok(())
    }
}

/// One write issued to a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEdit {
    /// The replaced range, in document coordinates at the time of the write.
    pub range: MountPoint,
    /// Replacement lines (joined by `'\n'`); empty for a deletion.
    pub lines: Vec<String>,
}

impl SurfaceEdit {
    /// Returns `true` if this edit removed text without inserting any.
    pub fn is_deletion(&self) -> bool {
        self.lines.iter().all(String::is_empty) && !self.range.is_empty()
    }

    /// Returns `true` if this edit inserted text at a zero-width point.
    pub fn is_insertion(&self) -> bool {
        self.range.is_empty()
    }

    /// The inserted text.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

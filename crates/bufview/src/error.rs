//! Error types.

use crate::position::Position;
use crate::view::TemplateId;
use thiserror::Error;

/// A write rejected by a [`TextSurface`](crate::TextSurface).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The row does not exist.
    #[error("row {row} is out of range (document has {line_count} lines)")]
    RowOutOfRange {
        /// Requested row.
        row: usize,
        /// Number of rows in the document.
        line_count: usize,
    },
    /// The column is past the end of its row.
    #[error("column {col} is past the end of row {row} ({len} bytes)")]
    ColumnOutOfRange {
        /// Row of the position.
        row: usize,
        /// Requested byte column.
        col: usize,
        /// Byte length of the row.
        len: usize,
    },
    /// The column splits a multi-byte character.
    #[error("column {col} on row {row} is not on a character boundary")]
    NotCharBoundary {
        /// Row of the position.
        row: usize,
        /// Requested byte column.
        col: usize,
    },
    /// The range ends before it starts.
    #[error("range end {end} precedes start {start}")]
    InvertedRange {
        /// Range start.
        start: Position,
        /// Range end.
        end: Position,
    },
}

/// Failure while rendering or patching a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The text surface rejected a write.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    /// Two components share a template id but not a child count.
    ///
    /// Components built by the same template always have the same shape, so this points at a
    /// hand-built component reusing someone else's id. No edit is issued when this is returned.
    #[error("{template} expected {expected} children but the new tree has {actual}")]
    TemplateShapeMismatch {
        /// The shared template id.
        template: TemplateId,
        /// Child count of the mounted component.
        expected: usize,
        /// Child count of the new component.
        actual: usize,
    },
}

/// A mounted tree whose ranges are out of document order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("child {index} at {start}..{end} is out of order (previous end {previous}, parent {parent_start}..{parent_end})")]
pub struct PositionError {
    /// Index of the offending child within its parent.
    pub index: usize,
    /// Start of the offending child.
    pub start: Position,
    /// End of the offending child.
    pub end: Position,
    /// End of the preceding sibling, or the parent start for the first child.
    pub previous: Position,
    /// Parent range start.
    pub parent_start: Position,
    /// Parent range end.
    pub parent_end: Position,
}

/// Failure caught at the app loop boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// `Program::update` returned an error.
    #[error("update failed: {0:#}")]
    Update(anyhow::Error),
    /// A thunk resolved to an error.
    #[error("thunk failed: {0:#}")]
    Thunk(anyhow::Error),
    /// Rendering into the surface failed.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}

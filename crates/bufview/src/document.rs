//! In-memory [`TextSurface`] backed by a rope.
//!
//! [`RopeDocument`] is the reference surface: it addresses columns in bytes, splits rows on
//! `'\n'` only, validates every write, and keeps a log of the writes it received so callers can
//! observe exactly which edits a render or patch issued.

use crate::error::SurfaceError;
use crate::mounted::DecorationSpan;
use crate::position::{MountPoint, Position};
use crate::surface::{SurfaceEdit, TextSurface};
use ropey::Rope;

/// A rope-backed text document.
#[derive(Debug, Clone, Default)]
pub struct RopeDocument {
    rope: Rope,
    cursor: Position,
    edits: Vec<SurfaceEdit>,
    decorations: Vec<DecorationSpan>,
}

impl RopeDocument {
    /// Create a document holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            ..Self::default()
        }
    }

    /// Create an empty document (one empty line).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Full document text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Number of rows. An empty document has one.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Text of `row` without its trailing newline.
    pub fn line(&self, row: usize) -> Option<String> {
        if row >= self.rope.len_lines() {
            return None;
        }
        let mut text = self.rope.line(row).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        Some(text)
    }

    /// All rows, without newlines.
    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count())
            .filter_map(|row| self.line(row))
            .collect()
    }

    /// Text in `range`.
    pub fn slice(&self, range: MountPoint) -> Result<String, SurfaceError> {
        let (start, end) = self.char_range(range)?;
        Ok(self.rope.slice(start..end).to_string())
    }

    /// Move the cursor. The position must address an existing character boundary.
    pub fn set_cursor(&mut self, pos: Position) -> Result<(), SurfaceError> {
        self.byte_index(pos)?;
        self.cursor = pos;
        Ok(())
    }

    /// Writes received so far, oldest first.
    pub fn edits(&self) -> &[SurfaceEdit] {
        &self.edits
    }

    /// Drain the write log.
    pub fn take_edits(&mut self) -> Vec<SurfaceEdit> {
        std::mem::take(&mut self.edits)
    }

    /// Decorations currently applied, in the order they were set.
    pub fn decorations(&self) -> &[DecorationSpan] {
        &self.decorations
    }

    fn line_len(&self, row: usize) -> usize {
        let line = self.rope.line(row);
        let len = line.len_bytes();
        if len > 0 && line.byte(len - 1) == b'\n' {
            len - 1
        } else {
            len
        }
    }

    fn byte_index(&self, pos: Position) -> Result<usize, SurfaceError> {
        let line_count = self.rope.len_lines();
        if pos.row >= line_count {
            return Err(SurfaceError::RowOutOfRange {
                row: pos.row,
                line_count,
            });
        }

        let len = self.line_len(pos.row);
        if pos.col > len {
            return Err(SurfaceError::ColumnOutOfRange {
                row: pos.row,
                col: pos.col,
                len,
            });
        }

        let byte = self.rope.line_to_byte(pos.row) + pos.col;
        if self.rope.char_to_byte(self.rope.byte_to_char(byte)) != byte {
            return Err(SurfaceError::NotCharBoundary {
                row: pos.row,
                col: pos.col,
            });
        }
        Ok(byte)
    }

    fn char_range(&self, range: MountPoint) -> Result<(usize, usize), SurfaceError> {
        if range.end < range.start {
            return Err(SurfaceError::InvertedRange {
                start: range.start,
                end: range.end,
            });
        }
        let start = self.rope.byte_to_char(self.byte_index(range.start)?);
        let end = self.rope.byte_to_char(self.byte_index(range.end)?);
        Ok((start, end))
    }
}

impl TextSurface for RopeDocument {
    fn replace_range(&mut self, range: MountPoint, lines: &[&str]) -> Result<(), SurfaceError> {
        let (start, end) = self.char_range(range)?;
        let text = lines.join("\n");

        self.rope.remove(start..end);
        self.rope.insert(start, &text);
        log::trace!("replaced {range} with {} lines", lines.len().max(1));

        self.edits.push(SurfaceEdit {
            range,
            lines: lines.iter().map(|line| line.to_string()).collect(),
        });
        Ok(())
    }

    fn cursor_position(&self) -> Position {
        self.cursor
    }

    fn set_decorations(
        &mut self,
        region: MountPoint,
        spans: &[DecorationSpan],
    ) -> Result<(), SurfaceError> {
        self.decorations.retain(|span| !span_in_region(span, region));
        self.decorations.extend_from_slice(spans);
        Ok(())
    }
}

/// A span belongs to `region` if it overlaps it or lies within its bounds. The second test
/// catches zero-width spans and zero-width regions.
fn span_in_region(span: &DecorationSpan, region: MountPoint) -> bool {
    let overlaps = span.start < region.end && span.end > region.start;
    let contained = span.start >= region.start && span.end <= region.end;
    overlaps || contained
}

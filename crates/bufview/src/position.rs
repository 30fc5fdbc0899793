//! Byte-accurate position arithmetic.
//!
//! The host document addresses text by `(row, col)` where `col` is a **byte offset** into the
//! UTF-8 encoded line, not a character or UTF-16 index. Everything in this crate that places a
//! node in the document goes through the helpers in this module, so multi-byte characters and
//! multi-codepoint grapheme clusters are measured exactly the way the document measures them.

use std::cmp::Ordering;
use std::fmt;

/// A document position: zero-based row and zero-based **byte** column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Zero-based row (line) index.
    pub row: usize,
    /// Zero-based column, in bytes from the start of the row.
    pub col: usize,
}

impl Position {
    /// The first position of a document.
    pub const ZERO: Self = Self { row: 0, col: 0 };

    /// Create a new position.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

/// A half-open document range `[start, end)`.
///
/// Used both as the region owned by a mounted tree and as the target of a single surface write.
/// `start == end` is a valid, zero-width insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MountPoint {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl MountPoint {
    /// Create a range from `start` to `end`.
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width range at `pos`.
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Returns `true` if the range is zero-width.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if `pos` lies in `[start, end)`.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }
}

impl fmt::Display for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Width of `text` in document columns, i.e. its UTF-8 byte length.
///
/// Grapheme clusters such as `"❤️"` (U+2764 U+FE0F) or ZWJ emoji sequences are not special:
/// every scalar value in the cluster contributes its full encoded length, which is exactly what
/// the document reports for the same text.
pub fn byte_width(text: &str) -> usize {
    text.len()
}

/// Walk `text` from its start up to byte offset `upto`, starting at `pos`.
///
/// Every `'\n'` moves to the next row and resets the column; any other character advances the
/// column by its encoded width. `upto` is clamped to `text.len()` and must fall on a character
/// boundary (offsets produced by concatenating whole strings always do).
pub fn advance(pos: Position, text: &str, upto: usize) -> Position {
    let upto = upto.min(text.len());
    let mut out = pos;
    for (idx, ch) in text.char_indices() {
        if idx >= upto {
            break;
        }
        if ch == '\n' {
            out.row += 1;
            out.col = 0;
        } else {
            out.col += ch.len_utf8();
        }
    }
    out
}

/// Maps byte offsets in a flattened string to document positions.
///
/// With [`byte_width`] as the measure this is equivalent to calling [`advance`] from `origin`
/// for every offset, but answers each query with a binary search over line starts instead of
/// re-walking the text.
#[derive(Debug, Clone)]
pub(crate) struct OffsetIndex<'a> {
    origin: Position,
    text: &'a str,
    /// Byte offset at which each line of the text starts; always begins with `0`.
    line_starts: Vec<usize>,
}

impl<'a> OffsetIndex<'a> {
    pub(crate) fn new(origin: Position, text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self {
            origin,
            text,
            line_starts,
        }
    }

    /// Position of byte `offset`, with the column measured by `width` over the text between the
    /// start of its line and `offset`.
    pub(crate) fn position(&self, offset: usize, width: impl Fn(&str) -> usize) -> Position {
        // line_starts[0] == 0, so the partition point is at least 1.
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let col = self
            .text
            .get(line_start..offset)
            .map_or(offset - line_start, width);
        if line == 0 {
            Position::new(self.origin.row, self.origin.col + col)
        } else {
            Position::new(self.origin.row + line, col)
        }
    }
}

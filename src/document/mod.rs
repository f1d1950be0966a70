//! The seam between the chat engine and whatever is actually holding the
//! text being edited.
//!
//! All addressing at this boundary is in character (codepoint) offsets so
//! the engine never has to reason about UTF-8 byte widths. Conversions to
//! line/column positions exist for hosts that address text that way.

use std::ops::Range;

/// A line/column address within a document. Both are zero-based and counted
/// in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A live, mutable text document. All operations are synchronous within a
/// single scheduling turn; the engine performs every mutation through this
/// trait so offset bookkeeping stays in one place.
pub trait Document {
    /// Length in characters.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the text in `range` (character offsets).
    fn read(&self, range: Range<usize>) -> String;

    /// The entire document text.
    fn text(&self) -> String {
        self.read(0..self.len())
    }

    /// Replace the text in `range` with `replacement`. An empty range is an
    /// insertion; an empty replacement is a deletion.
    fn replace(&mut self, range: Range<usize>, replacement: &str);

    fn insert(&mut self, at: usize, text: &str) {
        self.replace(at..at, text);
    }

    fn offset_to_position(&self, offset: usize) -> Position;

    fn position_to_offset(&self, position: Position) -> usize;

    /// Move the caret to `offset` so the user ends up looking at the right
    /// place once streaming finishes.
    fn set_caret(&mut self, offset: usize);
}

/// The single mutable insertion point threaded through the stream writer.
/// It is the sole source of truth for where the next fragment goes and is
/// advanced by exactly the character length of each appended fragment.
#[derive(Clone, Copy, Debug)]
pub struct InsertionCursor {
    offset: usize,
}

impl InsertionCursor {
    pub fn new(offset: usize) -> Self {
        InsertionCursor { offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn advance(&mut self, chars: usize) {
        self.offset += chars;
    }
}

/// An in-memory `Document` backed by a `String`. Used by the CLI (the file
/// is loaded, the engine runs against it, and the result is written back)
/// and by tests.
#[derive(Clone, Debug, Default)]
pub struct TextDocument {
    buf: String,
    caret: usize,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        TextDocument {
            buf: text.into(),
            caret: 0,
        }
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    fn byte_at(&self, offset: usize) -> usize {
        self.buf
            .char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(self.buf.len()))
            .nth(offset)
            .unwrap_or(self.buf.len())
    }
}

impl Document for TextDocument {
    fn len(&self) -> usize {
        self.buf.chars().count()
    }

    fn read(&self, range: Range<usize>) -> String {
        let start = self.byte_at(range.start);
        let end = self.byte_at(range.end);
        self.buf[start..end].to_string()
    }

    fn replace(&mut self, range: Range<usize>, replacement: &str) {
        let start = self.byte_at(range.start);
        let end = self.byte_at(range.end);
        self.buf.replace_range(start..end, replacement);
    }

    fn offset_to_position(&self, offset: usize) -> Position {
        let mut line = 0;
        let mut column = 0;
        for c in self.buf.chars().take(offset) {
            if c == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        Position { line, column }
    }

    fn position_to_offset(&self, position: Position) -> usize {
        let mut offset = 0;
        let mut line = 0;
        for c in self.buf.chars() {
            if line == position.line {
                break;
            }
            if c == '\n' {
                line += 1;
            }
            offset += 1;
        }
        offset + position.column
    }

    fn set_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.len());
    }
}

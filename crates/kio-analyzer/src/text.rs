// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Positions, ranges and edits over plain document text.
//!
//! Positions are zero-based `(line, character)` pairs. `character` counts
//! unicode scalar values, never bytes, so a position stays meaningful no
//! matter how the text is stored.

/// A zero-based location in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// Line index (0-based).
    pub line: u32,
    /// Offset within the line, in unicode scalar values (0-based).
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A contiguous span between two positions, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Build a range, swapping the endpoints if they arrive reversed.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `position` lies within the range, end inclusive.
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A single replacement inside one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }
}

/// Byte offset / position conversion for one text snapshot.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    /// Byte offset at which every line starts.
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        Self { text, line_starts }
    }

    /// Number of lines. A trailing newline opens one final empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where `line` starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// The text of `line` without its terminator (`\n` or `\r\n`).
    pub fn line(&self, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let content = &self.text[start..end];
        Some(content.strip_suffix('\r').unwrap_or(content))
    }

    /// Convert a byte offset to a position.
    ///
    /// Offsets past the end clamp to the end of the text; offsets inside a
    /// multi-byte character snap back to that character's start.
    pub fn position_of(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let character = self.text[self.line_starts[line]..offset].chars().count();

        Position::new(line as u32, character as u32)
    }

    /// Convert a position to a byte offset.
    ///
    /// Characters past the end of a line clamp to the line end. Returns
    /// `None` for lines that do not exist.
    pub fn offset_of(&self, position: Position) -> Option<usize> {
        let line_idx = position.line as usize;
        let content = self.line(line_idx)?;
        let start = self.line_starts[line_idx];

        let within = content
            .char_indices()
            .nth(position.character as usize)
            .map(|(idx, _)| idx)
            .unwrap_or(content.len());

        Some(start + within)
    }

    /// The position just past the last character of the text.
    pub fn end_position(&self) -> Position {
        self.position_of(self.text.len())
    }

    /// Range covering the whole text.
    pub fn full_range(&self) -> Range {
        Range::new(Position::default(), self.end_position())
    }
}

/// Apply a set of non-overlapping edits to `text`.
///
/// Edits may arrive in any order. Edits whose range points at a line that
/// does not exist are dropped.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let index = LineIndex::new(text);

    let mut resolved: Vec<(usize, usize, &str)> = edits
        .iter()
        .filter_map(|edit| {
            let start = index.offset_of(edit.range.start)?;
            let end = index.offset_of(edit.range.end)?;
            Some((start, end, edit.new_text.as_str()))
        })
        .collect();

    // Back to front so earlier offsets stay valid.
    resolved.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

    let mut output = text.to_string();
    for (start, end, new_text) in resolved {
        output.replace_range(start..end, new_text);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_new_orders_endpoints() {
        let range = Range::new(Position::new(2, 0), Position::new(1, 5));
        assert_eq!(range.start, Position::new(1, 5));
        assert_eq!(range.end, Position::new(2, 0));
    }

    #[test]
    fn test_line_index_lines() {
        let index = LineIndex::new("fn main() {\r\n    x\n}\n");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line(0), Some("fn main() {"));
        assert_eq!(index.line(1), Some("    x"));
        assert_eq!(index.line(2), Some("}"));
        assert_eq!(index.line(3), Some(""));
        assert_eq!(index.line(4), None);
    }

    #[test]
    fn test_position_counts_scalar_values() {
        let text = "let s = \"héllo\"; x";
        let index = LineIndex::new(text);
        let offset = text.find('x').unwrap();
        assert_eq!(index.position_of(offset), Position::new(0, 17));
        assert_eq!(index.offset_of(Position::new(0, 17)), Some(offset));
    }

    #[test]
    fn test_position_of_clamps_past_end() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.position_of(100), Position::new(1, 2));
        assert_eq!(index.end_position(), Position::new(1, 2));
    }

    #[test]
    fn test_offset_of_clamps_to_line_end() {
        let index = LineIndex::new("ab\r\ncd");
        assert_eq!(index.offset_of(Position::new(0, 10)), Some(2));
        assert_eq!(index.offset_of(Position::new(5, 0)), None);
    }

    #[test]
    fn test_apply_edits_any_order() {
        let text = "a b a";
        let edits = vec![
            TextEdit::replace(Range::new(Position::new(0, 0), Position::new(0, 1)), "xx"),
            TextEdit::replace(Range::new(Position::new(0, 4), Position::new(0, 5)), "yy"),
        ];
        assert_eq!(apply_edits(text, &edits), "xx b yy");
    }

    #[test]
    fn test_apply_edits_full_range() {
        let text = "one\ntwo\n";
        let index = LineIndex::new(text);
        let edit = TextEdit::replace(index.full_range(), "three");
        assert_eq!(apply_edits(text, &[edit]), "three");
    }
}

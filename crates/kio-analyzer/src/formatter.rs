// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Indentation formatter.
//!
//! # How it works
//!
//! 1. We scan the document for the block depth of every line
//! 2. The desired indent of a line is the indent unit repeated `depth` times
//! 3. We emit an edit only where the existing leading whitespace differs
//!
//! Only the leading whitespace of a line is ever rewritten. Trailing
//! whitespace and line terminators are left alone, so per-line edits and
//! the whole-document replacement always produce the same text.

use std::ops::RangeInclusive;

use crate::scanner;
use crate::text::{apply_edits, LineIndex, Position, Range, TextEdit};

/// Default indent width, in spaces.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// The whitespace inserted once per depth level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentUnit(String);

impl IndentUnit {
    pub fn spaces(width: usize) -> Self {
        Self(" ".repeat(width))
    }

    pub fn tab() -> Self {
        Self("\t".to_string())
    }

    /// Build a unit from editor formatting options.
    ///
    /// A zero tab size falls back to the default width.
    pub fn from_options(tab_size: u32, insert_spaces: bool) -> Self {
        if !insert_spaces {
            return Self::tab();
        }
        match tab_size {
            0 => Self::spaces(DEFAULT_INDENT_WIDTH),
            width => Self::spaces(width as usize),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The indent string for `depth` levels.
    pub fn repeat(&self, depth: u32) -> String {
        self.0.repeat(depth as usize)
    }
}

impl Default for IndentUnit {
    fn default() -> Self {
        Self::spaces(DEFAULT_INDENT_WIDTH)
    }
}

/// The indentation engine.
#[derive(Debug, Clone, Default)]
pub struct FormatterEngine {
    unit: IndentUnit,
}

impl FormatterEngine {
    pub fn new(unit: IndentUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> &IndentUnit {
        &self.unit
    }

    /// One edit per line whose leading whitespace is wrong.
    pub fn line_edits(&self, text: &str) -> Vec<TextEdit> {
        self.edits_in(text, 0..=usize::MAX)
    }

    /// Line edits restricted to `first_line..=last_line`.
    pub fn range_edits(&self, text: &str, first_line: u32, last_line: u32) -> Vec<TextEdit> {
        let (first, last) = if first_line <= last_line {
            (first_line, last_line)
        } else {
            (last_line, first_line)
        };
        self.edits_in(text, first as usize..=last as usize)
    }

    /// Edits for a single line, used while typing.
    pub fn on_type_edits(&self, text: &str, line: u32) -> Vec<TextEdit> {
        self.range_edits(text, line, line)
    }

    /// The reindented text.
    pub fn format_text(&self, text: &str) -> String {
        apply_edits(text, &self.line_edits(text))
    }

    /// Replace the whole document in one edit.
    ///
    /// Returns no edits when the document is already formatted.
    pub fn format_document(&self, text: &str) -> Vec<TextEdit> {
        let formatted = self.format_text(text);
        if formatted == text {
            return vec![];
        }

        let range = LineIndex::new(text).full_range();
        tracing::debug!(
            "Formatted document: {} -> {} bytes",
            text.len(),
            formatted.len()
        );
        vec![TextEdit::replace(range, formatted)]
    }

    fn edits_in(&self, text: &str, lines: RangeInclusive<usize>) -> Vec<TextEdit> {
        let scan = scanner::scan(text);
        let depths = scan.depths();
        let index = LineIndex::new(text);

        let mut edits = Vec::new();

        for (line_idx, (shape, depth)) in scan.lines.iter().zip(depths).enumerate() {
            if !lines.contains(&line_idx) {
                continue;
            }

            // Whitespace at the start of these lines belongs to a string.
            if shape.starts_in_string {
                continue;
            }

            let Some(content) = index.line(line_idx) else {
                continue;
            };

            let trimmed = content.trim_start();
            let current = &content[..content.len() - trimmed.len()];

            let desired = if trimmed.trim_end().is_empty() {
                String::new()
            } else {
                self.unit.repeat(depth)
            };

            if current == desired {
                continue;
            }

            let line = line_idx as u32;
            let width = current.chars().count() as u32;
            edits.push(TextEdit::replace(
                Range::new(Position::new(line, 0), Position::new(line, width)),
                desired,
            ));
        }

        edits
    }
}

// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Rename engine: whole-word identifier substitution across open documents.
//!
//! # How it works
//!
//! 1. Find the identifier under the cursor in the anchor document
//! 2. Validate the replacement name
//! 3. Search every document in the snapshot set for whole-word occurrences
//! 4. Group the replacements per document, in ascending order
//!
//! There is no symbol table behind this: any whole-word match is renamed,
//! wherever it appears. Matches inside hex color literals are the one
//! exception, so renaming `abcdef` leaves `#abcdef` alone.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::scanner::{self, SpanKind};
use crate::text::{LineIndex, Position, Range, TextEdit};
use crate::validation;
use crate::workspace::{DocumentSnapshot, WorkspaceView};

/// Why a replacement name was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    #[error("Invalid identifier '{0}': must start with letter or underscore")]
    InvalidIdentifier(String),

    #[error("Cannot rename to the keyword '{0}'")]
    Keyword(String),

    #[error("Cannot rename to the built-in type '{0}'")]
    BuiltinType(String),
}

/// Edits for one document, tagged with the version they were computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEdits {
    pub version: i32,
    /// Non-overlapping, ascending.
    pub edits: Vec<TextEdit>,
}

/// The result of a rename: edits grouped per document URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEdits {
    pub old_name: String,
    pub new_name: String,
    pub changes: BTreeMap<String, DocumentEdits>,
}

impl WorkspaceEdits {
    /// Total number of replacements across all documents.
    pub fn edit_count(&self) -> usize {
        self.changes.values().map(|doc| doc.edits.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Renames over one consistent snapshot of the workspace.
#[derive(Debug, Clone)]
pub struct RenameEngine {
    documents: Vec<DocumentSnapshot>,
}

impl RenameEngine {
    pub fn new(documents: Vec<DocumentSnapshot>) -> Self {
        Self { documents }
    }

    /// Snapshot every document currently open in `view`.
    pub fn from_workspace(view: &WorkspaceView) -> Self {
        Self::new(view.snapshot_all())
    }

    /// Rename the identifier at `position` in `anchor_uri` to `new_name`.
    ///
    /// Returns `Ok(None)` when there is nothing to do: the anchor document is
    /// unknown, no renamable identifier sits at the position, the name is
    /// unchanged, or no occurrence lies outside a color literal.
    pub fn rename(
        &self,
        anchor_uri: &str,
        position: Position,
        new_name: &str,
    ) -> Result<Option<WorkspaceEdits>, RenameError> {
        let Some(anchor) = self.documents.iter().find(|doc| doc.uri == anchor_uri) else {
            tracing::debug!("Rename anchor not in snapshot: {}", anchor_uri);
            return Ok(None);
        };

        let Some((old_name, _)) = renamable_at(&anchor.text, position) else {
            return Ok(None);
        };

        validate_new_name(new_name)?;

        if old_name == new_name {
            return Ok(None);
        }

        let mut changes = BTreeMap::new();
        for doc in &self.documents {
            let edits: Vec<TextEdit> = find_occurrences(&doc.text, &old_name)
                .into_iter()
                .map(|range| TextEdit::replace(range, new_name))
                .collect();

            if !edits.is_empty() {
                changes.insert(
                    doc.uri.clone(),
                    DocumentEdits {
                        version: doc.version,
                        edits,
                    },
                );
            }
        }

        // Every match sat inside a color literal.
        if changes.is_empty() {
            return Ok(None);
        }

        let result = WorkspaceEdits {
            old_name,
            new_name: new_name.to_string(),
            changes,
        };
        tracing::info!(
            "Rename '{}' -> '{}': {} edits in {} documents",
            result.old_name,
            result.new_name,
            result.edit_count(),
            result.changes.len()
        );

        Ok(Some(result))
    }
}

/// Range of the renamable identifier at `position`, for prepare-rename.
///
/// Keywords, built-in types and words inside color literals are refused.
pub fn prepare(text: &str, position: Position) -> Option<Range> {
    renamable_at(text, position).map(|(_, range)| range)
}

/// The word at `position`, unless it is the digits of a color literal.
pub fn identifier_at(text: &str, position: Position) -> Option<(String, Range)> {
    let (word, range) = word_at_position(text, position)?;
    let in_literal = scanner::scan(text)
        .spans
        .iter()
        .any(|span| span.kind == SpanKind::Literal && span.range.overlaps(&range));
    (!in_literal).then_some((word, range))
}

fn renamable_at(text: &str, position: Position) -> Option<(String, Range)> {
    identifier_at(text, position).filter(|(word, _)| is_renamable(word))
}

fn is_renamable(word: &str) -> bool {
    validation::is_valid_identifier(word)
        && !validation::is_keyword(word)
        && !validation::is_builtin_type(word)
}

fn validate_new_name(name: &str) -> Result<(), RenameError> {
    if !validation::is_valid_identifier(name) {
        return Err(RenameError::InvalidIdentifier(name.to_string()));
    }
    if validation::is_keyword(name) {
        return Err(RenameError::Keyword(name.to_string()));
    }
    if validation::is_builtin_type(name) {
        return Err(RenameError::BuiltinType(name.to_string()));
    }
    Ok(())
}

/// Get the word (identifier characters) at a position, with its range.
///
/// The cursor may sit anywhere inside the word or just past its end.
pub fn word_at_position(text: &str, position: Position) -> Option<(String, Range)> {
    let index = LineIndex::new(text);
    let line_content = index.line(position.line as usize)?;
    let chars: Vec<char> = line_content.chars().collect();
    let char_idx = position.character as usize;

    // Check if position is within bounds
    if char_idx > chars.len() {
        return None;
    }

    // Find start of word
    let mut start = char_idx;
    while start > 0 && validation::is_identifier_char(chars[start - 1]) {
        start -= 1;
    }

    // Find end of word
    let mut end = char_idx;
    while end < chars.len() && validation::is_identifier_char(chars[end]) {
        end += 1;
    }

    if start == end {
        return None;
    }

    let range = Range::new(
        Position::new(position.line, start as u32),
        Position::new(position.line, end as u32),
    );
    Some((chars[start..end].iter().collect(), range))
}

/// Find every whole-word occurrence of `name` in `text`, in document order.
///
/// A match counts only if no identifier character touches it on either
/// side, so `foo` never matches inside `foobar` or `_foo`.
pub fn find_occurrences(text: &str, name: &str) -> Vec<Range> {
    let mut ranges = Vec::new();
    if name.is_empty() || name.len() > text.len() {
        return ranges;
    }

    let literals: Vec<(usize, usize)> = scanner::scan(text)
        .spans
        .into_iter()
        .filter(|span| span.kind == SpanKind::Literal)
        .map(|span| (span.start, span.end))
        .collect();

    let index = LineIndex::new(text);
    let mut search_from = 0;

    while let Some(pos) = text[search_from..].find(name) {
        let start = search_from + pos;
        let end = start + name.len();

        let left_ok = !text[..start]
            .chars()
            .next_back()
            .is_some_and(validation::is_identifier_char);
        let right_ok = !text[end..]
            .chars()
            .next()
            .is_some_and(validation::is_identifier_char);
        let in_literal = literals.iter().any(|&(s, e)| start < e && s < end);

        if left_ok && right_ok && !in_literal {
            ranges.push(Range::new(index.position_of(start), index.position_of(end)));
        }

        // Step one character so overlapping candidates are still seen.
        search_from = start + text[start..].chars().next().map_or(1, char::len_utf8);
    }

    ranges
}

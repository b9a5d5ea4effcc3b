// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Conversions between analyzer types and LSP types.
//!
//! The analyzer counts characters in unicode scalar values. Editors that
//! cannot speak UTF-32 send UTF-16 offsets, which are translated here
//! against the line text.

use std::collections::HashMap;

use kio_analyzer::completion::{CompletionEntry, CompletionKind};
use kio_analyzer::text::{self, apply_edits, LineIndex};
use kio_analyzer::workspace::{ContentChange, DocumentSnapshot, WorkspaceView};
use kio_analyzer::{Rgba, WorkspaceEdits};
use lsp_types::{
    CodeActionKind, Color, CompletionItem, CompletionItemKind, DocumentChanges, InsertTextFormat,
    OneOf, OptionalVersionedTextDocumentIdentifier, PositionEncodingKind, TextDocumentContentChangeEvent,
    TextDocumentEdit, TextEdit, Uri, WorkspaceEdit,
};

/// How the client counts characters within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionEncoding {
    #[default]
    Utf16,
    Utf32,
}

impl PositionEncoding {
    /// Prefer UTF-32 when the client offers it; UTF-16 is the protocol default.
    pub fn negotiate(offered: Option<&[PositionEncodingKind]>) -> Self {
        match offered {
            Some(kinds) if kinds.contains(&PositionEncodingKind::UTF32) => Self::Utf32,
            _ => Self::Utf16,
        }
    }

    pub fn kind(self) -> PositionEncodingKind {
        match self {
            Self::Utf16 => PositionEncodingKind::UTF16,
            Self::Utf32 => PositionEncodingKind::UTF32,
        }
    }

    pub fn from_lsp(self, index: &LineIndex, position: lsp_types::Position) -> text::Position {
        let character = match (self, index.line(position.line as usize)) {
            (Self::Utf16, Some(line)) => {
                let mut units = 0;
                let mut chars = 0;
                for c in line.chars() {
                    if units >= position.character {
                        break;
                    }
                    units += c.len_utf16() as u32;
                    chars += 1;
                }
                chars
            }
            _ => position.character,
        };
        text::Position::new(position.line, character)
    }

    pub fn to_lsp(self, index: &LineIndex, position: text::Position) -> lsp_types::Position {
        let character = match (self, index.line(position.line as usize)) {
            (Self::Utf16, Some(line)) => line
                .chars()
                .take(position.character as usize)
                .map(|c| c.len_utf16() as u32)
                .sum(),
            _ => position.character,
        };
        lsp_types::Position::new(position.line, character)
    }

    pub fn range_from_lsp(self, index: &LineIndex, range: lsp_types::Range) -> text::Range {
        text::Range::new(
            self.from_lsp(index, range.start),
            self.from_lsp(index, range.end),
        )
    }

    pub fn range_to_lsp(self, index: &LineIndex, range: text::Range) -> lsp_types::Range {
        lsp_types::Range::new(
            self.to_lsp(index, range.start),
            self.to_lsp(index, range.end),
        )
    }

    pub fn edit_to_lsp(self, index: &LineIndex, edit: &text::TextEdit) -> lsp_types::TextEdit {
        lsp_types::TextEdit {
            range: self.range_to_lsp(index, edit.range),
            new_text: edit.new_text.clone(),
        }
    }

    /// Translate a batch of editor changes.
    ///
    /// Each change is relative to the text left by the previous one, so for
    /// UTF-16 clients the batch is replayed on a scratch copy of `content`.
    pub fn changes_from_lsp(
        self,
        content: &str,
        changes: Vec<TextDocumentContentChangeEvent>,
    ) -> Vec<ContentChange> {
        if self == Self::Utf32 {
            return changes
                .into_iter()
                .map(|change| match change.range {
                    Some(range) => ContentChange::incremental(
                        text::Range::new(
                            text::Position::new(range.start.line, range.start.character),
                            text::Position::new(range.end.line, range.end.character),
                        ),
                        change.text,
                    ),
                    None => ContentChange::full(change.text),
                })
                .collect();
        }

        let mut scratch = content.to_string();
        let mut converted = Vec::with_capacity(changes.len());

        for change in changes {
            match change.range {
                Some(range) => {
                    let range = self.range_from_lsp(&LineIndex::new(&scratch), range);
                    scratch = apply_edits(&scratch, &[text::TextEdit::replace(range, &change.text)]);
                    converted.push(ContentChange::incremental(range, change.text));
                }
                None => {
                    scratch = change.text.clone();
                    converted.push(ContentChange::full(change.text));
                }
            }
        }

        converted
    }
}

pub fn color_to_lsp(color: &Rgba) -> Color {
    Color {
        red: color.red,
        green: color.green,
        blue: color.blue,
        alpha: color.alpha,
    }
}

pub fn color_from_lsp(color: &Color) -> Rgba {
    Rgba::new(color.red, color.green, color.blue, color.alpha)
}

pub fn completion_item(entry: &CompletionEntry) -> CompletionItem {
    let kind = match entry.kind {
        CompletionKind::Keyword => CompletionItemKind::KEYWORD,
        CompletionKind::Function => CompletionItemKind::FUNCTION,
        CompletionKind::Type => CompletionItemKind::TYPE_PARAMETER,
        CompletionKind::Snippet => CompletionItemKind::SNIPPET,
    };

    CompletionItem {
        label: entry.label.clone(),
        kind: Some(kind),
        detail: Some(entry.detail.clone()),
        insert_text: entry.insert_text.clone(),
        insert_text_format: entry.is_snippet.then_some(InsertTextFormat::SNIPPET),
        ..Default::default()
    }
}

/// Lines covered by a range-formatting request, inclusive.
///
/// A selection ending at column 0 of a later line does not include that line.
pub fn selected_lines(range: lsp_types::Range) -> (u32, u32) {
    let first = range.start.line;
    let mut last = range.end.line;
    if last > first && range.end.character == 0 {
        last -= 1;
    }
    (first, last)
}

/// Line to reindent for an on-type request.
///
/// After a newline it is the line just finished; the cursor line keeps the
/// indent the editor inserted.
pub fn on_type_line(ch: &str, position: lsp_types::Position) -> u32 {
    match ch {
        "\n" => position.line.saturating_sub(1),
        _ => position.line,
    }
}

/// True if a client asking only for `only` kinds accepts `kind`.
///
/// `refactor` accepts `refactor.extract`; kinds form a dotted hierarchy.
pub fn accepts_kind(only: &[CodeActionKind], kind: &CodeActionKind) -> bool {
    only.iter().any(|requested| {
        let requested = requested.as_str();
        kind.as_str() == requested
            || kind
                .as_str()
                .strip_prefix(requested)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// True if the document moved on, or was closed, since `snapshot` was taken.
pub fn is_stale(workspace: &WorkspaceView, snapshot: &DocumentSnapshot) -> bool {
    let stale = !workspace.is_current(&snapshot.uri, snapshot.version);
    if stale {
        tracing::debug!(
            "Dropping result for {} computed at version {}",
            snapshot.uri,
            snapshot.version
        );
    }
    stale
}

/// Drop edits for documents closed since the snapshot was taken.
///
/// Returns `false` if a document that is still open moved past the version
/// its edits were computed against.
pub fn retain_open(workspace: &WorkspaceView, edits: &mut WorkspaceEdits) -> bool {
    let mut current = true;
    edits.changes.retain(|uri, doc| match workspace.version(uri) {
        Some(version) => {
            current &= version == doc.version;
            true
        }
        None => {
            tracing::debug!("Dropping edits for closed document: {}", uri);
            false
        }
    });
    current
}

/// Build a workspace edit from per-document edits.
///
/// With `versioned` the edits go in `documentChanges` tagged with the version
/// they were computed against, so the client rejects them if the document
/// changed. Otherwise they go in plain `changes`.
pub fn workspace_edit(documents: Vec<(Uri, i32, Vec<TextEdit>)>, versioned: bool) -> WorkspaceEdit {
    if versioned {
        let edits = documents
            .into_iter()
            .map(|(uri, version, edits)| TextDocumentEdit {
                text_document: OptionalVersionedTextDocumentIdentifier {
                    uri,
                    version: Some(version),
                },
                edits: edits.into_iter().map(OneOf::Left).collect(),
            })
            .collect();
        WorkspaceEdit {
            changes: None,
            document_changes: Some(DocumentChanges::Edits(edits)),
            change_annotations: None,
        }
    } else {
        let changes: HashMap<Uri, Vec<TextEdit>> = documents
            .into_iter()
            .map(|(uri, _, edits)| (uri, edits))
            .collect();
        WorkspaceEdit {
            changes: Some(changes),
            document_changes: None,
            change_annotations: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kio_analyzer::RenameEngine;
    use std::str::FromStr;

    fn lsp_range(sl: u32, sc: u32, el: u32, ec: u32) -> lsp_types::Range {
        lsp_types::Range::new(lsp_types::Position::new(sl, sc), lsp_types::Position::new(el, ec))
    }

    #[test]
    fn test_negotiate_prefers_utf32() {
        let offered = [PositionEncodingKind::UTF8, PositionEncodingKind::UTF32];
        assert_eq!(PositionEncoding::negotiate(Some(&offered[..])), PositionEncoding::Utf32);
        assert_eq!(
            PositionEncoding::negotiate(Some(&[PositionEncodingKind::UTF8][..])),
            PositionEncoding::Utf16
        );
        assert_eq!(PositionEncoding::negotiate(None), PositionEncoding::Utf16);
    }

    #[test]
    fn test_utf16_positions_count_surrogate_pairs() {
        let content = "let 😀 = x";
        let index = LineIndex::new(content);

        // `x` is char 8 but UTF-16 unit 9
        let core = PositionEncoding::Utf16.from_lsp(&index, lsp_types::Position::new(0, 9));
        assert_eq!(core, text::Position::new(0, 8));

        let back = PositionEncoding::Utf16.to_lsp(&index, core);
        assert_eq!(back, lsp_types::Position::new(0, 9));
    }

    #[test]
    fn test_utf32_positions_pass_through() {
        let index = LineIndex::new("let 😀 = x");
        let core = PositionEncoding::Utf32.from_lsp(&index, lsp_types::Position::new(0, 8));
        assert_eq!(core, text::Position::new(0, 8));
    }

    #[test]
    fn test_utf16_changes_replayed_in_order() {
        let content = "😀a\nb";
        let changes = vec![
            TextDocumentContentChangeEvent {
                range: Some(lsp_range(0, 2, 0, 3)),
                range_length: None,
                text: "xy".to_string(),
            },
            TextDocumentContentChangeEvent {
                range: Some(lsp_range(0, 4, 0, 4)),
                range_length: None,
                text: "z".to_string(),
            },
        ];

        let converted = PositionEncoding::Utf16.changes_from_lsp(content, changes);
        assert_eq!(
            converted[0].range,
            Some(text::Range::new(text::Position::new(0, 1), text::Position::new(0, 2)))
        );
        assert_eq!(
            converted[1].range,
            Some(text::Range::new(text::Position::new(0, 3), text::Position::new(0, 3)))
        );
    }

    #[test]
    fn test_color_round_trip() {
        let color = Rgba::new(0.25, 0.5, 0.75, 1.0);
        assert_eq!(color_from_lsp(&color_to_lsp(&color)), color);
    }

    #[test]
    fn test_completion_item_snippet_format() {
        let entry = CompletionEntry {
            label: "len".to_string(),
            kind: CompletionKind::Function,
            detail: "kio built-in function: len()".to_string(),
            insert_text: Some("len($0)".to_string()),
            is_snippet: true,
        };
        let item = completion_item(&entry);
        assert_eq!(item.kind, Some(CompletionItemKind::FUNCTION));
        assert_eq!(item.insert_text_format, Some(InsertTextFormat::SNIPPET));
    }

    #[test]
    fn test_selected_lines_excludes_column_zero_end() {
        assert_eq!(selected_lines(lsp_range(1, 4, 3, 0)), (1, 2));
        assert_eq!(selected_lines(lsp_range(1, 4, 3, 2)), (1, 3));
        // An empty selection at column 0 still formats its own line
        assert_eq!(selected_lines(lsp_range(2, 0, 2, 0)), (2, 2));
    }

    #[test]
    fn test_on_type_line_after_newline_is_previous_line() {
        let position = lsp_types::Position::new(4, 4);
        assert_eq!(on_type_line("\n", position), 3);
        assert_eq!(on_type_line("}", position), 4);
        assert_eq!(on_type_line("]", position), 4);
        assert_eq!(on_type_line("\n", lsp_types::Position::new(0, 0)), 0);
    }

    #[test]
    fn test_accepts_kind_hierarchy() {
        let extract = CodeActionKind::REFACTOR_EXTRACT;
        assert!(accepts_kind(&[CodeActionKind::REFACTOR], &extract));
        assert!(accepts_kind(&[CodeActionKind::REFACTOR_EXTRACT], &extract));
        assert!(!accepts_kind(&[CodeActionKind::QUICKFIX], &extract));
        assert!(!accepts_kind(&[CodeActionKind::from("refactor.ex")], &extract));
    }

    #[test]
    fn test_is_stale_after_change_or_close() {
        let view = WorkspaceView::new();
        view.open("file:///a.ko", "x = 1", 1);
        let snapshot = view.snapshot("file:///a.ko").unwrap();
        assert!(!is_stale(&view, &snapshot));

        assert!(view.apply_changes("file:///a.ko", vec![ContentChange::full("x = 2")], 2));
        assert!(is_stale(&view, &snapshot));

        let latest = view.snapshot("file:///a.ko").unwrap();
        view.close("file:///a.ko");
        assert!(is_stale(&view, &latest));
    }

    #[test]
    fn test_retain_open_drops_closed_documents() {
        let view = WorkspaceView::new();
        view.open("file:///a.ko", "let count = 1", 1);
        view.open("file:///b.ko", "println(count)", 1);

        let mut edits = RenameEngine::from_workspace(&view)
            .rename("file:///a.ko", text::Position::new(0, 5), "total")
            .unwrap()
            .unwrap();
        assert_eq!(edits.changes.len(), 2);

        view.close("file:///b.ko");
        assert!(retain_open(&view, &mut edits));
        assert_eq!(edits.changes.len(), 1);
        assert!(edits.changes.contains_key("file:///a.ko"));
    }

    #[test]
    fn test_retain_open_reports_newer_versions() {
        let view = WorkspaceView::new();
        view.open("file:///a.ko", "let count = 1", 1);

        let mut edits = RenameEngine::from_workspace(&view)
            .rename("file:///a.ko", text::Position::new(0, 5), "total")
            .unwrap()
            .unwrap();

        assert!(view.apply_changes("file:///a.ko", vec![ContentChange::full("let count = 2")], 2));
        assert!(!retain_open(&view, &mut edits));
        assert_eq!(edits.changes.len(), 1);
    }

    #[test]
    fn test_workspace_edit_versioned_and_plain() {
        let uri = Uri::from_str("file:///a.ko").unwrap();
        let edit = TextEdit {
            range: lsp_range(0, 4, 0, 9),
            new_text: "total".to_string(),
        };

        let versioned = workspace_edit(vec![(uri.clone(), 7, vec![edit.clone()])], true);
        assert!(versioned.changes.is_none());
        match versioned.document_changes {
            Some(DocumentChanges::Edits(docs)) => {
                assert_eq!(docs.len(), 1);
                assert_eq!(docs[0].text_document.version, Some(7));
                assert_eq!(docs[0].edits, vec![OneOf::Left(edit.clone())]);
            }
            other => panic!("expected versioned edits, got {:?}", other),
        }

        let plain = workspace_edit(vec![(uri.clone(), 7, vec![edit.clone()])], false);
        assert!(plain.document_changes.is_none());
        assert_eq!(plain.changes.unwrap()[&uri], vec![edit]);
    }
}

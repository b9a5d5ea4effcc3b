// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Extract-to-function refactoring.
//!
//! # How it works
//!
//! 1. Trim surrounding whitespace from the selection
//! 2. Refuse selections whose blocks do not balance
//! 3. Pick a function name no open document uses yet
//! 4. Replace the selection with a call and append the new function to the
//!    end of the document, reindented by the formatter
//!
//! Parameters and return values are not inferred: the new function takes no
//! arguments, and the call is a bare statement.

use crate::formatter::{FormatterEngine, IndentUnit};
use crate::rename::find_occurrences;
use crate::scanner::{self, SpanKind};
use crate::text::{LineIndex, Range, TextEdit};
use crate::workspace::DocumentSnapshot;

/// Name given to an extracted function, suffixed with a number on clashes.
pub const EXTRACTED_NAME: &str = "extracted_function";

/// The edits that perform an extraction in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub name: String,
    /// The call replacing the selection, then the appended function.
    pub edits: Vec<TextEdit>,
}

/// Extract `selection` of `text` into a new function.
///
/// `documents` are checked so the new name collides with nothing already
/// written. Returns `None` for blank or unbalanced selections.
pub fn extract_function(
    text: &str,
    selection: Range,
    documents: &[DocumentSnapshot],
    unit: &IndentUnit,
) -> Option<Extraction> {
    let index = LineIndex::new(text);
    let start = index.offset_of(selection.start)?;
    let end = index.offset_of(selection.end)?;
    let selected = text.get(start..end)?;

    let body = selected.trim();
    if body.is_empty() || !is_balanced(body) {
        return None;
    }
    let body_start = start + (selected.len() - selected.trim_start().len());
    let body_end = body_start + body.len();

    let name = unused_name(text, documents);
    let function = function_text(&name, body, unit);

    let document_end = index.end_position();
    let insertion = if text.ends_with('\n') {
        format!("\n{function}")
    } else {
        format!("\n\n{}", function.trim_end_matches('\n'))
    };

    let call = Range::new(index.position_of(body_start), index.position_of(body_end));
    tracing::debug!("Extracting {} bytes into '{}'", body.len(), name);

    Some(Extraction {
        edits: vec![
            TextEdit::replace(call, format!("{name}()")),
            TextEdit::replace(Range::new(document_end, document_end), insertion),
        ],
        name,
    })
}

/// Blocks opened in `code` are closed in it, and it never closes one it
/// did not open.
fn is_balanced(code: &str) -> bool {
    let mut depth: i32 = 0;
    for span in scanner::scan(code).spans {
        match span.kind {
            SpanKind::OpenBlock => depth += 1,
            SpanKind::CloseBlock => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

fn unused_name(text: &str, documents: &[DocumentSnapshot]) -> String {
    let taken = |candidate: &str| {
        !find_occurrences(text, candidate).is_empty()
            || documents
                .iter()
                .any(|doc| !find_occurrences(&doc.text, candidate).is_empty())
    };

    if !taken(EXTRACTED_NAME) {
        return EXTRACTED_NAME.to_string();
    }
    (2..)
        .map(|n| format!("{EXTRACTED_NAME}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| EXTRACTED_NAME.to_string())
}

/// `fn name() { body }` laid out one statement per line and reindented.
fn function_text(name: &str, body: &str, unit: &IndentUnit) -> String {
    let shapes = scanner::scan(body).lines;
    let lines: Vec<&str> = body
        .split('\n')
        .zip(&shapes)
        .map(|(line, shape)| {
            let line = line.trim_end_matches('\r');
            // Leading whitespace inside a multi-line string is content.
            if shape.starts_in_string {
                line
            } else {
                line.trim_start()
            }
        })
        .collect();

    let raw = format!("fn {name}() {{\n{}\n}}\n", lines.join("\n"));
    FormatterEngine::new(unit.clone()).format_text(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{apply_edits, Position};

    fn doc(text: &str) -> DocumentSnapshot {
        DocumentSnapshot {
            uri: "file:///a.ko".to_string(),
            text: text.to_string(),
            version: 1,
        }
    }

    fn select(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::new(Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn test_extract_statements() {
        let text = "fn main() {\n    let a = 1\n    println(a)\n}\n";
        let extraction =
            extract_function(text, select(1, 0, 3, 0), &[doc(text)], &IndentUnit::default())
                .unwrap();

        assert_eq!(extraction.name, "extracted_function");
        assert_eq!(
            apply_edits(text, &extraction.edits),
            "fn main() {\n    extracted_function()\n}\n\nfn extracted_function() {\n    let a = 1\n    println(a)\n}\n"
        );
    }

    #[test]
    fn test_extract_reindents_nested_blocks() {
        let text = "fn main() {\n        if x {\n  y()\n        }\n}";
        let extraction =
            extract_function(text, select(1, 0, 3, 9), &[], &IndentUnit::spaces(2)).unwrap();

        assert_eq!(
            apply_edits(text, &extraction.edits),
            "fn main() {\n        extracted_function()\n}\n\nfn extracted_function() {\n  if x {\n    y()\n  }\n}"
        );
    }

    #[test]
    fn test_extract_picks_unused_name() {
        let text = "let v = 1 + 2";
        let other = DocumentSnapshot {
            uri: "file:///b.ko".to_string(),
            text: "extracted_function()\nextracted_function_2()".to_string(),
            version: 3,
        };
        let extraction =
            extract_function(text, select(0, 8, 0, 13), &[other], &IndentUnit::default()).unwrap();
        assert_eq!(extraction.name, "extracted_function_3");
    }

    #[test]
    fn test_extract_refuses_blank_and_unbalanced() {
        let text = "fn main() {\n    x()\n}\n";
        let unit = IndentUnit::default();
        assert!(extract_function(text, select(1, 0, 1, 4), &[], &unit).is_none());
        assert!(extract_function(text, select(0, 0, 1, 7), &[], &unit).is_none());
        assert!(extract_function(text, select(1, 4, 2, 1), &[], &unit).is_none());
    }

    #[test]
    fn test_extract_ignores_braces_in_strings() {
        let text = "print(\"{\")";
        let extraction =
            extract_function(text, select(0, 0, 0, 10), &[], &IndentUnit::default()).unwrap();
        assert_eq!(extraction.edits[0].new_text, "extracted_function()");
    }
}

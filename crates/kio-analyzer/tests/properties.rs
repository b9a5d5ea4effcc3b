// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for scanning, indentation and color literals

use kio_analyzer::colors::{self, Rgba};
use kio_analyzer::formatter::{FormatterEngine, IndentUnit};
use kio_analyzer::rename::{find_occurrences, RenameEngine};
use kio_analyzer::scanner;
use kio_analyzer::text::{apply_edits, LineIndex};
use kio_analyzer::workspace::DocumentSnapshot;
use proptest::prelude::*;

fn source() -> impl Strategy<Value = String> {
    proptest::string::string_regex(r##"[a-c{}\[\] \t\n"#/]{0,80}"##).unwrap()
}

fn program() -> impl Strategy<Value = String> {
    let token = prop::sample::select(vec!["x", "xyz", "y", "{", "}", "let", "1", "\n", "\n    "]);
    prop::collection::vec(token, 0..40).prop_map(|tokens| tokens.join(" "))
}

proptest! {
    // Formatting an already formatted text changes nothing
    #[test]
    fn formatting_is_idempotent(text in source()) {
        let engine = FormatterEngine::new(IndentUnit::spaces(4));
        let once = engine.format_text(&text);
        let twice = engine.format_text(&once);
        prop_assert_eq!(&once, &twice);
        prop_assert!(engine.line_edits(&once).is_empty());
    }

    // Per-line edits and the whole-document edit agree
    #[test]
    fn document_edit_matches_line_edits(text in source()) {
        let engine = FormatterEngine::default();
        let by_lines = apply_edits(&text, &engine.line_edits(&text));
        let by_document = apply_edits(&text, &engine.format_document(&text));
        prop_assert_eq!(by_lines, by_document);
    }

    // One depth per line, and the first line is never indented
    #[test]
    fn depth_per_line(text in source()) {
        let depths = scanner::block_depths(&text);
        prop_assert_eq!(depths.len(), LineIndex::new(&text).line_count());
        prop_assert_eq!(depths[0], 0);
    }

    // Spans tile the text without gaps or overlaps
    #[test]
    fn spans_are_contiguous(text in source()) {
        let spans = scanner::scan(&text).spans;
        let mut cursor = 0;
        for span in &spans {
            prop_assert_eq!(span.start, cursor);
            prop_assert!(span.end > span.start);
            cursor = span.end;
        }
        prop_assert_eq!(cursor, text.len());
    }

    // Every 8-digit literal survives decode then encode
    #[test]
    fn hex_literal_round_trip(bytes in any::<[u8; 4]>()) {
        let literal = format!("#{:02X}{:02X}{:02X}{:02X}", bytes[0], bytes[1], bytes[2], bytes[3]);
        let color = Rgba::from_hex(&literal).unwrap();
        prop_assert_eq!(color.to_hex_with_alpha(), literal);
    }

    // A color written into a document decodes back within one byte step
    #[test]
    fn decoration_round_trip(r in 0.0f32..=1.0, g in 0.0f32..=1.0, b in 0.0f32..=1.0, a in 0.0f32..=1.0) {
        let color = Rgba::new(r, g, b, a);
        let text = format!("let c = \"{}\"\n", color.to_hex());
        let records = colors::decorations(&text);
        prop_assert_eq!(records.len(), 1);

        let decoded = records[0].color;
        let tolerance = 1.0 / 255.0;
        prop_assert!((decoded.red - r).abs() <= tolerance);
        prop_assert!((decoded.green - g).abs() <= tolerance);
        prop_assert!((decoded.blue - b).abs() <= tolerance);
        prop_assert!((decoded.alpha - a).abs() <= tolerance);
    }

    // Excess closers never push depth below zero
    #[test]
    fn excess_closers_clamp_to_zero(closers in 1usize..10) {
        let text = format!("{}code\nnext", "}".repeat(closers));
        prop_assert_eq!(scanner::block_depths(&text), vec![0, 0]);
    }

    // Renaming `x` touches every standalone `x` and nothing else
    #[test]
    fn rename_replaces_whole_words_only(text in program()) {
        let occurrences = find_occurrences(&text, "x");
        prop_assume!(!occurrences.is_empty());

        let doc = DocumentSnapshot { uri: "file:///p.ko".to_string(), text: text.clone(), version: 1 };
        let engine = RenameEngine::new(vec![doc]);
        let result = engine.rename("file:///p.ko", occurrences[0].start, "renamed").unwrap().unwrap();
        let renamed = apply_edits(&text, &result.changes["file:///p.ko"].edits);

        prop_assert!(find_occurrences(&renamed, "x").is_empty());
        prop_assert_eq!(find_occurrences(&renamed, "renamed").len(), occurrences.len());
        prop_assert_eq!(renamed.matches("xyz").count(), text.matches("xyz").count());
    }
}

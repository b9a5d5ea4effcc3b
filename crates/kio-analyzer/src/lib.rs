// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Kio Analyzer - Analysis engines for the kio LSP
//!
//! This crate provides:
//! - Scanner: block structure, string and comment context, color literals
//! - Formatter engine: brace-depth indentation
//! - Color decorations: swatches for `#RRGGBB` / `#RRGGBBAA` literals
//! - Rename engine: whole-word rename across open documents
//! - Hover and go-to-definition over keyword tables and declaration patterns
//! - Extract-to-function refactoring
//! - Workspace view: versioned store of open documents
//! - Interpreter engine: wraps the `kio` binary for run and REPL commands

pub mod colors;
pub mod completion;
pub mod definition;
pub mod formatter;
pub mod hover;
pub mod refactor;
pub mod rename;
pub mod runner;
pub mod scanner;
pub mod text;
pub mod validation;
pub mod workspace;

pub use colors::{DecorationRecord, Rgba};
pub use completion::{CompletionEntry, CompletionKind};
pub use definition::Definition;
pub use formatter::{FormatterEngine, IndentUnit};
pub use hover::HoverInfo;
pub use refactor::Extraction;
pub use rename::{DocumentEdits, RenameEngine, RenameError, WorkspaceEdits};
pub use runner::{InterpreterEngine, ReplOutcome, RunError, RunOutput};
pub use scanner::{Scan, Span, SpanKind};
pub use text::{LineIndex, Position, Range, TextEdit};
pub use workspace::{ContentChange, DocumentSnapshot, WorkspaceView};

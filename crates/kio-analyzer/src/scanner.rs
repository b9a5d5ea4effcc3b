// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Single-pass structural scanner.
//!
//! Splits a document into classified spans (block openers, block closers,
//! color literals, plain text) and records a per-line shape that the
//! indentation engine turns into block depths.
//!
//! # Lexical contexts
//!
//! The scanner follows the kio lexer closely enough to know when a
//! delimiter is real code:
//! - `//` and `#` start a comment that runs to the end of the line
//! - `"..."` strings honor backslash escapes and may span lines
//! - `r"..."` raw strings have no escapes
//! - `'x'` char literals end at the closing quote or the end of the line
//!
//! Delimiters inside strings and comments are plain text. Color literals are
//! recognized everywhere, since they usually live inside strings.

use std::sync::LazyLock;

use regex::Regex;

use crate::colors::Rgba;
use crate::text::{Position, Range};

/// Matches `#RRGGBB` or `#RRGGBBAA` not followed by another ASCII word
/// character. Non-ASCII letters end a literal.
static HEX_COLOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#(?:[0-9A-Fa-f]{8}|[0-9A-Fa-f]{6})(?-u:\b)").expect("hex color pattern is valid")
});

/// Classification of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// `{` or `[` in code.
    OpenBlock,
    /// `}` or `]` in code.
    CloseBlock,
    /// A decodable hex color literal.
    Literal,
    /// Everything else, line terminators included.
    Plain,
}

/// A classified slice of the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub range: Range,
    /// Byte offset of the first byte.
    pub start: usize,
    /// Byte offset one past the last byte.
    pub end: usize,
}

/// Structural summary of one line.
///
/// "Leading" and "trailing" refer to the first and last code-significant
/// character: whitespace and comments are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineShape {
    /// The line begins inside a multi-line string literal.
    pub starts_in_string: bool,
    /// The line holds nothing but whitespace.
    pub is_blank: bool,
    pub leading_closer: bool,
    pub trailing_opener: bool,
    pub trailing_closer: bool,
    /// Openers minus closers on this line, code context only.
    pub balance: i32,
}

/// Result of a scan.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Spans in document order; contiguous and non-overlapping.
    pub spans: Vec<Span>,
    /// One entry per line.
    pub lines: Vec<LineShape>,
}

impl Scan {
    /// Block depth of every line.
    pub fn depths(&self) -> Vec<u32> {
        depths(&self.lines)
    }
}

/// Scan `text` in one pass.
pub fn scan(text: &str) -> Scan {
    Scanner::new(text).run()
}

/// Block depth of every line of `text`.
pub fn block_depths(text: &str) -> Vec<u32> {
    scan(text).depths()
}

/// Turn line shapes into depths with a single running counter.
///
/// A line that starts with a closer sits one level shallower than the
/// running depth, and the counter follows it down. A line that ends with an
/// opener raises the counter for the next line; one that ends with a closer
/// it did not open lowers it. Depth never drops below zero.
pub fn depths(lines: &[LineShape]) -> Vec<u32> {
    let mut depth: u32 = 0;

    lines
        .iter()
        .map(|shape| {
            let current = if shape.leading_closer {
                depth.saturating_sub(1)
            } else {
                depth
            };

            // The leading closer is already accounted for.
            let rest = shape.balance + i32::from(shape.leading_closer);

            depth = if shape.trailing_opener {
                current + 1
            } else if shape.trailing_closer && rest < 0 {
                current.saturating_sub(1)
            } else {
                current
            };

            current
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Code,
    Str { quote: char, raw: bool },
    Comment,
}

/// What the last code-significant character on a line was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Open,
    Close,
    Other,
}

struct Scanner<'a> {
    text: &'a str,
    /// Byte ranges of decodable color literals, ascending.
    literals: Vec<(usize, usize)>,
    next_literal: usize,

    spans: Vec<Span>,
    lines: Vec<LineShape>,

    context: Context,
    /// The previous character was a backslash inside a string.
    escaped: bool,

    line: u32,
    column: u32,
    /// Start of the pending plain run.
    plain: Option<(usize, Position)>,

    shape: LineShape,
    first_mark: Option<Mark>,
    last_mark: Option<Mark>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        // Malformed literals are skipped, not fatal.
        let literals = HEX_COLOR_PATTERN
            .find_iter(text)
            .filter(|m| Rgba::from_hex(m.as_str()).is_some())
            .map(|m| (m.start(), m.end()))
            .collect();

        Self {
            text,
            literals,
            next_literal: 0,
            spans: Vec::new(),
            lines: Vec::new(),
            context: Context::Code,
            escaped: false,
            line: 0,
            column: 0,
            plain: None,
            shape: LineShape::default(),
            first_mark: None,
            last_mark: None,
        }
    }

    fn run(mut self) -> Scan {
        let mut offset = 0;

        while let Some(ch) = self.text[offset..].chars().next() {
            let width = ch.len_utf8();

            if ch == '\n' {
                self.end_line(offset);
                offset += width;
                continue;
            }

            if self.escaped {
                self.escaped = false;
                self.plain_char(offset, true);
                offset += width;
                continue;
            }

            if let Some(end) = self.literal_at(offset) {
                self.emit_literal(offset, end);
                offset = end;
                continue;
            }

            match self.context {
                Context::Code => self.code_char(offset, ch),
                Context::Str { quote, raw } => {
                    if !raw && ch == '\\' {
                        self.escaped = true;
                    } else if ch == quote {
                        self.context = Context::Code;
                        self.mark(Mark::Other);
                    }
                    self.plain_char(offset, true);
                }
                Context::Comment => self.plain_char(offset, !ch.is_whitespace()),
            }

            offset += width;
        }

        self.flush_plain(self.text.len());
        self.finish_line();

        Scan {
            spans: self.spans,
            lines: self.lines,
        }
    }

    /// End offset of a color literal starting exactly at `offset`.
    fn literal_at(&mut self, offset: usize) -> Option<usize> {
        // Literals swallowed by an escape or a previous literal are stale.
        while self
            .literals
            .get(self.next_literal)
            .is_some_and(|&(start, _)| start < offset)
        {
            self.next_literal += 1;
        }

        let &(start, end) = self.literals.get(self.next_literal)?;
        if start != offset {
            return None;
        }
        self.next_literal += 1;
        Some(end)
    }

    fn code_char(&mut self, offset: usize, ch: char) {
        let next = self.text[offset + ch.len_utf8()..].chars().next();

        match ch {
            '{' | '[' => {
                self.structural(offset, SpanKind::OpenBlock);
                self.shape.balance += 1;
                self.mark(Mark::Open);
            }
            '}' | ']' => {
                self.structural(offset, SpanKind::CloseBlock);
                self.shape.balance -= 1;
                self.mark(Mark::Close);
            }
            '"' => {
                let raw = self.raw_prefix_at(offset);
                self.context = Context::Str { quote: '"', raw };
                self.mark(Mark::Other);
                self.plain_char(offset, true);
            }
            '\'' => {
                self.context = Context::Str {
                    quote: '\'',
                    raw: false,
                };
                self.mark(Mark::Other);
                self.plain_char(offset, true);
            }
            '/' if next == Some('/') => {
                self.context = Context::Comment;
                self.plain_char(offset, true);
            }
            '#' => {
                self.context = Context::Comment;
                self.plain_char(offset, true);
            }
            c if c.is_whitespace() => self.plain_char(offset, false),
            _ => {
                self.mark(Mark::Other);
                self.plain_char(offset, true);
            }
        }
    }

    /// True if the quote at `quote_offset` is preceded by a standalone `r`,
    /// not the tail of an identifier such as `bar"`.
    fn raw_prefix_at(&self, quote_offset: usize) -> bool {
        if quote_offset == 0 || self.text.as_bytes()[quote_offset - 1] != b'r' {
            return false;
        }
        let before_r = self.text[..quote_offset - 1].chars().next_back();
        !before_r.is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    fn mark(&mut self, mark: Mark) {
        if self.first_mark.is_none() {
            self.first_mark = Some(mark);
        }
        self.last_mark = Some(mark);
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn plain_char(&mut self, offset: usize, visible: bool) {
        if self.plain.is_none() {
            self.plain = Some((offset, self.position()));
        }
        if visible {
            self.shape.is_blank = false;
        }
        self.column += 1;
    }

    fn flush_plain(&mut self, end: usize) {
        if let Some((start, start_pos)) = self.plain.take() {
            if start < end {
                self.spans.push(Span {
                    kind: SpanKind::Plain,
                    range: Range::new(start_pos, self.position()),
                    start,
                    end,
                });
            }
        }
    }

    fn structural(&mut self, offset: usize, kind: SpanKind) {
        self.flush_plain(offset);
        let start = self.position();
        self.column += 1;
        self.spans.push(Span {
            kind,
            range: Range::new(start, self.position()),
            start: offset,
            end: offset + 1,
        });
        self.shape.is_blank = false;
    }

    fn emit_literal(&mut self, start: usize, end: usize) {
        self.flush_plain(start);
        let start_pos = self.position();
        // Literals are ASCII: one byte per character.
        self.column += (end - start) as u32;
        self.spans.push(Span {
            kind: SpanKind::Literal,
            range: Range::new(start_pos, self.position()),
            start,
            end,
        });
        self.shape.is_blank = false;

        // In code, the `#` opens a comment.
        if self.context == Context::Code {
            self.context = Context::Comment;
        }
    }

    /// Close the current line at the `\n` found at `offset`.
    fn end_line(&mut self, offset: usize) {
        if self.plain.is_none() {
            self.plain = Some((offset, self.position()));
        }
        self.line += 1;
        self.column = 0;
        self.flush_plain(offset + 1);

        self.escaped = false;
        self.finish_line();

        // Only double-quoted strings continue past a line break.
        match self.context {
            Context::Str { quote: '"', .. } => {}
            _ => self.context = Context::Code,
        }

        self.shape = LineShape {
            starts_in_string: matches!(self.context, Context::Str { .. }),
            ..LineShape::default()
        };
        if self.shape.starts_in_string {
            self.first_mark = Some(Mark::Other);
        }
    }

    fn finish_line(&mut self) {
        let mut shape = self.shape;
        shape.leading_closer = self.first_mark == Some(Mark::Close);
        shape.trailing_opener = self.last_mark == Some(Mark::Open);
        shape.trailing_closer = self.last_mark == Some(Mark::Close);
        self.lines.push(shape);

        self.first_mark = None;
        self.last_mark = None;
    }
}

impl Default for LineShape {
    fn default() -> Self {
        Self {
            starts_in_string: false,
            is_blank: true,
            leading_closer: false,
            trailing_opener: false,
            trailing_closer: false,
            balance: 0,
        }
    }
}

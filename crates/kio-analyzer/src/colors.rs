// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Color swatches for hex color literals.
//!
//! # How it works
//!
//! 1. The scanner marks every `#RRGGBB` / `#RRGGBBAA` token as a literal span
//! 2. Each literal is decoded into normalized RGBA channels
//! 3. The editor renders a swatch at the literal's range
//!
//! Decorations are presentational only. They are recomputed from scratch
//! for every document version and never turn into edits.

use crate::scanner::{self, SpanKind};
use crate::text::Range;

/// A color with every channel normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Rgba {
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Decode `#RRGGBB` (opaque) or `#RRGGBBAA`.
    ///
    /// Returns `None` for anything else, including a missing `#`.
    pub fn from_hex(literal: &str) -> Option<Self> {
        let digits = literal.strip_prefix('#')?;
        if !matches!(digits.len(), 6 | 8) || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |idx: usize| -> Option<f32> {
            let byte = u8::from_str_radix(digits.get(idx..idx + 2)?, 16).ok()?;
            Some(f32::from(byte) / 255.0)
        };

        let alpha = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }

    /// Encode as `#RRGGBB` when fully opaque, `#RRGGBBAA` otherwise.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_bytes();
        if a == u8::MAX {
            format!("#{:02X}{:02X}{:02X}", r, g, b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
        }
    }

    /// Encode as `#RRGGBBAA` regardless of alpha.
    pub fn to_hex_with_alpha(&self) -> String {
        let [r, g, b, a] = self.to_bytes();
        format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
    }

    fn to_bytes(self) -> [u8; 4] {
        let byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            byte(self.red),
            byte(self.green),
            byte(self.blue),
            byte(self.alpha),
        ]
    }
}

/// A swatch to draw over a color literal.
#[derive(Debug, Clone, PartialEq)]
pub struct DecorationRecord {
    /// Range of the literal, `#` included.
    pub range: Range,
    pub color: Rgba,
}

/// Compute a decoration for every color literal in `text`.
///
/// Ranges never overlap because literal spans never overlap.
pub fn decorations(text: &str) -> Vec<DecorationRecord> {
    scanner::scan(text)
        .spans
        .into_iter()
        .filter(|span| span.kind == SpanKind::Literal)
        .filter_map(|span| {
            let color = Rgba::from_hex(&text[span.start..span.end])?;
            Some(DecorationRecord {
                range: span.range,
                color,
            })
        })
        .collect()
}

/// Textual forms offered when the user picks a new color for a literal.
pub fn presentations(color: &Rgba) -> Vec<String> {
    let mut labels = vec![color.to_hex()];
    let with_alpha = color.to_hex_with_alpha();
    if !labels.contains(&with_alpha) {
        labels.push(with_alpha);
    }
    labels
}

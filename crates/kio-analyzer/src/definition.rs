// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Go to definition by declaration pattern.
//!
//! # How it works
//!
//! 1. Take the identifier under the cursor
//! 2. Search for the first line that declares it: `fn name(`,
//!    `function name(`, `let name =`, `const name =`, or a type header such
//!    as `struct name`
//! 3. The cursor's own document is searched first, then every other open
//!    document in URI order
//!
//! Matches inside strings and comments are not filtered out; this is a text
//! search, not name resolution.

use regex::Regex;

use crate::rename::identifier_at;
use crate::text::{LineIndex, Position, Range};
use crate::validation;
use crate::workspace::DocumentSnapshot;

/// Where a name is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub uri: String,
    /// Range of the declared name.
    pub range: Range,
}

/// Find the declaration of the identifier at `position` in `uri`.
///
/// Keywords and built-in types have no declaration.
pub fn definition(
    documents: &[DocumentSnapshot],
    uri: &str,
    position: Position,
) -> Option<Definition> {
    let anchor = documents.iter().find(|doc| doc.uri == uri)?;
    let (name, _) = identifier_at(&anchor.text, position)?;
    if validation::is_keyword(&name) || validation::is_builtin_type(&name) {
        return None;
    }

    let pattern = declaration_pattern(&name)?;
    let others = documents.iter().filter(|doc| doc.uri != uri);

    std::iter::once(anchor).chain(others).find_map(|doc| {
        let range = find_with(&pattern, &doc.text)?;
        tracing::debug!("Definition of '{}' in {}", name, doc.uri);
        Some(Definition {
            uri: doc.uri.clone(),
            range,
        })
    })
}

/// Range of the first declaration of `name` in `text`.
pub fn find_declaration(text: &str, name: &str) -> Option<Range> {
    find_with(&declaration_pattern(name)?, text)
}

fn declaration_pattern(name: &str) -> Option<Regex> {
    let name = regex::escape(name);
    let pattern = format!(
        r"(?m)(?:^|[^\w])(?:(?:fn|function)[ \t]+(?P<func>{name})[ \t]*\(|(?:let|const|var)[ \t]+(?:mut[ \t]+)?(?P<var>{name})[ \t]*[=:]|(?:struct|class|enum|interface|trait|module)[ \t]+(?P<ty>{name})\b)"
    );

    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!("Declaration pattern for '{}' failed: {}", name, e);
            None
        }
    }
}

fn find_with(pattern: &Regex, text: &str) -> Option<Range> {
    let captures = pattern.captures(text)?;
    let name = captures
        .name("func")
        .or_else(|| captures.name("var"))
        .or_else(|| captures.name("ty"))?;

    let index = LineIndex::new(text);
    Some(Range::new(
        index.position_of(name.start()),
        index.position_of(name.end()),
    ))
}

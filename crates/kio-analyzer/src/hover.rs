// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Hover documentation for keywords, built-in functions and types.
//!
//! User identifiers get no hover: there is no symbol table to describe them.

use crate::rename::identifier_at;
use crate::text::{Position, Range};
use crate::validation;

const BUILTIN_DOCS: &[(&str, &str)] = &[
    ("print", "**print**(value: any) -> void\n\nPrints a value to stdout without a newline."),
    ("println", "**println**(value: any) -> void\n\nPrints a value to stdout followed by a newline."),
    ("len", "**len**(collection: array|string|map) -> int\n\nReturns the length of a collection."),
    ("push", "**push**(array: array, value: any) -> void\n\nAdds an element to the end of an array."),
    ("pop", "**pop**(array: array) -> any\n\nRemoves and returns the last element of an array."),
    ("map", "**map**(array: array, fn: function) -> array\n\nApplies a function to each element and returns a new array."),
    ("filter", "**filter**(array: array, fn: function) -> array\n\nKeeps the elements for which the predicate returns true."),
    ("reduce", "**reduce**(array: array, fn: function, initial: any) -> any\n\nFolds an array into a single value."),
    ("range", "**range**(start: int, end: int, step?: int) -> array\n\nGenerates a range of numbers."),
    ("type", "**type**(value: any) -> string\n\nReturns the type of a value as a string."),
    ("str", "**str**(value: any) -> string\n\nConverts a value to a string."),
    ("int", "**int**(value: any) -> int\n\nConverts a value to an integer."),
    ("float", "**float**(value: any) -> float\n\nConverts a value to a floating-point number."),
    ("bool", "**bool**(value: any) -> bool\n\nConverts a value to a boolean."),
];

const KEYWORD_DOCS: &[(&str, &str)] = &[
    ("let", "**let** - Variable declaration\n\nDeclares a variable.\n\nExample: `let x = 42`"),
    ("const", "**const** - Constant declaration\n\nDeclares an immutable constant.\n\nExample: `const PI = 3.14159`"),
    ("if", "**if** - Conditional statement\n\nRuns a block when the condition holds.\n\nExample: `if x > 0 { ... }`"),
    ("else", "**else** - Alternative branch\n\nRuns when the `if` condition is false.\n\nExample: `if x > 0 { ... } else { ... }`"),
    ("while", "**while** - Loop statement\n\nRepeats a block while the condition holds.\n\nExample: `while x < 10 { ... }`"),
    ("for", "**for** - Iteration statement\n\nIterates over a collection or range.\n\nExample: `for item in items { ... }`"),
    ("fn", "**fn** - Function declaration\n\nDefines a reusable function.\n\nExample: `fn add(a, b) { return a + b }`"),
    ("return", "**return** - Return statement\n\nReturns a value from a function.\n\nExample: `return result`"),
    ("import", "**import** - Module import\n\nImports functionality from a module.\n\nExample: `import math`"),
    ("export", "**export** - Module export\n\nExports functionality from a module.\n\nExample: `export fn helper() { ... }`"),
];

/// Documentation for the word under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    /// Markdown.
    pub contents: String,
    /// Range of the hovered word.
    pub range: Range,
}

/// Hover for the word at `position`, if it is a known keyword, built-in
/// function or type.
pub fn hover(text: &str, position: Position) -> Option<HoverInfo> {
    let (word, range) = identifier_at(text, position)?;
    let contents = documentation(&word)?;
    Some(HoverInfo { contents, range })
}

/// Markdown documentation for a keyword, built-in function or type.
pub fn documentation(word: &str) -> Option<String> {
    let documented = BUILTIN_DOCS
        .iter()
        .chain(KEYWORD_DOCS)
        .find(|(name, _)| *name == word);
    if let Some((_, doc)) = documented {
        return Some(doc.to_string());
    }

    if validation::is_builtin_function(word) {
        Some(format!("**{word}**(...)\n\nkio built-in function."))
    } else if validation::is_keyword(word) {
        Some(format!("**{word}**\n\nkio keyword."))
    } else if validation::is_builtin_type(word) {
        Some(format!("**{word}**\n\nkio built-in type."))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hover_builtin_function() {
        let info = hover("println(total)", Position::new(0, 3)).unwrap();
        assert!(info.contents.starts_with("**println**(value: any)"));
        assert_eq!(info.range, Range::new(Position::new(0, 0), Position::new(0, 7)));
    }

    #[test]
    fn test_hover_keyword() {
        let info = hover("    let x = 1", Position::new(0, 5)).unwrap();
        assert!(info.contents.contains("Variable declaration"));
        assert_eq!(info.range.start, Position::new(0, 4));
    }

    #[test]
    fn test_hover_falls_back_to_tables() {
        assert_eq!(documentation("sqrt").as_deref(), Some("**sqrt**(...)\n\nkio built-in function."));
        assert_eq!(documentation("elif").as_deref(), Some("**elif**\n\nkio keyword."));
        assert_eq!(documentation("u8").as_deref(), Some("**u8**\n\nkio built-in type."));
    }

    #[test]
    fn test_hover_user_identifier_is_none() {
        assert!(hover("let total = 0", Position::new(0, 6)).is_none());
        assert!(hover("a + b", Position::new(0, 2)).is_none());
    }
}

// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Static completion items: keywords, builtins, types and code snippets.
//!
//! Completion is not context-aware. Every request gets the same list and
//! the editor filters it against the word being typed.

use std::sync::LazyLock;

use crate::validation::{BUILTIN_FUNCTIONS, BUILTIN_TYPES, KEYWORDS};

/// Characters that should trigger a completion request.
pub const TRIGGER_CHARACTERS: &[&str] = &[".", "(", " "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Keyword,
    Function,
    Type,
    Snippet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEntry {
    pub label: String,
    pub kind: CompletionKind,
    pub detail: String,
    pub insert_text: Option<String>,
    /// Whether `insert_text` uses `$1`/`${1:name}` placeholders.
    pub is_snippet: bool,
}

// (label, detail, body)
const SNIPPETS: &[(&str, &str, &str)] = &[
    ("fn", "Function definition", "fn ${1:function_name}(${2:args}) {\n\t$0\n}"),
    ("fn-arrow", "Arrow function", "fn ${1:args} => ${2:expression}"),
    ("async-fn", "Async function", "async fn ${1:function_name}(${2:args}) {\n\t$0\n}"),
    ("for", "For loop", "for ${1:i} in ${2:range(10)} {\n\t$0\n}"),
    (
        "for-i",
        "For loop with index",
        "for ${1:i}, ${2:item} in enumerate(${3:collection}) {\n\t$0\n}",
    ),
    ("while", "While loop", "while ${1:condition} {\n\t$0\n}"),
    ("if", "If statement", "if ${1:condition} {\n\t$0\n}"),
    ("if-else", "If-else statement", "if ${1:condition} {\n\t$2\n} else {\n\t$0\n}"),
    (
        "if-elif",
        "If-elif-else statement",
        "if ${1:condition1} {\n\t$2\n} elif ${3:condition2} {\n\t$4\n} else {\n\t$0\n}",
    ),
    (
        "match",
        "Match expression",
        "match ${1:expr} {\n\t${2:pattern} => ${3:value},\n\t_ => ${4:default},\n}",
    ),
    (
        "class",
        "Class definition",
        "class ${1:ClassName} {\n\tfn __init__(self${2:, args}) {\n\t\t$0\n\t}\n}",
    ),
    (
        "struct",
        "Struct definition",
        "struct ${1:StructName} {\n\t${2:field1}: ${3:type1},\n\t${4:field2}: ${5:type2},\n}",
    ),
    (
        "enum",
        "Enum definition",
        "enum ${1:EnumName} {\n\t${2:Variant1},\n\t${3:Variant2}(${4:data}),\n}",
    ),
    (
        "interface",
        "Interface definition",
        "interface ${1:InterfaceName} {\n\tfn ${2:method}(${3:self});\n}",
    ),
    ("impl", "Impl block", "impl ${1:TypeName} {\n\t$0\n}"),
    ("module", "Module definition", "module ${1:module_name} {\n\t$0\n}"),
    ("import", "Import statement", "import ${1:module_name}"),
    ("import-as", "Import with alias", "import ${1:module_name} as ${2:alias}"),
    ("try-catch", "Try-catch block", "try {\n\t$1\n} catch ${2:error} {\n\t$0\n}"),
    (
        "try-catch-finally",
        "Try-catch-finally block",
        "try {\n\t$1\n} catch ${2:error} {\n\t$3\n} finally {\n\t$0\n}",
    ),
    ("test", "Test function", "#[test]\nfn ${1:test_name}() {\n\t$0\n}"),
    ("main", "Main function", "fn main() {\n\t$0\n}"),
    ("println", "Println statement", "println(\"${1:message}\")"),
    ("closure", "Closure/lambda", "fn(${1:args}) ${2:=>} ${3:body}"),
    ("vec", "Vector/array", "[${1:items}]"),
    ("vec-for", "Vector comprehension", "[${1:x} for ${2:x} in ${3:collection}]"),
    ("map", "Hash map", "{${1:\"key\"}: ${2:value}}"),
];

static ITEMS: LazyLock<Vec<CompletionEntry>> = LazyLock::new(build_items);

/// Every completion item, in a fixed order: keywords, builtin functions,
/// types, then snippets.
pub fn completion_items() -> &'static [CompletionEntry] {
    &ITEMS
}

fn build_items() -> Vec<CompletionEntry> {
    let keywords = KEYWORDS.iter().map(|keyword| CompletionEntry {
        label: keyword.to_string(),
        kind: CompletionKind::Keyword,
        detail: format!("kio keyword: {keyword}"),
        insert_text: None,
        is_snippet: false,
    });

    let functions = BUILTIN_FUNCTIONS.iter().map(|func| CompletionEntry {
        label: func.to_string(),
        kind: CompletionKind::Function,
        detail: format!("kio built-in function: {func}()"),
        insert_text: Some(format!("{func}($0)")),
        is_snippet: true,
    });

    let types = BUILTIN_TYPES.iter().map(|ty| CompletionEntry {
        label: ty.to_string(),
        kind: CompletionKind::Type,
        detail: format!("kio type: {ty}"),
        insert_text: None,
        is_snippet: false,
    });

    let snippets = SNIPPETS.iter().map(|(label, detail, body)| CompletionEntry {
        label: label.to_string(),
        kind: CompletionKind::Snippet,
        detail: detail.to_string(),
        insert_text: Some(body.to_string()),
        is_snippet: true,
    });

    keywords.chain(functions).chain(types).chain(snippets).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(label: &str, kind: CompletionKind) -> Option<&'static CompletionEntry> {
        completion_items()
            .iter()
            .find(|item| item.label == label && item.kind == kind)
    }

    #[test]
    fn test_items_cover_every_table() {
        let items = completion_items();
        let count = |kind| items.iter().filter(|item| item.kind == kind).count();
        assert_eq!(count(CompletionKind::Keyword), KEYWORDS.len());
        assert_eq!(count(CompletionKind::Function), BUILTIN_FUNCTIONS.len());
        assert_eq!(count(CompletionKind::Type), BUILTIN_TYPES.len());
        assert_eq!(count(CompletionKind::Snippet), SNIPPETS.len());
    }

    #[test]
    fn test_functions_insert_call_snippet() {
        let item = find("println", CompletionKind::Function).unwrap();
        assert_eq!(item.insert_text.as_deref(), Some("println($0)"));
        assert!(item.is_snippet);
    }

    #[test]
    fn test_keywords_insert_label() {
        let item = find("while", CompletionKind::Keyword).unwrap();
        assert!(item.insert_text.is_none());
        assert!(!item.is_snippet);
    }

    #[test]
    fn test_snippet_bodies_balance_braces() {
        for (label, _, body) in SNIPPETS {
            let opens = body.matches('{').count() - body.matches("${").count();
            let closes = body.matches('}').count() - body.matches("${").count();
            assert_eq!(opens, closes, "unbalanced snippet {label}");
        }
    }
}

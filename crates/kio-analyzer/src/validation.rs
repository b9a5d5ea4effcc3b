// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Validation utilities for kio identifiers, keywords, and types.

/// Reserved words of the kio language.
pub const KEYWORDS: &[&str] = &[
    // Control flow
    "if", "elif", "else", "then", "end", "for", "while", "do", "break", "continue", "return",
    "match", "case", "switch",
    // Modules
    "import", "export", "module", "as", "from", "use",
    // Functions
    "fn", "async", "await", "yield", "throw", "try",
    // Types
    "class", "struct", "enum", "interface", "trait", "impl", "pub", "priv", "static", "const",
    "let", "var", "mut", "type", "extends", "implements", "super",
    // Exceptions
    "catch", "panic", "assert", "finally",
    // Operators
    "in", "is", "not", "and", "or", "where", "of",
    // Values
    "true", "false", "nil", "self", "this", "new", "delete",
    // Other
    "sizeof", "typeof", "unsafe", "extern",
];

/// Primitive and storage types.
pub const BUILTIN_TYPES: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "u8", "u16", "u32", "u64", "u128", "f32", "f64", "bool",
    "char", "str", "string", "int", "float", "void", "any", "type", "Type", "Any", "usize",
    "isize",
];

/// Functions provided by the kio runtime.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    // I/O
    "print", "println", "input", "format",
    // Conversion
    "to_string", "to_int", "to_float", "to_bool", "to_array",
    // Collections
    "len", "range", "map", "filter", "reduce", "zip", "enumerate", "join", "split", "trim",
    "upper", "lower", "replace", "contains", "startswith", "endswith", "index_of", "char_at",
    "substring", "to_upper", "to_lower", "reverse", "sort", "unique", "flatten", "flat_map",
    "for_each", "any", "all", "none", "sum", "avg", "product", "count", "first", "last", "take",
    "drop", "skip", "take_while", "drop_while", "partition", "group_by",
    // Iterators
    "into_iter", "iter", "iter_mut", "collect",
    // Math
    "abs", "min", "max", "pow", "sqrt", "floor", "ceil", "round", "sin", "cos", "tan", "asin",
    "acos", "atan", "atan2", "log", "log10", "exp", "sign",
    // Random
    "rand", "rand_int", "rand_float", "rand_bool", "seed",
    // Time
    "time", "sleep", "timestamp", "datetime", "format_time",
    // System
    "exit", "debug", "trace", "env", "args",
    // Files
    "open", "read", "read_line", "write", "write_line", "close", "exists", "mkdir", "remove",
    "rename", "copy",
    // HTTP
    "http_get", "http_post", "http_put", "http_delete", "http_request",
    // JSON
    "json_parse", "json_stringify", "json_to_map", "json_to_array",
    // Crypto
    "sha256", "sha512", "md5", "aes_encrypt", "aes_decrypt", "base64_encode", "base64_decode",
    "hash",
    // Database
    "db_connect", "db_query", "db_execute", "db_close",
    // Network
    "tcp_connect", "tcp_listen", "udp_send", "udp_receive",
    // Memory
    "clone", "ref", "move", "size_of", "align_of",
    // Strings
    "to_str", "from_str",
    // Options and results
    "some", "is_some", "is_none", "unwrap", "unwrap_or", "map_or", "ok", "err", "is_ok",
    "is_err",
    // Vectors
    "vec", "vector", "with_capacity", "push", "pop", "insert", "remove_at",
];

/// Check if a name is a kio keyword.
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Check if a name is a built-in type.
pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

/// Check if a name is a runtime-provided function.
pub fn is_builtin_function(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name)
}

/// Check if a character can appear inside an identifier.
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Check if a name is a valid kio identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    // First char must be letter or underscore
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    // Rest must be alphanumeric or underscore
    chars.all(is_identifier_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_keyword() {
        assert!(is_keyword("fn"));
        assert!(is_keyword("struct"));
        assert!(is_keyword("elif"));
        assert!(is_keyword("match"));
        assert!(is_keyword("nil"));
        assert!(is_keyword("let"));
    }

    #[test]
    fn test_is_keyword_negative() {
        assert!(!is_keyword("foo"));
        assert!(!is_keyword("println"));
        assert!(!is_keyword("i32"));
        assert!(!is_keyword(""));
    }

    #[test]
    fn test_is_builtin_type() {
        assert!(is_builtin_type("i64"));
        assert!(is_builtin_type("string"));
        assert!(is_builtin_type("Any"));
        assert!(!is_builtin_type("MyStruct"));
        assert!(!is_builtin_type("I64"));
    }

    #[test]
    fn test_is_builtin_function() {
        assert!(is_builtin_function("println"));
        assert!(is_builtin_function("json_parse"));
        assert!(!is_builtin_function("my_helper"));
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("foo"));
        assert!(is_valid_identifier("_bar"));
        assert!(is_valid_identifier("a1"));
        assert!(is_valid_identifier("_"));
        assert!(is_valid_identifier("snake_case"));
        assert!(is_valid_identifier("déjà"));
    }

    #[test]
    fn test_is_valid_identifier_invalid() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("123"));
        assert!(!is_valid_identifier("123abc"));
        assert!(!is_valid_identifier("-foo"));
        assert!(!is_valid_identifier("foo-bar"));
        assert!(!is_valid_identifier("foo bar"));
    }
}

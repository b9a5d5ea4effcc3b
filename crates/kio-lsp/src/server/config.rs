// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Client settings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Settings sent by the editor in `initializationOptions` and
/// `workspace/didChangeConfiguration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Explicit path to the `kio` interpreter.
    pub interpreter_path: Option<String>,

    /// Allow `kio.runInRepl`.
    pub enable_repl: bool,

    /// Reindent while typing `}`, `]` or a newline.
    pub format_on_type: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            interpreter_path: None,
            enable_repl: true,
            format_on_type: true,
        }
    }
}

impl ServerConfig {
    /// Parse settings, either bare or nested under a `kio` key.
    ///
    /// Returns `None` when there is nothing to read or the settings are
    /// malformed; the caller keeps its current configuration.
    pub fn from_value(value: &Value) -> Option<Self> {
        let settings = value.get("kio").unwrap_or(value);
        if settings.is_null() {
            return None;
        }

        match serde_json::from_value(settings.clone()) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring malformed settings: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert!(config.enable_repl);
        assert!(config.format_on_type);
        assert!(config.interpreter_path.is_none());
    }

    #[test]
    fn test_from_value_camel_case() {
        let config = ServerConfig::from_value(&json!({
            "interpreterPath": "/opt/kio/bin/kio",
            "enableRepl": false
        }))
        .unwrap();
        assert_eq!(config.interpreter_path.as_deref(), Some("/opt/kio/bin/kio"));
        assert!(!config.enable_repl);
        assert!(config.format_on_type);
    }

    #[test]
    fn test_from_value_nested_section() {
        let config = ServerConfig::from_value(&json!({ "kio": { "formatOnType": false } })).unwrap();
        assert!(!config.format_on_type);
        assert!(config.enable_repl);
    }

    #[test]
    fn test_from_value_rejects_garbage() {
        assert!(ServerConfig::from_value(&Value::Null).is_none());
        assert!(ServerConfig::from_value(&json!({ "enableRepl": "yes" })).is_none());
    }
}

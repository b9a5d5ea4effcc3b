// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! `workspace/executeCommand` commands.

use std::path::PathBuf;

use kio_analyzer::runner::{ReplOutcome, RunOutput};
use serde::Serialize;
use serde_json::Value;
use url::Url;

pub const RUN_FILE: &str = "kio.runFile";
pub const RUN_IN_REPL: &str = "kio.runInRepl";
pub const SHOW_VERSION: &str = "kio.showVersion";

/// Every command the server advertises.
pub const ALL: &[&str] = &[RUN_FILE, RUN_IN_REPL, SHOW_VERSION];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a document. The argument is its URI.
    RunFile { uri: String },
    /// Evaluate a snippet in the REPL.
    RunInRepl { code: String },
    ShowVersion,
}

impl Command {
    pub fn parse(name: &str, arguments: &[Value]) -> Result<Self, String> {
        let first_string = || {
            arguments
                .first()
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| format!("{} expects a string argument", name))
        };

        match name {
            RUN_FILE => Ok(Self::RunFile { uri: first_string()? }),
            RUN_IN_REPL => Ok(Self::RunInRepl { code: first_string()? }),
            SHOW_VERSION => Ok(Self::ShowVersion),
            _ => Err(format!("Unknown command: {}", name)),
        }
    }
}

/// The JSON result returned to the editor for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl From<&RunOutput> for RunReport {
    fn from(output: &RunOutput) -> Self {
        Self {
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
            exit_code: output.exit_code,
        }
    }
}

/// Text to append to the editor's output for a REPL outcome.
pub fn repl_transcript(input: &str, outcome: &ReplOutcome) -> String {
    match outcome {
        ReplOutcome::Help(help) => help.to_string(),
        ReplOutcome::Clear | ReplOutcome::Exit => String::new(),
        ReplOutcome::Evaluated(output) => {
            let mut transcript = format!("> {}\n{}", input.trim_end(), output.stdout);
            if !output.stderr.is_empty() {
                transcript.push_str(&output.stderr);
            }
            transcript
        }
    }
}

/// Filesystem path of a `file://` URI, percent-decoded.
///
/// `None` for other schemes (`untitled:` buffers) and unparsable URIs.
pub fn file_path(uri: &str) -> Option<PathBuf> {
    let url = Url::parse(uri).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse(RUN_FILE, &[json!("file:///tmp/main.ko")]),
            Ok(Command::RunFile {
                uri: "file:///tmp/main.ko".to_string()
            })
        );
        assert_eq!(
            Command::parse(RUN_IN_REPL, &[json!("1 + 1")]),
            Ok(Command::RunInRepl {
                code: "1 + 1".to_string()
            })
        );
        assert_eq!(Command::parse(SHOW_VERSION, &[]), Ok(Command::ShowVersion));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse(RUN_FILE, &[]).is_err());
        assert!(Command::parse(RUN_IN_REPL, &[json!(42)]).is_err());
        assert!(Command::parse("kio.unknown", &[]).is_err());
    }

    #[test]
    fn test_run_report_camel_case() {
        let output = RunOutput {
            stdout: "2\n".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        };
        let value = serde_json::to_value(RunReport::from(&output)).unwrap();
        assert_eq!(value, json!({ "stdout": "2\n", "stderr": "", "exitCode": 0 }));
    }

    #[test]
    fn test_repl_transcript() {
        let output = RunOutput {
            stdout: "2\n".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        };
        assert_eq!(
            repl_transcript("1 + 1\n", &ReplOutcome::Evaluated(output)),
            "> 1 + 1\n2\n"
        );
        assert_eq!(repl_transcript(":clear", &ReplOutcome::Clear), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_path() {
        assert_eq!(file_path("file:///tmp/a.ko"), Some(PathBuf::from("/tmp/a.ko")));
        assert_eq!(
            file_path("file:///tmp/my%20file.ko"),
            Some(PathBuf::from("/tmp/my file.ko"))
        );
        assert_eq!(
            file_path("file:///home/user/caf%C3%A9/main.ko"),
            Some(PathBuf::from("/home/user/café/main.ko"))
        );
    }

    #[test]
    fn test_file_path_other_schemes() {
        assert_eq!(file_path("untitled:Untitled-1"), None);
        assert_eq!(file_path("not a uri"), None);
    }
}

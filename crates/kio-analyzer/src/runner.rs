// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! Interpreter engine that wraps the `kio` binary.
//!
//! # How it works
//!
//! 1. We locate the `kio` interpreter once, at startup
//! 2. Files are run with `kio run <file>`
//! 3. Unsaved buffers are written to a temp file first
//! 4. REPL input is piped to `kio repl` on stdin
//!
//! Nothing here knows what a kio program means. Output is captured and
//! handed back verbatim.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Text shown for the `:help` REPL command.
pub const REPL_HELP: &str = "Available commands:\n  :help   - Show this help message\n  :clear  - Clear REPL output\n  :exit   - Close REPL\n";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("kio interpreter not found")]
    NotFound,

    #[error("Failed to create temp file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to run interpreter: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to write interpreter input: {0}")]
    Stdin(#[source] std::io::Error),
}

/// Captured output of one interpreter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// What a line of REPL input turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplOutcome {
    Help(&'static str),
    Clear,
    Exit,
    Evaluated(RunOutput),
}

/// The interpreter engine.
#[derive(Debug, Clone)]
pub struct InterpreterEngine {
    interpreter_path: Option<PathBuf>,
}

impl InterpreterEngine {
    /// Create a new engine, auto-detecting the interpreter location.
    pub fn new() -> Self {
        Self {
            interpreter_path: Self::find_interpreter(None),
        }
    }

    /// Use `configured` if it exists, otherwise fall back to auto-detection.
    pub fn with_configured(configured: Option<&str>) -> Self {
        Self {
            interpreter_path: Self::find_interpreter(configured),
        }
    }

    /// Use exactly this binary.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            interpreter_path: Some(path.into()),
        }
    }

    /// Try to find the kio binary.
    ///
    /// Search order:
    /// 1. KIO_INTERPRETER environment variable
    /// 2. The configured path
    /// 3. ~/.kio/bin/kio
    /// 4. kio in PATH
    fn find_interpreter(configured: Option<&str>) -> Option<PathBuf> {
        let env_path = std::env::var("KIO_INTERPRETER").ok();
        for candidate in env_path.iter().map(String::as_str).chain(configured) {
            let path = Path::new(candidate);
            if !candidate.is_empty() && path.exists() {
                tracing::info!("Found interpreter at: {}", candidate);
                return Some(path.to_path_buf());
            }
        }

        if let Ok(home) = std::env::var("HOME") {
            let path = Path::new(&home).join(".kio").join("bin").join("kio");
            if path.exists() {
                tracing::info!("Found interpreter at: {}", path.display());
                return Some(path);
            }
        }

        if let Ok(output) = std::process::Command::new("which").arg("kio").output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                tracing::info!("Found interpreter in PATH: {}", path);
                return Some(PathBuf::from(path));
            }
        }

        tracing::warn!("Could not find kio interpreter");
        None
    }

    pub fn is_available(&self) -> bool {
        self.interpreter_path.is_some()
    }

    pub fn interpreter_path(&self) -> Option<&Path> {
        self.interpreter_path.as_deref()
    }

    /// Run `kio run <path>`.
    pub async fn run_file(&self, path: &Path) -> Result<RunOutput, RunError> {
        let interpreter = self.interpreter()?;
        tracing::debug!("Running: {} run {}", interpreter.display(), path.display());

        let output = tokio::process::Command::new(interpreter)
            .arg("run")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(RunError::Spawn)?;

        Ok(collect(output))
    }

    /// Run unsaved buffer text by writing it to a temp file first.
    pub async fn run_source(&self, source: &str) -> Result<RunOutput, RunError> {
        self.interpreter()?;

        let temp_dir = tempfile::tempdir().map_err(RunError::TempFile)?;
        let temp_file = temp_dir.path().join("main.ko");
        tokio::fs::write(&temp_file, source)
            .await
            .map_err(RunError::TempFile)?;

        // temp_dir lives until the run finishes
        self.run_file(&temp_file).await
    }

    /// Handle one line of REPL input.
    ///
    /// `:help`, `:clear` and `:exit` are answered without the interpreter;
    /// anything else is piped to `kio repl`.
    pub async fn eval_repl(&self, input: &str) -> Result<ReplOutcome, RunError> {
        match input.trim() {
            ":help" => return Ok(ReplOutcome::Help(REPL_HELP)),
            ":clear" => return Ok(ReplOutcome::Clear),
            ":exit" => return Ok(ReplOutcome::Exit),
            _ => {}
        }

        let interpreter = self.interpreter()?;
        tracing::debug!("Evaluating {} bytes in {} repl", input.len(), interpreter.display());

        let mut child = tokio::process::Command::new(interpreter)
            .arg("repl")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RunError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut payload = input.to_string();
            if !payload.ends_with('\n') {
                payload.push('\n');
            }
            match stdin.write_all(payload.as_bytes()).await {
                Ok(()) => {}
                // The interpreter may exit without reading its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(RunError::Stdin(e)),
            }
            // Dropping stdin closes the pipe so the repl sees EOF.
        }

        let output = child.wait_with_output().await.map_err(RunError::Spawn)?;
        Ok(ReplOutcome::Evaluated(collect(output)))
    }

    fn interpreter(&self) -> Result<&Path, RunError> {
        self.interpreter_path.as_deref().ok_or(RunError::NotFound)
    }
}

impl Default for InterpreterEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn collect(output: std::process::Output) -> RunOutput {
    let result = RunOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code(),
    };
    if !result.success() {
        tracing::warn!("Interpreter exited with {:?}", result.exit_code);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing() -> InterpreterEngine {
        InterpreterEngine {
            interpreter_path: None,
        }
    }

    #[test]
    fn test_interpreter_detection() {
        let engine = InterpreterEngine::new();
        // Just check that it doesn't panic
        let _ = engine.is_available();
    }

    #[tokio::test]
    async fn test_missing_interpreter_errors() {
        let engine = missing();
        assert!(!engine.is_available());
        assert!(matches!(
            engine.run_file(Path::new("main.ko")).await,
            Err(RunError::NotFound)
        ));
        assert!(matches!(
            engine.run_source("print(1)").await,
            Err(RunError::NotFound)
        ));
        assert!(matches!(
            engine.eval_repl("1 + 1").await,
            Err(RunError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_repl_commands_answered_locally() {
        let engine = missing();
        assert_eq!(
            engine.eval_repl(":help").await.unwrap(),
            ReplOutcome::Help(REPL_HELP)
        );
        assert_eq!(engine.eval_repl(" :clear ").await.unwrap(), ReplOutcome::Clear);
        assert_eq!(engine.eval_repl(":exit").await.unwrap(), ReplOutcome::Exit);
    }

    #[tokio::test]
    async fn test_spawn_failure_reported() {
        let engine = InterpreterEngine::with_path("/nonexistent/bin/kio");
        assert!(matches!(
            engine.run_file(Path::new("main.ko")).await,
            Err(RunError::Spawn(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_file_passes_run_subcommand() {
        let engine = InterpreterEngine::with_path("/bin/echo");
        let output = engine.run_file(Path::new("/tmp/main.ko")).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "run /tmp/main.ko\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_source_uses_temp_file() {
        let engine = InterpreterEngine::with_path("/bin/echo");
        let output = engine.run_source("print(1)").await.unwrap();
        assert!(output.stdout.starts_with("run "));
        assert!(output.stdout.trim_end().ends_with("main.ko"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_eval_repl_spawns_repl() {
        let engine = InterpreterEngine::with_path("/bin/echo");
        match engine.eval_repl("1 + 1").await.unwrap() {
            ReplOutcome::Evaluated(output) => assert_eq!(output.stdout, "repl\n"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}

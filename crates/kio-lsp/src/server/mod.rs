// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! The main Language Server implementation.
//!
//! # LSP Lifecycle
//!
//! 1. Editor starts our binary and sends `initialize` request
//! 2. We respond with our capabilities (what features we support)
//! 3. Editor sends `initialized` notification (handshake complete)
//! 4. Normal operation: file events, requests flow both directions
//! 5. Editor sends `shutdown` request, we respond, then `exit` notification
//!
//! # Consistency
//!
//! Every request works on a snapshot of the workspace. If a document moved
//! to a newer version while we were computing, the result is dropped and
//! the editor asks again.

mod commands;
mod config;
mod utils;

use config::ServerConfig;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use commands::{Command, RunReport};
use kio_analyzer::completion::{self, completion_items};
use kio_analyzer::text::LineIndex;
use kio_analyzer::{
    colors, definition, hover, refactor, rename, DocumentSnapshot, FormatterEngine, IndentUnit,
    InterpreterEngine, RenameEngine, WorkspaceView,
};
use lsp_types::*;
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::{Client, LanguageServer};
use utils::PositionEncoding;

/// The kio Language Server.
///
/// This struct holds all the state needed by the server:
/// - `client`: Used to send notifications TO the editor
/// - `workspace`: Every open document, versioned
/// - `interpreter`: Wraps the `kio` binary for run commands
pub struct KioLanguageServer {
    /// The LSP client - used to send messages TO the editor.
    client: Client,

    /// Open documents, keyed by their URI.
    workspace: Arc<WorkspaceView>,

    /// The interpreter engine. Replaced when the configured path changes.
    interpreter: Arc<RwLock<Arc<InterpreterEngine>>>,

    /// Settings from the editor.
    config: Arc<RwLock<ServerConfig>>,

    /// Negotiated during `initialize`.
    encoding: OnceLock<PositionEncoding>,

    /// The client accepts versioned `documentChanges` in workspace edits.
    supports_document_changes: AtomicBool,
}

impl KioLanguageServer {
    /// Create a new language server instance.
    pub fn new(client: Client) -> Self {
        let interpreter = InterpreterEngine::new();

        if interpreter.is_available() {
            tracing::info!("kio interpreter found");
        } else {
            tracing::warn!("kio interpreter not found - run commands will be unavailable");
        }

        Self {
            client,
            workspace: Arc::new(WorkspaceView::new()),
            interpreter: Arc::new(RwLock::new(Arc::new(interpreter))),
            config: Arc::new(RwLock::new(ServerConfig::default())),
            encoding: OnceLock::new(),
            supports_document_changes: AtomicBool::new(false),
        }
    }

    fn encoding(&self) -> PositionEncoding {
        self.encoding.get().copied().unwrap_or_default()
    }

    fn versioned_edits(&self) -> bool {
        self.supports_document_changes.load(Ordering::Relaxed)
    }

    fn snapshot(&self, uri: &Uri) -> Option<DocumentSnapshot> {
        let snapshot = self.workspace.snapshot(&uri.to_string());
        if snapshot.is_none() {
            tracing::debug!("Request for untracked document: {}", uri.to_string());
        }
        snapshot
    }

    fn is_stale(&self, snapshot: &DocumentSnapshot) -> bool {
        utils::is_stale(&self.workspace, snapshot)
    }

    /// Convert formatter edits, or `None` if the document changed meanwhile.
    fn formatting_result(
        &self,
        snapshot: &DocumentSnapshot,
        edits: Vec<kio_analyzer::TextEdit>,
    ) -> Option<Vec<TextEdit>> {
        if self.is_stale(snapshot) {
            return None;
        }
        let encoding = self.encoding();
        let index = LineIndex::new(&snapshot.text);
        Some(
            edits
                .iter()
                .map(|edit| encoding.edit_to_lsp(&index, edit))
                .collect(),
        )
    }

    /// Replace the configuration, relocating the interpreter if its path
    /// changed.
    async fn apply_config(&self, config: ServerConfig) {
        let path_changed = self.config.read().await.interpreter_path != config.interpreter_path;

        if path_changed {
            let configured = config.interpreter_path.clone();
            let lookup = tokio::task::spawn_blocking(move || {
                InterpreterEngine::with_configured(configured.as_deref())
            })
            .await;

            match lookup {
                Ok(engine) => {
                    if !engine.is_available() {
                        tracing::warn!("kio interpreter not found after configuration change");
                    }
                    *self.interpreter.write().await = Arc::new(engine);
                }
                Err(e) => tracing::warn!("Interpreter lookup failed: {}", e),
            }
        }

        tracing::info!("Configuration updated: {:?}", config);
        *self.config.write().await = config;
    }

    async fn run_file(&self, uri: &str) -> Result<Option<Value>> {
        let interpreter = self.interpreter.read().await.clone();

        let result = match commands::file_path(uri) {
            Some(path) => interpreter.run_file(&path).await,
            None => match self.workspace.snapshot(uri) {
                Some(snapshot) => interpreter.run_source(&snapshot.text).await,
                None => {
                    return Err(Error::invalid_params(format!("Unknown document: {}", uri)));
                }
            },
        };

        match result {
            Ok(output) => {
                if !output.stdout.is_empty() {
                    self.client.log_message(MessageType::INFO, &output.stdout).await;
                }
                if !output.success() {
                    self.client
                        .show_message(
                            MessageType::WARNING,
                            format!("kio exited with {:?}: {}", output.exit_code, output.stderr.trim()),
                        )
                        .await;
                }
                Ok(serde_json::to_value(RunReport::from(&output)).ok())
            }
            Err(e) => {
                self.client
                    .show_message(MessageType::ERROR, format!("Run failed: {}", e))
                    .await;
                Ok(None)
            }
        }
    }

    async fn run_in_repl(&self, code: &str) -> Result<Option<Value>> {
        if !self.config.read().await.enable_repl {
            self.client
                .show_message(MessageType::INFO, "REPL is disabled. Enable it in settings.")
                .await;
            return Ok(None);
        }

        let interpreter = self.interpreter.read().await.clone();
        match interpreter.eval_repl(code).await {
            Ok(outcome) => {
                let transcript = commands::repl_transcript(code, &outcome);
                if !transcript.is_empty() {
                    self.client.log_message(MessageType::INFO, &transcript).await;
                }
                Ok(Some(Value::String(transcript)))
            }
            Err(e) => {
                self.client
                    .show_message(MessageType::ERROR, format!("REPL failed: {}", e))
                    .await;
                Ok(None)
            }
        }
    }
}

fn content_modified() -> Error {
    Error {
        code: ErrorCode::ServerError(-32801),
        message: "Content modified".into(),
        data: None,
    }
}

/// Implementation of the Language Server Protocol.
impl LanguageServer for KioLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("Received initialize request");

        let encoding = PositionEncoding::negotiate(
            params
                .capabilities
                .general
                .as_ref()
                .and_then(|general| general.position_encodings.as_deref()),
        );
        if self.encoding.set(encoding).is_err() {
            tracing::warn!("Duplicate initialize request, keeping first position encoding");
        }
        tracing::info!("Position encoding: {:?}", encoding);

        let document_changes = params
            .capabilities
            .workspace
            .as_ref()
            .and_then(|workspace| workspace.workspace_edit.as_ref())
            .and_then(|edit| edit.document_changes)
            .unwrap_or(false);
        self.supports_document_changes
            .store(document_changes, Ordering::Relaxed);

        if let Some(config) = params
            .initialization_options
            .as_ref()
            .and_then(ServerConfig::from_value)
        {
            self.apply_config(config).await;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                position_encoding: Some(encoding.kind()),
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        ..Default::default()
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(
                        completion::TRIGGER_CHARACTERS
                            .iter()
                            .map(|c| c.to_string())
                            .collect(),
                    ),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                document_formatting_provider: Some(OneOf::Left(true)),
                document_range_formatting_provider: Some(OneOf::Left(true)),
                document_on_type_formatting_provider: Some(DocumentOnTypeFormattingOptions {
                    first_trigger_character: "}".to_string(),
                    more_trigger_character: Some(vec!["]".to_string(), "\n".to_string()]),
                }),
                color_provider: Some(ColorProviderCapability::Simple(true)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![CodeActionKind::REFACTOR_EXTRACT]),
                        ..Default::default()
                    },
                )),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: Default::default(),
                })),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: commands::ALL.iter().map(|c| c.to_string()).collect(),
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "kio-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        tracing::info!("Server initialized - handshake complete");
        self.client
            .log_message(MessageType::INFO, "kio LSP server ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutdown requested");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        tracing::debug!("Document opened: {}", uri);

        self.workspace
            .open(uri, &params.text_document.text, params.text_document.version);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        let Some(snapshot) = self.workspace.snapshot(&uri) else {
            tracing::warn!("Change for unopened document: {}", uri);
            return;
        };

        let changes = self
            .encoding()
            .changes_from_lsp(&snapshot.text, params.content_changes);

        if !self
            .workspace
            .apply_changes(&uri, changes, params.text_document.version)
        {
            tracing::warn!(
                "Rejected change for {} at version {}",
                uri,
                params.text_document.version
            );
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        tracing::debug!("Document closed: {}", uri);
        self.workspace.close(&uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if let Some(config) = ServerConfig::from_value(&params.settings) {
            self.apply_config(config).await;
        }
    }

    async fn completion(&self, _params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let items = completion_items().iter().map(utils::completion_item).collect();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let Some(snapshot) = self.snapshot(&params.text_document.uri) else {
            return Ok(None);
        };

        let unit = IndentUnit::from_options(params.options.tab_size, params.options.insert_spaces);
        let edits = FormatterEngine::new(unit).format_document(&snapshot.text);

        Ok(self.formatting_result(&snapshot, edits))
    }

    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        let Some(snapshot) = self.snapshot(&params.text_document.uri) else {
            return Ok(None);
        };

        let (first, last) = utils::selected_lines(params.range);

        let unit = IndentUnit::from_options(params.options.tab_size, params.options.insert_spaces);
        let edits = FormatterEngine::new(unit).range_edits(&snapshot.text, first, last);

        Ok(self.formatting_result(&snapshot, edits))
    }

    async fn on_type_formatting(
        &self,
        params: DocumentOnTypeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        if !self.config.read().await.format_on_type {
            return Ok(None);
        }

        let position = params.text_document_position;
        let Some(snapshot) = self.snapshot(&position.text_document.uri) else {
            return Ok(None);
        };

        let line = utils::on_type_line(&params.ch, position.position);

        let unit = IndentUnit::from_options(params.options.tab_size, params.options.insert_spaces);
        let edits = FormatterEngine::new(unit).on_type_edits(&snapshot.text, line);

        Ok(self.formatting_result(&snapshot, edits))
    }

    async fn document_color(&self, params: DocumentColorParams) -> Result<Vec<ColorInformation>> {
        let uri = params.text_document.uri.to_string();

        let Some(snapshot) = self.workspace.snapshot(&uri) else {
            return Ok(vec![]);
        };
        let Some(records) = self.workspace.decorations(&uri) else {
            return Ok(vec![]);
        };
        if self.is_stale(&snapshot) {
            return Ok(vec![]);
        }

        let encoding = self.encoding();
        let index = LineIndex::new(&snapshot.text);
        Ok(records
            .iter()
            .map(|record| ColorInformation {
                range: encoding.range_to_lsp(&index, record.range),
                color: utils::color_to_lsp(&record.color),
            })
            .collect())
    }

    async fn color_presentation(
        &self,
        params: ColorPresentationParams,
    ) -> Result<Vec<ColorPresentation>> {
        let color = utils::color_from_lsp(&params.color);

        Ok(colors::presentations(&color)
            .into_iter()
            .map(|label| ColorPresentation {
                text_edit: Some(TextEdit {
                    range: params.range,
                    new_text: label.clone(),
                }),
                label,
                additional_text_edits: None,
            })
            .collect())
    }

    async fn prepare_rename(
        &self,
        params: TextDocumentPositionParams,
    ) -> Result<Option<PrepareRenameResponse>> {
        let Some(snapshot) = self.snapshot(&params.text_document.uri) else {
            return Ok(None);
        };

        let encoding = self.encoding();
        let index = LineIndex::new(&snapshot.text);
        let position = encoding.from_lsp(&index, params.position);

        Ok(rename::prepare(&snapshot.text, position)
            .map(|range| PrepareRenameResponse::Range(encoding.range_to_lsp(&index, range))))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri.to_string();
        let snapshots = self.workspace.snapshot_all();
        let encoding = self.encoding();

        let Some(anchor) = snapshots.iter().find(|doc| doc.uri == uri) else {
            return Ok(None);
        };
        let position = encoding.from_lsp(
            &LineIndex::new(&anchor.text),
            params.text_document_position.position,
        );

        let texts: HashMap<String, String> = snapshots
            .iter()
            .map(|doc| (doc.uri.clone(), doc.text.clone()))
            .collect();

        let result = RenameEngine::new(snapshots)
            .rename(&uri, position, &params.new_name)
            .map_err(|e| Error::invalid_params(e.to_string()))?;
        let Some(mut result) = result else {
            return Ok(None);
        };

        // Closed documents drop out; the rest must still be current unless
        // the client can check versions itself.
        let all_current = utils::retain_open(&self.workspace, &mut result);
        if result.is_empty() {
            return Ok(None);
        }
        let versioned = self.versioned_edits();
        if !versioned && !all_current {
            return Err(content_modified());
        }

        let mut documents = Vec::with_capacity(result.changes.len());
        for (doc_uri, doc) in &result.changes {
            let Some(text) = texts.get(doc_uri) else {
                continue;
            };
            let Ok(lsp_uri) = Uri::from_str(doc_uri) else {
                tracing::warn!("Skipping rename in unparsable URI: {}", doc_uri);
                continue;
            };

            let index = LineIndex::new(text);
            let edits: Vec<TextEdit> = doc
                .edits
                .iter()
                .map(|edit| encoding.edit_to_lsp(&index, edit))
                .collect();
            documents.push((lsp_uri, doc.version, edits));
        }

        Ok(Some(utils::workspace_edit(documents, versioned)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let Some(snapshot) = self.snapshot(&position.text_document.uri) else {
            return Ok(None);
        };

        let encoding = self.encoding();
        let index = LineIndex::new(&snapshot.text);
        let Some(info) = hover::hover(&snapshot.text, encoding.from_lsp(&index, position.position))
        else {
            return Ok(None);
        };

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: info.contents,
            }),
            range: Some(encoding.range_to_lsp(&index, info.range)),
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        let uri = position.text_document.uri.to_string();
        let documents = self.workspace.snapshot_all();
        let encoding = self.encoding();

        let Some(anchor) = documents.iter().find(|doc| doc.uri == uri) else {
            return Ok(None);
        };
        let cursor = encoding.from_lsp(&LineIndex::new(&anchor.text), position.position);

        let Some(found) = definition::definition(&documents, &uri, cursor) else {
            return Ok(None);
        };
        let Some(target) = documents.iter().find(|doc| doc.uri == found.uri) else {
            return Ok(None);
        };
        let Ok(target_uri) = Uri::from_str(&found.uri) else {
            return Ok(None);
        };

        Ok(Some(GotoDefinitionResponse::Scalar(Location {
            uri: target_uri,
            range: encoding.range_to_lsp(&LineIndex::new(&target.text), found.range),
        })))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        if let Some(only) = &params.context.only {
            if !utils::accepts_kind(only, &CodeActionKind::REFACTOR_EXTRACT) {
                return Ok(None);
            }
        }

        let Some(snapshot) = self.snapshot(&params.text_document.uri) else {
            return Ok(None);
        };
        let encoding = self.encoding();
        let index = LineIndex::new(&snapshot.text);
        let selection = encoding.range_from_lsp(&index, params.range);
        if selection.is_empty() {
            return Ok(None);
        }

        let documents = self.workspace.snapshot_all();
        let Some(extraction) = refactor::extract_function(
            &snapshot.text,
            selection,
            &documents,
            &IndentUnit::default(),
        ) else {
            return Ok(None);
        };
        if self.is_stale(&snapshot) {
            return Ok(None);
        }

        let edits: Vec<TextEdit> = extraction
            .edits
            .iter()
            .map(|edit| encoding.edit_to_lsp(&index, edit))
            .collect();
        let edit = utils::workspace_edit(
            vec![(params.text_document.uri, snapshot.version, edits)],
            self.versioned_edits(),
        );

        Ok(Some(vec![CodeActionOrCommand::CodeAction(CodeAction {
            title: "Extract to function".to_string(),
            kind: Some(CodeActionKind::REFACTOR_EXTRACT),
            edit: Some(edit),
            ..Default::default()
        })]))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let command =
            Command::parse(&params.command, &params.arguments).map_err(Error::invalid_params)?;
        tracing::debug!("Executing command: {:?}", command);

        match command {
            Command::RunFile { uri } => self.run_file(&uri).await,
            Command::RunInRepl { code } => self.run_in_repl(&code).await,
            Command::ShowVersion => {
                let version = env!("CARGO_PKG_VERSION");
                self.client
                    .show_message(
                        MessageType::INFO,
                        format!("kio Language Support v{}", version),
                    )
                    .await;
                Ok(Some(Value::String(version.to_string())))
            }
        }
    }
}

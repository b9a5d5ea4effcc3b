// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! kio LSP - Language Server for the kio programming language
//!
//! # How this works
//!
//! 1. This binary is started by the editor
//! 2. Communication happens over stdin/stdout using JSON-RPC
//! 3. The editor sends requests (initialize, textDocument/*, etc.)
//! 4. We respond with edits, colors, completions and command results
//!
//! Since stdin/stdout carry the protocol, all logging goes through
//! `tracing` to stderr.

mod server;

use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug to see debug messages
    // Example: RUST_LOG=kio_lsp=debug,kio_analyzer=debug kio-lsp
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting kio-lsp server v{}", env!("CARGO_PKG_VERSION"));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    // The Client handed to the closure is how we talk back to the editor
    let (service, socket) = LspService::build(server::KioLanguageServer::new).finish();

    // Runs until the editor disconnects
    Server::new(stdin, stdout, socket).serve(service).await;

    tracing::info!("kio-lsp server stopped");
}

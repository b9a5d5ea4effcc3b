// This file is part of kio-lsp.
// Copyright (C) 2025 The kio-lsp Authors
// SPDX-License-Identifier: Apache-2.0

//! The workspace view: every document the editor currently has open.
//!
//! The view is the only shared mutable state in the analyzer. It is written
//! by document-change notifications and read through snapshots, so a scan
//! or rename always sees one consistent version of each document.

use std::sync::Arc;

use dashmap::DashMap;
use ropey::Rope;

use crate::colors::{self, DecorationRecord};
use crate::text::{Position, Range};

/// A document we're tracking (an open file in the editor).
#[derive(Debug, Clone)]
pub struct Document {
    /// The document content, stored as a rope for cheap incremental edits
    /// and cheap clones.
    pub content: Rope,

    /// Document version, strictly increasing on every accepted change.
    pub version: i32,
}

/// An immutable copy of one document at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub uri: String,
    pub text: String,
    pub version: i32,
}

/// One change reported by the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    /// Replaced range, or `None` for a full-text replacement.
    pub range: Option<Range>,
    pub text: String,
}

impl ContentChange {
    pub fn full(text: impl Into<String>) -> Self {
        Self {
            range: None,
            text: text.into(),
        }
    }

    pub fn incremental(range: Range, text: impl Into<String>) -> Self {
        Self {
            range: Some(range),
            text: text.into(),
        }
    }
}

/// Registry of open documents, keyed by URI.
#[derive(Debug, Default)]
pub struct WorkspaceView {
    documents: DashMap<String, Document>,

    /// Color decorations per document, tagged with the version they were
    /// computed from.
    decorations: DashMap<String, (i32, Arc<Vec<DecorationRecord>>)>,
}

impl WorkspaceView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a document, replacing any previous copy.
    pub fn open(&self, uri: impl Into<String>, text: &str, version: i32) {
        let uri = uri.into();
        self.decorations.remove(&uri);
        self.documents.insert(
            uri,
            Document {
                content: Rope::from_str(text),
                version,
            },
        );
    }

    /// Apply a batch of changes as one new version.
    ///
    /// The batch is applied to a copy and committed only if every change is
    /// valid and `version` is newer than the stored one. Returns whether the
    /// batch was accepted.
    pub fn apply_changes(
        &self,
        uri: &str,
        changes: impl IntoIterator<Item = ContentChange>,
        version: i32,
    ) -> bool {
        let Some(mut doc) = self.documents.get_mut(uri) else {
            tracing::warn!("Change for untracked document: {}", uri);
            return false;
        };

        if version <= doc.version {
            tracing::warn!(
                "Ignoring stale change for {}: version {} <= {}",
                uri,
                version,
                doc.version
            );
            return false;
        }

        let mut content = doc.content.clone();
        for change in changes {
            match change.range {
                Some(range) => {
                    let (Some(start), Some(end)) = (
                        char_index(&content, range.start),
                        char_index(&content, range.end),
                    ) else {
                        tracing::warn!("Change outside document bounds for {}: {:?}", uri, range);
                        return false;
                    };
                    content.remove(start..end);
                    content.insert(start, &change.text);
                }
                None => content = Rope::from_str(&change.text),
            }
        }

        doc.content = content;
        doc.version = version;
        drop(doc);

        self.decorations.remove(uri);
        true
    }

    /// Stop tracking a document. Returns whether it was tracked.
    pub fn close(&self, uri: &str) -> bool {
        self.decorations.remove(uri);
        self.documents.remove(uri).is_some()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// URIs of all tracked documents, sorted.
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.documents.iter().map(|e| e.key().clone()).collect();
        uris.sort();
        uris
    }

    pub fn version(&self, uri: &str) -> Option<i32> {
        self.documents.get(uri).map(|doc| doc.version)
    }

    /// True if `uri` is tracked and still at `version`.
    pub fn is_current(&self, uri: &str, version: i32) -> bool {
        self.version(uri) == Some(version)
    }

    pub fn snapshot(&self, uri: &str) -> Option<DocumentSnapshot> {
        let doc = self.documents.get(uri)?;
        Some(DocumentSnapshot {
            uri: uri.to_string(),
            text: doc.content.to_string(),
            version: doc.version,
        })
    }

    /// Snapshot every tracked document, sorted by URI.
    pub fn snapshot_all(&self) -> Vec<DocumentSnapshot> {
        let mut snapshots: Vec<DocumentSnapshot> = self
            .documents
            .iter()
            .map(|entry| DocumentSnapshot {
                uri: entry.key().clone(),
                text: entry.value().content.to_string(),
                version: entry.value().version,
            })
            .collect();
        snapshots.sort_by(|a, b| a.uri.cmp(&b.uri));
        snapshots
    }

    /// Color decorations for the current version of `uri`.
    ///
    /// A cached set is reused only while the document version is unchanged;
    /// any newer version is recomputed in full and replaces the old set.
    pub fn decorations(&self, uri: &str) -> Option<Arc<Vec<DecorationRecord>>> {
        let snapshot = self.snapshot(uri)?;

        if let Some(entry) = self.decorations.get(uri) {
            let (version, records) = entry.value();
            if *version == snapshot.version {
                return Some(records.clone());
            }
        }

        let records = Arc::new(colors::decorations(&snapshot.text));
        tracing::debug!(
            "Computed {} color decorations for {} (v{})",
            records.len(),
            uri,
            snapshot.version
        );

        if self.is_current(uri, snapshot.version) {
            self.decorations
                .insert(uri.to_string(), (snapshot.version, records.clone()));
        }

        Some(records)
    }
}

/// Char index of `position` in `rope`.
///
/// Characters past the end of a line clamp to the line end; lines past the
/// end of the rope are rejected.
fn char_index(rope: &Rope, position: Position) -> Option<usize> {
    let line_idx = position.line as usize;
    if line_idx >= rope.len_lines() {
        return None;
    }

    let line = rope.line(line_idx);
    let mut len = line.len_chars();
    if len > 0 && line.char(len - 1) == '\n' {
        len -= 1;
        if len > 0 && line.char(len - 1) == '\r' {
            len -= 1;
        }
    }

    let character = (position.character as usize).min(len);
    Some(rope.line_to_char(line_idx) + character)
}

//! Per-session Document Store

use std::collections::HashMap;

use tower_lsp::lsp_types::{Range, TextDocumentContentChangeEvent, Url};
use tracing::debug;

use crate::document::error::DocumentError;
use crate::document::text::offset_at;

/// An open text buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub uri: Url,
    pub text: String,
    pub version: i32,
    pub language_id: String,
}

/// Open documents of one session, keyed by uri
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the document for `uri`.
    pub fn open(&mut self, uri: Url, text: String, version: i32, language_id: String) -> &Document {
        debug!("Opening {} at version {}", uri, version);
        let document = Document {
            uri: uri.clone(),
            text,
            version,
            language_id,
        };
        self.documents.insert(uri.clone(), document);
        &self.documents[&uri]
    }

    /// Apply a change set to the stored text of `uri`.
    ///
    /// Edits apply in order, each against the text left by the edits before
    /// it. The set is committed only if every edit is valid.
    ///
    /// A version older than the stored one yields `StaleVersion`, but the
    /// text is still applied so the store does not drift from the client.
    /// The stored version is left as is in that case.
    pub fn apply_change(
        &mut self,
        uri: &Url,
        version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<(), DocumentError> {
        let document = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| DocumentError::UnknownDocument(uri.clone()))?;

        document.text = apply_edits(&document.text, changes)?;

        if version < document.version {
            return Err(DocumentError::StaleVersion {
                uri: uri.clone(),
                current: document.version,
                incoming: version,
            });
        }
        document.version = version;
        Ok(())
    }

    pub fn get(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn close(&mut self, uri: &Url) -> Option<Document> {
        self.documents.remove(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn apply_edits(
    text: &str,
    changes: &[TextDocumentContentChangeEvent],
) -> Result<String, DocumentError> {
    let mut working = text.to_string();

    for change in changes {
        let Some(range) = change.range else {
            working = change.text.clone();
            continue;
        };

        check_range(range)?;
        let start = offset_at(&working, range.start);
        let end = offset_at(&working, range.end);
        working.replace_range(start..end, &change.text);
    }

    Ok(working)
}

fn check_range(range: Range) -> Result<(), DocumentError> {
    let start = (range.start.line, range.start.character);
    let end = (range.end.line, range.end.character);
    if start > end {
        return Err(DocumentError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    Ok(())
}

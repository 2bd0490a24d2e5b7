//! Per-session state shared by the handlers

use std::fmt;
use std::sync::Arc;

use tower_lsp::lsp_types::{ClientInfo, Url};
use tracing::{info, warn};

use crate::document::DocumentStore;
use crate::lsp::diagnostics::{DiagnosticsEngine, publish_notification};
use crate::rpc::Message;

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initialized => "initialized",
            SessionState::ShuttingDown => "shutting down",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

pub struct SessionContext {
    pub state: SessionState,
    pub documents: DocumentStore,
    pub client_info: Option<ClientInfo>,
    /// Set when `exit` arrives after `shutdown`
    pub clean_exit: bool,
    diagnostics: Arc<DiagnosticsEngine>,
    outbox: Vec<Message>,
}

impl SessionContext {
    pub fn new(diagnostics: Arc<DiagnosticsEngine>) -> Self {
        Self {
            state: SessionState::Uninitialized,
            documents: DocumentStore::new(),
            client_info: None,
            clean_exit: false,
            diagnostics,
            outbox: Vec::new(),
        }
    }

    /// Messages queued while handling the current one
    pub fn take_outbox(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }

    /// Recompute and queue the full diagnostic set for `uri`.
    ///
    /// When no analyzer is available the publish is skipped and whatever the
    /// client last received for `uri` stays in place.
    pub fn publish_diagnostics(&mut self, uri: &Url) {
        let Some(document) = self.documents.get(uri) else {
            warn!("Cannot publish diagnostics for unopened document {}", uri);
            return;
        };

        match self.diagnostics.compute(&document.text, &document.language_id) {
            Ok(diagnostics) => {
                let count = diagnostics.len();
                match publish_notification(uri.clone(), document.version, diagnostics) {
                    Ok(notification) => {
                        info!(
                            "Publishing {} diagnostics for {} (version {})",
                            count, uri, document.version
                        );
                        self.outbox.push(notification.into());
                    }
                    Err(e) => {
                        warn!("Skipping diagnostics for {}: failed to encode: {}", uri, e);
                    }
                }
            }
            Err(e) => {
                warn!("Skipping diagnostics for {}: {}", uri, e);
            }
        }
    }
}

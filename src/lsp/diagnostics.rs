//! Syntax-error diagnostics
//!
//! Every reported error node becomes one `Error` diagnostic spanning the
//! node. Results are always published as the complete set for a document
//! version, so an empty list clears what was reported before.

use thiserror::Error;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, PublishDiagnosticsParams, Range, Url};
use tracing::debug;

use crate::analyzer::{AnalyzerError, AnalyzerRegistry, ErrorNode};
use crate::lsp::capabilities::SERVER_NAME;
use crate::rpc::Notification;

pub const PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("Syntax analyzer unavailable for '{language_id}': {source}")]
    AnalyzerUnavailable {
        language_id: String,
        #[source]
        source: AnalyzerError,
    },
}

pub struct DiagnosticsEngine {
    registry: AnalyzerRegistry,
}

impl DiagnosticsEngine {
    pub fn new(registry: AnalyzerRegistry) -> Self {
        Self { registry }
    }

    /// Parse `text` with the analyzer for `language_id` and report every
    /// syntax error.
    pub fn compute(&self, text: &str, language_id: &str) -> Result<Vec<Diagnostic>, DiagnosticsError> {
        let unavailable = |source| DiagnosticsError::AnalyzerUnavailable {
            language_id: language_id.to_string(),
            source,
        };

        let analyzer = self.registry.get(language_id).map_err(unavailable)?;
        let tree = analyzer.parse(text).map_err(unavailable)?;

        let diagnostics: Vec<Diagnostic> = tree
            .error_nodes()
            .into_iter()
            .inspect(|node| {
                debug!(
                    "Syntax error {:?} from ({}, {}) to ({}, {})",
                    node.text, node.start.line, node.start.character, node.end.line, node.end.character
                );
            })
            .map(to_diagnostic)
            .collect();
        debug!("Found {} syntax errors in {} text", diagnostics.len(), language_id);
        Ok(diagnostics)
    }
}

/// Map an error node to a diagnostic. Positions are taken as is.
pub fn to_diagnostic(node: ErrorNode) -> Diagnostic {
    Diagnostic {
        range: Range::new(node.start, node.end),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some(SERVER_NAME.to_string()),
        message: format!("Error on line {}", node.start.line),
        ..Default::default()
    }
}

/// Build the `textDocument/publishDiagnostics` notification
pub fn publish_notification(
    uri: Url,
    version: i32,
    diagnostics: Vec<Diagnostic>,
) -> Result<Notification, serde_json::Error> {
    let params = PublishDiagnosticsParams::new(uri, diagnostics, Some(version));
    let params = serde_json::to_value(params)?;
    Ok(Notification::new(PUBLISH_DIAGNOSTICS, params))
}

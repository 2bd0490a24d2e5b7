//! Method handlers and the routing table

use serde_json::Value;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidOpenTextDocumentParams, InitializeParams, SemanticTokens,
    SemanticTokensParams, TextDocumentItem,
};
use tracing::{info, warn};

use crate::document::DocumentError;
use crate::lsp::capabilities::InitializeResponse;
use crate::lsp::context::{SessionContext, SessionState};
use crate::lsp::dispatcher::{Dispatcher, EXIT, INITIALIZE};
use crate::rpc::ResponseError;

pub const DID_OPEN: &str = "textDocument/didOpen";
pub const DID_CHANGE: &str = "textDocument/didChange";
pub const SEMANTIC_TOKENS_FULL: &str = "textDocument/semanticTokens/full";
pub const SHUTDOWN: &str = "shutdown";

/// Dispatcher with every supported method registered
pub fn routes() -> Dispatcher {
    Dispatcher::new()
        .on_request(INITIALIZE, initialize)
        .on_notification(DID_OPEN, did_open)
        .on_notification(DID_CHANGE, did_change)
        .on_request(SEMANTIC_TOKENS_FULL, semantic_tokens_full)
        .on_request(SHUTDOWN, shutdown)
        .on_notification(EXIT, exit)
}

fn initialize(
    context: &mut SessionContext,
    params: InitializeParams,
) -> Result<InitializeResponse, ResponseError> {
    match &params.client_info {
        Some(client) => info!(
            "Connected to ({}, {})",
            client.name,
            client.version.as_deref().unwrap_or("unknown version")
        ),
        None => info!("Connected to unnamed client"),
    }

    context.client_info = params.client_info;
    context.state = SessionState::Initialized;
    Ok(InitializeResponse::new())
}

fn did_open(
    context: &mut SessionContext,
    params: DidOpenTextDocumentParams,
) -> Result<(), ResponseError> {
    let TextDocumentItem {
        uri,
        language_id,
        version,
        text,
    } = params.text_document;

    info!("Document opened: {} ({}, version {})", uri, language_id, version);
    context.documents.open(uri.clone(), text, version, language_id);
    context.publish_diagnostics(&uri);
    Ok(())
}

fn did_change(
    context: &mut SessionContext,
    params: DidChangeTextDocumentParams,
) -> Result<(), ResponseError> {
    let uri = params.text_document.uri;
    let version = params.text_document.version;

    match context
        .documents
        .apply_change(&uri, version, &params.content_changes)
    {
        Ok(()) => {}
        Err(e @ DocumentError::StaleVersion { .. }) => {
            warn!("{}; change applied anyway", e);
        }
        Err(e) => {
            warn!("Rejected change to {}: {}", uri, e);
            return Ok(());
        }
    }

    if let Some(document) = context.documents.get(&uri) {
        info!("Document changed: {} (version {})", uri, document.version);
    }
    context.publish_diagnostics(&uri);
    Ok(())
}

fn semantic_tokens_full(
    _context: &mut SessionContext,
    params: SemanticTokensParams,
) -> Result<SemanticTokens, ResponseError> {
    info!("Semantic tokens requested for {}", params.text_document.uri);
    Ok(SemanticTokens::default())
}

fn shutdown(context: &mut SessionContext, _params: Value) -> Result<Value, ResponseError> {
    info!("Shutdown request received");
    context.state = SessionState::ShuttingDown;
    Ok(Value::Null)
}

fn exit(context: &mut SessionContext, _params: Value) -> Result<(), ResponseError> {
    if context.state == SessionState::ShuttingDown {
        info!("Exit received, terminating session");
        context.clean_exit = true;
    } else {
        warn!("Exit received while {}, terminating abnormally", context.state);
    }
    context.state = SessionState::Terminated;
    Ok(())
}

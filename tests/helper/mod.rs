//! Shared helpers for session-level tests
#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use tower_lsp::lsp_types::{Position, PublishDiagnosticsParams};

use syntax_lsp::analyzer::{AnalyzerError, AnalyzerRegistry, ErrorNode, SyntaxAnalyzer, SyntaxTree};
use syntax_lsp::lsp::{Server, SessionError, Termination};
use syntax_lsp::rpc::framing::encode_frame;
use syntax_lsp::rpc::{Id, Message, MessageReader, Response};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub const BANG_LANGUAGE: &str = "bang";

/// Analyzer that reports an error wherever a line contains `!!`
pub struct BangAnalyzer;

struct BangTree {
    nodes: Vec<ErrorNode>,
}

impl SyntaxTree for BangTree {
    fn error_nodes(&self) -> Vec<ErrorNode> {
        self.nodes.clone()
    }
}

impl SyntaxAnalyzer for BangAnalyzer {
    fn parse(&self, text: &str) -> Result<Box<dyn SyntaxTree>, AnalyzerError> {
        let nodes = text
            .split('\n')
            .enumerate()
            .filter_map(|(line, content)| {
                let column = content.find("!!")? as u32;
                Some(ErrorNode {
                    start: Position::new(line as u32, column),
                    end: Position::new(line as u32, column + 2),
                    text: "!!".to_string(),
                })
            })
            .collect();
        Ok(Box::new(BangTree { nodes }))
    }
}

pub fn bang_registry() -> AnalyzerRegistry {
    let mut registry = AnalyzerRegistry::new();
    registry.register(BANG_LANGUAGE, BangAnalyzer);
    registry
}

/// Client end of an in-memory connection to a running session
pub struct TestClient {
    reader: MessageReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
    next_id: i64,
}

/// Start a session on its own task and return the client end
pub fn start_session(
    registry: AnalyzerRegistry,
) -> (TestClient, JoinHandle<Result<Termination, SessionError>>) {
    let (client, server_end) = tokio::io::duplex(64 * 1024);

    let server = Server::new(registry);
    let (server_reader, server_writer) = tokio::io::split(server_end);
    let session = server.session(server_reader, server_writer);
    let handle = tokio::spawn(session.run());

    let (reader, writer) = tokio::io::split(client);
    let client = TestClient {
        reader: MessageReader::new(reader),
        writer,
        next_id: 1,
    };
    (client, handle)
}

impl TestClient {
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    pub async fn send(&mut self, payload: Value) {
        let frame = encode_frame(payload.to_string().as_bytes());
        self.send_raw(&frame).await;
    }

    pub async fn request(&mut self, method: &str, params: Value) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
        Id::Number(id)
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        self.send(json!({"jsonrpc": "2.0", "method": method, "params": params}))
            .await;
    }

    pub async fn did_open(&mut self, uri: &str, language_id: &str, version: i32, text: &str) {
        self.notify(
            "textDocument/didOpen",
            json!({"textDocument": {"uri": uri, "languageId": language_id, "version": version, "text": text}}),
        )
        .await;
    }

    pub async fn did_change(&mut self, uri: &str, version: i32, changes: Value) {
        self.notify(
            "textDocument/didChange",
            json!({"textDocument": {"uri": uri, "version": version}, "contentChanges": changes}),
        )
        .await;
    }

    pub async fn recv(&mut self) -> Message {
        let payload = tokio::time::timeout(RECV_TIMEOUT, self.reader.read_message())
            .await
            .expect("Timed out waiting for a message")
            .expect("Framing error")
            .expect("Session closed the connection");
        Message::decode(&payload).expect("Server sent an undecodable message")
    }

    pub async fn recv_response(&mut self, id: &Id) -> Response {
        match self.recv().await {
            Message::Response(response) if &response.id == id => response,
            other => panic!("Expected response to {}, got {:?}", id, other),
        }
    }

    pub async fn recv_diagnostics(&mut self) -> PublishDiagnosticsParams {
        match self.recv().await {
            Message::Notification(notification)
                if notification.method == "textDocument/publishDiagnostics" =>
            {
                serde_json::from_value(notification.params).unwrap()
            }
            other => panic!("Expected publishDiagnostics, got {:?}", other),
        }
    }

    pub async fn initialize(&mut self) -> Response {
        let id = self
            .request(
                "initialize",
                json!({"capabilities": {}, "clientInfo": {"name": "test-client", "version": "1.0"}}),
            )
            .await;
        self.recv_response(&id).await
    }

    /// Wait for the session to close its end of the connection
    pub async fn expect_closed(&mut self) {
        let next = tokio::time::timeout(RECV_TIMEOUT, self.reader.read_message())
            .await
            .expect("Timed out waiting for the connection to close");
        assert!(matches!(next, Ok(None)), "Expected close, got {:?}", next);
    }

    pub async fn close(&mut self) {
        self.writer.shutdown().await.unwrap();
    }
}

pub fn range(start: (u32, u32), end: (u32, u32), text: &str) -> Value {
    json!({
        "range": {
            "start": {"line": start.0, "character": start.1},
            "end": {"line": end.0, "character": end.1},
        },
        "text": text,
    })
}

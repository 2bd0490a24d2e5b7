use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span, warn};

use crate::analyzer::AnalyzerRegistry;
use crate::config::{ServerConfig, Transport};
use crate::lsp::diagnostics::DiagnosticsEngine;
use crate::lsp::dispatcher::Dispatcher;
use crate::lsp::handlers::routes;
use crate::lsp::session::{Session, SessionError, Termination};

/// Accepts connections and runs one independent session per connection
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    diagnostics: Arc<DiagnosticsEngine>,
}

impl Server {
    pub fn new(registry: AnalyzerRegistry) -> Self {
        Self {
            dispatcher: Arc::new(routes()),
            diagnostics: Arc::new(DiagnosticsEngine::new(registry)),
        }
    }

    /// Build a session over any duplex byte stream
    pub fn session<R, W>(&self, reader: R, writer: W) -> Session<R, W>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        Session::new(
            reader,
            writer,
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.diagnostics),
        )
    }

    /// Serve a single session over stdin/stdout
    pub async fn serve_stdio(&self) -> Result<Termination, SessionError> {
        info!("Serving over stdio");
        self.session(tokio::io::stdin(), tokio::io::stdout())
            .run()
            .await
    }

    /// Accept connections forever. Accept failures are logged and skipped.
    pub async fn serve_tcp(&self, listener: TcpListener) {
        if let Ok(addr) = listener.local_addr() {
            info!("Listening on {}", addr);
        }

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    info!("Client connected: {}", peer);
                    let (reader, writer) = tokio::io::split(stream);
                    self.spawn_session(reader, writer, peer);
                }
                Err(e) => {
                    warn!("Accept error: {}", e);
                }
            }
        }
    }

    /// Run a session on its own task
    pub fn spawn_session<R, W>(&self, reader: R, writer: W, peer: SocketAddr) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let session = self.session(reader, writer);
        tokio::spawn(
            async move {
                match session.run().await {
                    Ok(termination) => info!("Session ended: {:?}", termination),
                    Err(e) => error!("Session failed: {}", e),
                }
            }
            .instrument(info_span!("session", %peer)),
        )
    }
}

/// Run the server described by `config`. Returns the process exit code.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<i32> {
    info!("Starting syntax-lsp server");

    let server = Server::new(AnalyzerRegistry::with_builtin());

    let code = match config.transport {
        Transport::Stdio => {
            let termination = server.serve_stdio().await?;
            info!("Session ended: {:?}", termination);
            termination.exit_code()
        }
        Transport::Tcp(addr) => {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            server.serve_tcp(listener).await;
            0
        }
    };

    info!("syntax-lsp server stopped");
    Ok(code)
}

//! One connected peer: read, dispatch, write, strictly in sequence

use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info};

use crate::lsp::context::{SessionContext, SessionState};
use crate::lsp::diagnostics::DiagnosticsEngine;
use crate::lsp::dispatcher::Dispatcher;
use crate::rpc::{FramingError, MessageReader, MessageWriter};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Framing error, closing connection: {0}")]
    Framing(#[from] FramingError),
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// `exit` was received; `clean` when it followed `shutdown`
    Exit { clean: bool },
    /// The peer closed the stream between messages
    Disconnected,
}

impl Termination {
    /// Process exit code for a session that owned the process
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Exit { clean: true } => 0,
            _ => 1,
        }
    }
}

pub struct Session<R, W> {
    reader: MessageReader<R>,
    writer: MessageWriter<W>,
    context: SessionContext,
    dispatcher: Arc<Dispatcher>,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        reader: R,
        writer: W,
        dispatcher: Arc<Dispatcher>,
        diagnostics: Arc<DiagnosticsEngine>,
    ) -> Self {
        Self {
            reader: MessageReader::new(reader),
            writer: MessageWriter::new(writer),
            context: SessionContext::new(diagnostics),
            dispatcher,
        }
    }

    /// Run until `exit`, peer disconnect, or a framing failure.
    ///
    /// Each message is handled completely, replies included, before the next
    /// one is read.
    pub async fn run(mut self) -> Result<Termination, SessionError> {
        loop {
            let payload = match self.reader.read_message().await {
                Ok(Some(payload)) => payload,
                Ok(None) => {
                    info!("Peer closed the connection");
                    return Ok(Termination::Disconnected);
                }
                Err(e) => {
                    error!("Failed to read message: {}", e);
                    return Err(e.into());
                }
            };

            let outgoing = self.dispatcher.handle_payload(&mut self.context, &payload);
            for message in outgoing {
                let payload = message.encode();
                debug!(content = %String::from_utf8_lossy(&payload), "Sending message");
                self.writer.write_message(&payload).await.inspect_err(|e| {
                    error!("Failed to write message: {}", e);
                })?;
            }

            if self.context.state == SessionState::Terminated {
                return Ok(Termination::Exit {
                    clean: self.context.clean_exit,
                });
            }
        }
    }
}

use thiserror::Error;

use crate::rpc::message::Id;

/// Failure to delimit a message on the byte stream.
///
/// Once raised, the stream position can no longer be trusted and the
/// connection must be closed.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("I/O error on transport: {0}")]
    Io(#[from] std::io::Error),

    #[error("Header block is not valid ASCII")]
    InvalidHeader,

    #[error("Missing Content-Length header")]
    MissingContentLength,

    #[error("Invalid Content-Length value: {0}")]
    InvalidContentLength(String),

    #[error("Negative Content-Length: {0}")]
    NegativeContentLength(i64),

    #[error("Stream closed after {received} of {expected} body bytes")]
    UnexpectedEof { expected: usize, received: usize },

    #[error("Stream closed in the middle of a header block")]
    TruncatedHeader,
}

/// Failure to turn a payload into a message envelope.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid message: {reason}")]
    InvalidMessage { id: Option<Id>, reason: String },
}

impl ParseError {
    /// The request id, when the payload carried one we could recover.
    pub fn id(&self) -> Option<&Id> {
        match self {
            ParseError::Json(_) => None,
            ParseError::InvalidMessage { id, .. } => id.as_ref(),
        }
    }
}

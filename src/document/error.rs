use thiserror::Error;
use tower_lsp::lsp_types::{Position, Url};

#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("Document was never opened: {0}")]
    UnknownDocument(Url),

    #[error("Stale version for {uri}: incoming {incoming} is older than current {current}")]
    StaleVersion {
        uri: Url,
        current: i32,
        incoming: i32,
    },

    #[error("Edit range starts after it ends: {start:?} > {end:?}")]
    InvalidRange { start: Position, end: Position },
}

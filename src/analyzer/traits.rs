use tower_lsp::lsp_types::Position;

use crate::analyzer::error::AnalyzerError;

/// A syntax error reported by an analyzer
///
/// Positions are zero-based; `character` counts UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    pub start: Position,
    pub end: Position,
    /// Source text covered by the node
    pub text: String,
}

/// Result of parsing a document
#[cfg_attr(test, mockall::automock)]
pub trait SyntaxTree {
    /// All syntax-error nodes, in document order
    fn error_nodes(&self) -> Vec<ErrorNode>;
}

/// Parses text of one language
#[cfg_attr(test, mockall::automock)]
pub trait SyntaxAnalyzer: Send + Sync {
    fn parse(&self, text: &str) -> Result<Box<dyn SyntaxTree>, AnalyzerError>;
}

//! Syntax analyzer layer
//! - traits.rs: SyntaxAnalyzer / SyntaxTree capability
//! - treesitter.rs: tree-sitter backed analyzer
//! - registry.rs: analyzers keyed by languageId
//! - error.rs: AnalyzerError

pub mod error;
pub mod registry;
pub mod traits;
pub mod treesitter;

pub use error::AnalyzerError;
pub use registry::AnalyzerRegistry;
pub use traits::{ErrorNode, SyntaxAnalyzer, SyntaxTree};
pub use treesitter::TreeSitterAnalyzer;

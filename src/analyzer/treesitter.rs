//! tree-sitter backed syntax analyzer

use tower_lsp::lsp_types::Position;
use tracing::warn;
use tree_sitter::{Language, Node, Point, Tree};

use crate::analyzer::error::AnalyzerError;
use crate::analyzer::traits::{ErrorNode, SyntaxAnalyzer, SyntaxTree};
use crate::document::text::{byte_to_utf16, line_at};

/// Analyzer for one tree-sitter grammar
pub struct TreeSitterAnalyzer {
    name: &'static str,
    language: Language,
}

impl TreeSitterAnalyzer {
    pub fn new(name: &'static str, language: Language) -> Self {
        Self { name, language }
    }

    pub fn python() -> Self {
        Self::new("python", tree_sitter_python::LANGUAGE.into())
    }

    pub fn json() -> Self {
        Self::new("json", tree_sitter_json::LANGUAGE.into())
    }

    pub fn yaml() -> Self {
        Self::new("yaml", tree_sitter_yaml::LANGUAGE.into())
    }

    pub fn toml() -> Self {
        Self::new("toml", tree_sitter_toml_ng::LANGUAGE.into())
    }
}

impl SyntaxAnalyzer for TreeSitterAnalyzer {
    fn parse(&self, text: &str) -> Result<Box<dyn SyntaxTree>, AnalyzerError> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&self.language).map_err(|e| {
            warn!("Failed to set {} language for tree-sitter: {}", self.name, e);
            AnalyzerError::TreeSitter(e.to_string())
        })?;

        let tree = parser.parse(text, None).ok_or_else(|| {
            warn!("Failed to parse {} content", self.name);
            AnalyzerError::ParseFailed(format!("Failed to parse {}", self.name))
        })?;

        Ok(Box::new(TreeSitterTree {
            tree,
            text: text.to_string(),
        }))
    }
}

struct TreeSitterTree {
    tree: Tree,
    text: String,
}

impl SyntaxTree for TreeSitterTree {
    fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut nodes = Vec::new();
        self.collect_errors(self.tree.root_node(), &mut nodes);
        nodes
    }
}

impl TreeSitterTree {
    /// Collect ERROR and MISSING nodes. An ERROR node is reported once,
    /// without the errors nested inside it.
    fn collect_errors(&self, node: Node, nodes: &mut Vec<ErrorNode>) {
        if node.is_error() || node.is_missing() {
            nodes.push(ErrorNode {
                start: self.position(node.start_position()),
                end: self.position(node.end_position()),
                text: self.text.get(node.byte_range()).unwrap_or_default().to_string(),
            });
            return;
        }

        if !node.has_error() {
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_errors(child, nodes);
        }
    }

    /// tree-sitter columns are bytes; the protocol wants UTF-16 units.
    fn position(&self, point: Point) -> Position {
        let line = line_at(&self.text, point.row);
        Position::new(point.row as u32, byte_to_utf16(line, point.column))
    }
}

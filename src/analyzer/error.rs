use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("No syntax analyzer registered for language: {0}")]
    UnsupportedLanguage(String),

    #[error("tree-sitter error: {0}")]
    TreeSitter(String),

    #[error("Parse failed: {0}")]
    ParseFailed(String),
}

//! Syntax analyzers keyed by languageId

use std::collections::HashMap;
use std::sync::Arc;

use crate::analyzer::error::AnalyzerError;
use crate::analyzer::traits::SyntaxAnalyzer;
use crate::analyzer::treesitter::TreeSitterAnalyzer;

#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Arc<dyn SyntaxAnalyzer>>,
}

impl AnalyzerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tree-sitter language
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("python", TreeSitterAnalyzer::python());
        registry.register("json", TreeSitterAnalyzer::json());
        registry.register("yaml", TreeSitterAnalyzer::yaml());
        registry.register("toml", TreeSitterAnalyzer::toml());
        registry
    }

    pub fn register(&mut self, language_id: impl Into<String>, analyzer: impl SyntaxAnalyzer + 'static) {
        self.analyzers.insert(language_id.into(), Arc::new(analyzer));
    }

    pub fn get(&self, language_id: &str) -> Result<Arc<dyn SyntaxAnalyzer>, AnalyzerError> {
        self.analyzers
            .get(language_id)
            .cloned()
            .ok_or_else(|| AnalyzerError::UnsupportedLanguage(language_id.to_string()))
    }

    /// Registered language ids, sorted
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.analyzers.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_builtin_registers_all_languages() {
        let registry = AnalyzerRegistry::with_builtin();
        assert_eq!(registry.languages(), vec!["json", "python", "toml", "yaml"]);
    }

    #[test]
    fn get_fails_for_unknown_language() {
        let registry = AnalyzerRegistry::with_builtin();

        let err = registry.get("cobol").err().unwrap();

        assert!(matches!(err, AnalyzerError::UnsupportedLanguage(id) if id == "cobol"));
    }
}

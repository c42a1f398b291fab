//! Language analyzer trait definition

use anyhow::Result;
use forai_core::{Language, RawAnalysis};
use std::path::Path;

use crate::languages;

/// Trait for language-specific symbol extraction. Implementations produce
/// a normalized record of definitions, imports, and exported names; how a
/// language arrives at that record is its own business.
pub trait LanguageAnalyzer: Send + Sync {
    /// Extract definitions, imports, and exports from source content.
    fn analyze(&self, path: &Path, content: &str) -> Result<RawAnalysis>;
}

/// Get the analyzer for a language.
pub fn analyzer_for(language: Language) -> Box<dyn LanguageAnalyzer> {
    match language {
        Language::Python => Box::new(languages::python::PythonAnalyzer),
        Language::JavaScript => Box::new(languages::javascript::JavaScriptAnalyzer),
        Language::Php => Box::new(languages::php::PhpAnalyzer),
        Language::Other => Box::new(languages::generic::GenericAnalyzer),
    }
}

//! Fallback analyzer for unsupported languages

use anyhow::Result;
use forai_core::RawAnalysis;
use std::path::Path;

use crate::analyzer::LanguageAnalyzer;

/// Produces an empty analysis: the file still gets a registered id and a
/// header, just with no symbols.
pub struct GenericAnalyzer;

impl LanguageAnalyzer for GenericAnalyzer {
    fn analyze(&self, _path: &Path, _content: &str) -> Result<RawAnalysis> {
        Ok(RawAnalysis::default())
    }
}

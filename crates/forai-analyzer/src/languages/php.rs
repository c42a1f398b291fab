//! Best-effort PHP analyzer using regular expressions.
//!
//! PHP gets no tree-sitter grammar here; classes, functions, and includes
//! are recognized syntactically, which covers header generation for
//! typical files.

use anyhow::Result;
use forai_core::{RawAnalysis, RawDefinition, RawImport, SymbolKind};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::analyzer::LanguageAnalyzer;

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?:abstract\s+|final\s+)?class\s+(\w+)(?:\s+extends\s+([\w\\]+))?(?:\s+implements\s+([\w\\,\s]+))?",
    )
    .expect("class regex")
});

static FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*function\s+(\w+)\s*\(").expect("function regex"));

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:require|include)(?:_once)?\s*\(?\s*['"]([^'"]+)['"]"#).expect("include regex")
});

static USE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*use\s+([\w\\]+)\s*;").expect("use regex"));

pub struct PhpAnalyzer;

impl LanguageAnalyzer for PhpAnalyzer {
    fn analyze(&self, _path: &Path, content: &str) -> Result<RawAnalysis> {
        let mut out = RawAnalysis::default();

        for caps in CLASS_RE.captures_iter(content) {
            let name = caps[1].to_string();
            let mut def = RawDefinition::new(name.clone(), SymbolKind::Class);
            if let Some(parent) = caps.get(2) {
                def.parents.push(last_segment(parent.as_str()).to_string());
            }
            if let Some(interfaces) = caps.get(3) {
                for iface in interfaces.as_str().split(',') {
                    let iface = iface.trim();
                    if !iface.is_empty() {
                        def.parents.push(last_segment(iface).to_string());
                    }
                }
            }
            out.definitions.push(def);
            out.exports.push(name);
        }

        for caps in FUNCTION_RE.captures_iter(content) {
            let name = caps[1].to_string();
            out.definitions
                .push(RawDefinition::new(name.clone(), SymbolKind::Function));
            out.exports.push(name);
        }

        for caps in INCLUDE_RE.captures_iter(content) {
            let target = caps[1].to_string();
            let module = match target.rsplit_once('.') {
                Some((stem, "php")) => stem.to_string(),
                _ => target,
            };
            out.imports.push(RawImport {
                module,
                symbol: "*".to_string(),
            });
        }

        for caps in USE_RE.captures_iter(content) {
            // `use Vendor\Pkg\ClassName;` — the path names the module, the
            // last segment the symbol.
            let full = caps[1].replace('\\', "/");
            match full.rsplit_once('/') {
                Some((module, symbol)) => out.imports.push(RawImport {
                    module: module.to_string(),
                    symbol: symbol.to_string(),
                }),
                None => out.imports.push(RawImport {
                    module: full,
                    symbol: "*".to_string(),
                }),
            }
        }

        Ok(out)
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

//! Query surface over the registry and committed headers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::header;
use crate::model::{FileId, SymbolId, SymbolTarget};
use crate::registry::SymbolRegistry;

/// Where a symbol is defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLocation {
    pub file_id: FileId,
    pub file_path: PathBuf,
    pub symbol_id: SymbolId,
}

/// Read-only lookups for external tooling: definition sites, per-file
/// symbol maps, and reverse import searches.
pub struct QueryEngine<'a> {
    registry: &'a SymbolRegistry,
}

impl<'a> QueryEngine<'a> {
    pub fn new(registry: &'a SymbolRegistry) -> Self {
        QueryEngine { registry }
    }

    /// Find where a symbol name is defined (first match across all files).
    pub fn find_definition(&self, symbol_name: &str) -> Option<SymbolLocation> {
        let root = self.registry.workspace_root();
        for (file_id, rel_path) in self.registry.files() {
            if let Some(symbol_id) = self.registry.symbol_in_file(file_id, symbol_name) {
                return Some(SymbolLocation {
                    file_id,
                    file_path: root.join(rel_path),
                    symbol_id,
                });
            }
        }
        None
    }

    /// All symbols defined in a file, by name.
    pub fn file_symbols(&self, path: &Path) -> Option<(FileId, BTreeMap<String, SymbolId>)> {
        let root = self.registry.workspace_root();
        let rel = path.strip_prefix(root).unwrap_or(path);
        let rel = rel.to_string_lossy().replace('\\', "/");
        for (file_id, known) in self.registry.files() {
            if known == rel {
                return Some((file_id, self.registry.symbols_of(file_id)));
            }
        }
        None
    }

    /// Files whose committed header imports the given symbol, either
    /// directly (`F<n>:C<m>`) or through a whole-file wildcard (`F<n>:*`).
    pub fn usages(&self, symbol_name: &str) -> Vec<(FileId, PathBuf)> {
        let Some(def) = self.find_definition(symbol_name) else {
            return Vec::new();
        };

        let root = self.registry.workspace_root();
        let mut out = Vec::new();
        for (file_id, rel_path) in self.registry.files() {
            let path = root.join(&rel_path);
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Some(analysis) = header::decode_file(&content) else {
                continue;
            };
            let uses = analysis.imports.iter().any(|imp| {
                imp.file == def.file_id
                    && match imp.symbol {
                        SymbolTarget::Named(id) => id == def.symbol_id,
                        SymbolTarget::Wildcard | SymbolTarget::Pending => true,
                    }
            });
            if uses {
                out.push((file_id, path));
            }
        }
        out
    }

    /// Every symbol in the workspace, mapped to its definition site.
    pub fn all_symbols(&self) -> BTreeMap<String, (FileId, SymbolId)> {
        let mut out = BTreeMap::new();
        for (file_id, _) in self.registry.files() {
            for (name, symbol_id) in self.registry.symbols_of(file_id) {
                out.insert(name, (file_id, symbol_id));
            }
        }
        out
    }

    /// The raw committed header of a file, if present.
    pub fn file_header(&self, path: &Path) -> Option<String> {
        let content = std::fs::read_to_string(path).ok()?;
        header::extract(&content).map(|h| h.to_string())
    }
}

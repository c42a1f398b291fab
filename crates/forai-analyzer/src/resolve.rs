//! Resolution of raw analyzer output against the identity registry.
//!
//! Mints symbol ids, links imports and parent classes to registered
//! files, and maps exported names to symbol ids. Linkage is best-effort
//! and syntactic: an unresolvable reference degrades to a bare name or a
//! pending/wildcard reference, never a failure.

use std::path::Path;

use anyhow::Result;
use forai_core::{
    Definition, FileAnalysis, FileId, Language, ParentRef, RawAnalysis, SymbolRegistry,
    SymbolTarget,
};

/// Turn a raw analyzer record into the analysis a header serializes,
/// allocating registry ids along the way.
pub fn resolve(
    registry: &SymbolRegistry,
    path: &Path,
    language: Language,
    raw: RawAnalysis,
) -> Result<FileAnalysis> {
    let file_id = registry.file_id_for(path)?;

    let mut imports = Vec::new();
    for imp in &raw.imports {
        if let Some(reference) = registry.resolve_import(&imp.module, &imp.symbol) {
            imports.push(reference);
        }
    }

    // Names this file imports, for linking parents like `class Admin(User)`
    // where `User` came in through an import.
    let imported_from: std::collections::HashMap<&str, &str> = raw
        .imports
        .iter()
        .filter(|imp| imp.symbol != "*")
        .map(|imp| (imp.symbol.as_str(), imp.module.as_str()))
        .collect();

    let mut definitions = Vec::new();
    for def in &raw.definitions {
        let symbol_id = registry.symbol_id_for(file_id, &def.name, def.kind)?;
        let parents = def
            .parents
            .iter()
            .map(|parent| resolve_parent(registry, file_id, parent, &imported_from))
            .collect();
        definitions.push(Definition {
            id: symbol_id,
            name: def.name.clone(),
            parents,
        });
    }

    // Exports are the subset of this file's definitions; names that match
    // nothing (e.g. a re-exported import) are dropped.
    let mut exports = Vec::new();
    for name in &raw.exports {
        if let Some(def) = definitions.iter().find(|d| &d.name == name) {
            if !exports.contains(&def.id) {
                exports.push(def.id);
            }
        }
    }

    Ok(FileAnalysis {
        file_id,
        language,
        definitions,
        imports,
        exports,
    })
}

/// A single-segment parent is looked up among this file's own symbols,
/// then among its imports; a dotted parent is resolved as `module.Name`
/// through the registry. Either way, failure keeps the bare name so a
/// later pass can resolve it.
fn resolve_parent(
    registry: &SymbolRegistry,
    file_id: FileId,
    parent: &str,
    imported_from: &std::collections::HashMap<&str, &str>,
) -> ParentRef {
    match parent.rsplit_once('.') {
        None => {
            if let Some(id) = registry.symbol_in_file(file_id, parent) {
                return ParentRef::Local(id);
            }
            if let Some(module) = imported_from.get(parent) {
                if let Some(reference) = registry.resolve_import(module, parent) {
                    if matches!(reference.symbol, SymbolTarget::Named(_)) {
                        return ParentRef::Remote(reference);
                    }
                }
            }
            ParentRef::Name(parent.to_string())
        }
        Some((module, name)) => match registry.resolve_import(module, name) {
            Some(reference) if matches!(reference.symbol, SymbolTarget::Named(_)) => {
                ParentRef::Remote(reference)
            }
            _ => ParentRef::Name(parent.to_string()),
        },
    }
}

//! JavaScript analyzer using tree-sitter

use anyhow::{Context, Result};
use forai_core::{RawAnalysis, RawDefinition, RawImport, SymbolKind};
use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::analyzer::LanguageAnalyzer;

pub struct JavaScriptAnalyzer;

impl LanguageAnalyzer for JavaScriptAnalyzer {
    fn analyze(&self, path: &Path, content: &str) -> Result<RawAnalysis> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .context("Failed to load JavaScript grammar")?;
        let tree = parser
            .parse(content, None)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let mut out = Collector::default();
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            out.top_level(child, content.as_bytes(), false);
        }
        Ok(out.finish())
    }
}

#[derive(Default)]
struct Collector {
    definitions: Vec<RawDefinition>,
    imports: Vec<RawImport>,
    explicit_exports: Vec<String>,
    has_exports: bool,
}

impl Collector {
    fn top_level(&mut self, node: Node, source: &[u8], exported: bool) {
        match node.kind() {
            "import_statement" => self.import_statement(node, source),
            "export_statement" => self.export_statement(node, source),
            "class_declaration" => {
                if let Some(name) = self.class(node, source) {
                    if exported {
                        self.mark_export(&name);
                    }
                }
            }
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = field_text(node, "name", source) {
                    self.definitions
                        .push(RawDefinition::new(name.clone(), SymbolKind::Function));
                    if exported {
                        self.mark_export(&name);
                    }
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = node.walk();
                for declarator in node.named_children(&mut cursor) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let Some(name) = field_text(declarator, "name", source) else {
                        continue;
                    };
                    self.definitions
                        .push(RawDefinition::new(name.clone(), SymbolKind::Variable));
                    if exported {
                        self.mark_export(&name);
                    }
                }
            }
            _ => {}
        }
    }

    fn class(&mut self, node: Node, source: &[u8]) -> Option<String> {
        let name = field_text(node, "name", source)?;
        let mut def = RawDefinition::new(name.clone(), SymbolKind::Class);
        // `class X extends Y` — the heritage clause holds the parent.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "class_heritage" {
                let mut inner = child.walk();
                for expr in child.named_children(&mut inner) {
                    if matches!(expr.kind(), "identifier" | "member_expression") {
                        if let Ok(text) = expr.utf8_text(source) {
                            def.parents.push(text.to_string());
                        }
                    }
                }
            }
        }
        self.definitions.push(def);
        Some(name)
    }

    fn import_statement(&mut self, node: Node, source: &[u8]) {
        let Some(module) = field_text(node, "source", source) else {
            return;
        };
        let module = normalize_module(&module);

        let mut named_symbols = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut inner = child.walk();
            for part in child.named_children(&mut inner) {
                match part.kind() {
                    // Default and namespace imports pull the whole module.
                    "identifier" | "namespace_import" => named_symbols.push("*".to_string()),
                    "named_imports" => {
                        let mut specs = part.walk();
                        for spec in part.named_children(&mut specs) {
                            if spec.kind() == "import_specifier" {
                                if let Some(name) = field_text(spec, "name", source) {
                                    named_symbols.push(name);
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        if named_symbols.is_empty() {
            // Bare `import './x'` side-effect import.
            named_symbols.push("*".to_string());
        }
        for symbol in named_symbols {
            self.imports.push(RawImport {
                module: module.clone(),
                symbol,
            });
        }
    }

    fn export_statement(&mut self, node: Node, source: &[u8]) {
        self.has_exports = true;
        if let Some(declaration) = node.child_by_field_name("declaration") {
            self.top_level(declaration, source, true);
            return;
        }
        // `export { a, b as c }`
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "export_clause" {
                let mut specs = child.walk();
                for spec in child.named_children(&mut specs) {
                    if spec.kind() == "export_specifier" {
                        if let Some(name) = field_text(spec, "name", source) {
                            self.mark_export(&name);
                        }
                    }
                }
            }
        }
    }

    fn mark_export(&mut self, name: &str) {
        if !self.explicit_exports.iter().any(|e| e == name) {
            self.explicit_exports.push(name.to_string());
        }
    }

    fn finish(self) -> RawAnalysis {
        let exports = if self.has_exports {
            self.explicit_exports
        } else {
            // Script without export statements: every public name.
            self.definitions
                .iter()
                .filter(|d| !d.name.starts_with('_'))
                .map(|d| d.name.clone())
                .collect()
        };
        RawAnalysis {
            definitions: self.definitions,
            imports: self.imports,
            exports,
        }
    }
}

fn normalize_module(raw: &str) -> String {
    let trimmed = raw.trim_matches(['"', '\'']);
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    match trimmed.rsplit_once('.') {
        Some((stem, ext)) if matches!(ext, "js" | "mjs" | "cjs") => stem.to_string(),
        _ => trimmed.to_string(),
    }
}

fn field_text(node: Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)?
        .utf8_text(source)
        .ok()
        .map(str::to_string)
}

//! Python analyzer using tree-sitter

use anyhow::{Context, Result};
use forai_core::{RawAnalysis, RawDefinition, RawImport, SymbolKind};
use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::analyzer::LanguageAnalyzer;

pub struct PythonAnalyzer;

impl LanguageAnalyzer for PythonAnalyzer {
    fn analyze(&self, path: &Path, content: &str) -> Result<RawAnalysis> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .context("Failed to load Python grammar")?;
        let tree = parser
            .parse(content, None)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let mut out = Collector::default();
        visit(tree.root_node(), content.as_bytes(), &mut out);

        // Module-level assignments only; nested ones are locals.
        let mut cursor = tree.root_node().walk();
        for child in tree.root_node().children(&mut cursor) {
            if child.kind() == "expression_statement" {
                if let Some(assign) = child.named_child(0).filter(|n| n.kind() == "assignment") {
                    out.assignment(assign, content.as_bytes());
                }
            }
        }

        Ok(out.finish())
    }
}

#[derive(Default)]
struct Collector {
    definitions: Vec<RawDefinition>,
    imports: Vec<RawImport>,
    exports: Vec<String>,
    dunder_all: Option<Vec<String>>,
}

fn visit(node: Node, source: &[u8], out: &mut Collector) {
    match node.kind() {
        "class_definition" => out.class(node, source),
        "function_definition" => out.function(node, source),
        "import_statement" => out.import_statement(node, source),
        "import_from_statement" => out.import_from(node, source),
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, source, out);
    }
}

impl Collector {
    fn class(&mut self, node: Node, source: &[u8]) {
        let Some(name) = field_text(node, "name", source) else {
            return;
        };
        let mut def = RawDefinition::new(name.clone(), SymbolKind::Class);
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                match base.kind() {
                    "identifier" | "attribute" => {
                        if let Ok(text) = base.utf8_text(source) {
                            def.parents.push(text.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
        self.definitions.push(def);
        self.export(&name);
    }

    fn function(&mut self, node: Node, source: &[u8]) {
        let Some(name) = field_text(node, "name", source) else {
            return;
        };
        self.definitions
            .push(RawDefinition::new(name.clone(), SymbolKind::Function));
        self.export(&name);
    }

    fn import_statement(&mut self, node: Node, source: &[u8]) {
        // `import a.b` / `import a.b as c`: whole-module imports.
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let module = match child.kind() {
                "dotted_name" => child.utf8_text(source).ok().map(str::to_string),
                "aliased_import" => field_text(child, "name", source),
                _ => None,
            };
            if let Some(module) = module {
                self.imports.push(RawImport {
                    module,
                    symbol: "*".to_string(),
                });
            }
        }
    }

    fn import_from(&mut self, node: Node, source: &[u8]) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };
        let module = match module_node.kind() {
            "dotted_name" => module_node.utf8_text(source).ok().map(str::to_string),
            // `from .user import X`: the dots are dropped and the trailing
            // path kept. A bare `from . import x` has no path to resolve.
            "relative_import" => {
                let mut cursor = module_node.walk();
                module_node
                    .named_children(&mut cursor)
                    .find(|n| n.kind() == "dotted_name")
                    .and_then(|n| n.utf8_text(source).ok())
                    .map(str::to_string)
            }
            _ => None,
        };
        let Some(module) = module else {
            return;
        };

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.id() == module_node.id() {
                continue;
            }
            let symbol = match child.kind() {
                "dotted_name" => child.utf8_text(source).ok().map(str::to_string),
                "aliased_import" => field_text(child, "name", source),
                "wildcard_import" => Some("*".to_string()),
                _ => None,
            };
            if let Some(symbol) = symbol {
                self.imports.push(RawImport {
                    module: module.to_string(),
                    symbol,
                });
            }
        }
    }

    fn assignment(&mut self, node: Node, source: &[u8]) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let Ok(name) = left.utf8_text(source) else {
            return;
        };

        if name == "__all__" {
            self.dunder_all = Some(self.string_list(node, source));
            return;
        }
        if name.starts_with('_') {
            return;
        }
        // Re-assignment of an already recorded name is not a new symbol.
        if self.definitions.iter().any(|d| d.name == name) {
            return;
        }
        self.definitions
            .push(RawDefinition::new(name, SymbolKind::Variable));
        self.export(name);
    }

    fn string_list(&self, node: Node, source: &[u8]) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(right) = node.child_by_field_name("right") {
            if right.kind() == "list" {
                let mut cursor = right.walk();
                for element in right.named_children(&mut cursor) {
                    if element.kind() == "string" {
                        if let Ok(text) = element.utf8_text(source) {
                            names.push(text.trim_matches(['"', '\'']).to_string());
                        }
                    }
                }
            }
        }
        names
    }

    fn export(&mut self, name: &str) {
        if !name.starts_with('_') && !self.exports.iter().any(|e| e == name) {
            self.exports.push(name.to_string());
        }
    }

    fn finish(self) -> RawAnalysis {
        let exports = match self.dunder_all {
            // `__all__` overrides the underscore heuristic.
            Some(all) => all,
            None => self.exports,
        };
        RawAnalysis {
            definitions: self.definitions,
            imports: self.imports,
            exports,
        }
    }
}

fn field_text(node: Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)?
        .utf8_text(source)
        .ok()
        .map(str::to_string)
}

//! Dependency tracker: a file-level import graph derived from committed
//! headers, and single-hop regeneration of dependents.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::header;
use crate::model::{FileId, SymbolRef};
use crate::registry::SymbolRegistry;

/// Directed graph of file-level imports. Derived, never persisted: always
/// rebuilt fresh from on-disk headers so it reflects current truth.
pub struct DependencyGraph {
    inner: StableDiGraph<FileId, ()>,
    index: HashMap<FileId, NodeIndex>,
}

impl DependencyGraph {
    fn new() -> Self {
        DependencyGraph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }

    fn node(&mut self, file: FileId) -> NodeIndex {
        match self.index.get(&file) {
            Some(&idx) => idx,
            None => {
                let idx = self.inner.add_node(file);
                self.index.insert(file, idx);
                idx
            }
        }
    }

    fn add_import(&mut self, from: FileId, to: FileId) {
        // Self-references are excluded from the graph.
        if from == to {
            return;
        }
        let a = self.node(from);
        let b = self.node(to);
        if !self.inner.contains_edge(a, b) {
            self.inner.add_edge(a, b, ());
        }
    }

    /// Files this file imports from.
    pub fn imports_of(&self, file: FileId) -> Vec<FileId> {
        self.neighbors(file, Direction::Outgoing)
    }

    /// Files that import from this file (one hop only).
    pub fn dependents_of(&self, file: FileId) -> Vec<FileId> {
        self.neighbors(file, Direction::Incoming)
    }

    fn neighbors(&self, file: FileId, dir: Direction) -> Vec<FileId> {
        let Some(&idx) = self.index.get(&file) else {
            return Vec::new();
        };
        let mut out: Vec<FileId> = self
            .inner
            .neighbors_directed(idx, dir)
            .filter_map(|n| self.inner.node_weight(n).copied())
            .collect();
        out.sort();
        out
    }

    /// The graph as a `file_id -> imported file_ids` map.
    pub fn as_map(&self) -> BTreeMap<FileId, Vec<FileId>> {
        self.index
            .keys()
            .map(|&file| (file, self.imports_of(file)))
            .collect()
    }
}

/// Builds dependency graphs from committed headers and regenerates direct
/// dependents after an interface change.
pub struct DependencyTracker<'a> {
    registry: &'a SymbolRegistry,
}

impl<'a> DependencyTracker<'a> {
    pub fn new(registry: &'a SymbolRegistry) -> Self {
        DependencyTracker { registry }
    }

    /// Build the import graph for every registered file that exists on
    /// disk and carries a decodable header. Never cached across calls.
    pub fn build_graph(&self) -> DependencyGraph {
        tracing::debug!("Building dependency graph");
        let mut graph = DependencyGraph::new();
        let root = self.registry.workspace_root();

        for (file_id, rel_path) in self.registry.files() {
            let path = root.join(&rel_path);
            if !path.exists() {
                continue;
            }
            graph.node(file_id);
            for import in self.header_imports(&path) {
                graph.add_import(file_id, import.file);
            }
        }
        graph
    }

    /// Files that directly import from `file`. One hop only; no transitive
    /// closure.
    pub fn direct_dependents(&self, file: FileId) -> Vec<FileId> {
        self.build_graph().dependents_of(file)
    }

    /// Import references from a file's committed header. Unreadable files
    /// and missing or malformed headers yield an empty list.
    pub fn header_imports(&self, path: &Path) -> Vec<SymbolRef> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                return Vec::new();
            }
        };
        header::decode_file(&content)
            .map(|a| a.imports)
            .unwrap_or_default()
    }

    /// Regenerate the header of every direct dependent of `changed` by
    /// calling `regenerate` with its path. Single-hop: a dependent whose
    /// own imports change as a result does not recursively cascade here —
    /// the caller decides whether to propagate again. A failed dependent is
    /// logged and skipped; it never aborts the others.
    pub fn propagate<F>(&self, changed: FileId, mut regenerate: F) -> Vec<FileId>
    where
        F: FnMut(&Path) -> anyhow::Result<()>,
    {
        tracing::info!("Updating dependents of {}", changed);
        let mut touched = Vec::new();
        for dependent in self.direct_dependents(changed) {
            let Some(path) = self.registry.path_of(dependent) else {
                continue;
            };
            if !path.exists() {
                continue;
            }
            tracing::info!("Regenerating header for {}", path.display());
            match regenerate(&path) {
                Ok(()) => touched.push(dependent),
                Err(e) => {
                    tracing::warn!("Failed to regenerate {}: {e:#}", path.display());
                }
            }
        }
        touched
    }
}

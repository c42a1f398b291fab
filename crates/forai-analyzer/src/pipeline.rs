//! Update pipeline: analyze → allocate ids → encode → write → cascade.
//!
//! One instance per workspace, shared across workers. The registry
//! serializes its own mutation internally; file rewrites are per-file and
//! owned by whichever caller holds the path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use ignore::WalkBuilder;

use forai_core::{
    DependencyTracker, FileAnalysis, FileId, Language, SymbolRegistry, header,
};

use crate::analyzer::analyzer_for;
use crate::resolve;

/// Result of updating one file's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub file_id: FileId,
    /// Whether the committed import set changed (the cascade trigger).
    pub imports_changed: bool,
}

pub struct UpdatePipeline {
    registry: Arc<SymbolRegistry>,
    runtime: bool,
}

impl UpdatePipeline {
    pub fn new(registry: Arc<SymbolRegistry>) -> Self {
        UpdatePipeline {
            registry,
            runtime: false,
        }
    }

    /// Enable the runtime-introspection option. Observed runtime
    /// information is logged for diagnostics only; it is never merged into
    /// the written header.
    pub fn with_runtime(mut self, enabled: bool) -> Self {
        self.runtime = enabled;
        self
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    /// Analyze a file and resolve it into a header-ready record.
    ///
    /// The committed header line is stripped before analysis: it is not
    /// valid source in any supported language, and feeding it to a parser
    /// mints phantom symbols and perturbs the import set on re-analysis.
    pub fn analyze_file(&self, path: &Path) -> Result<FileAnalysis> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let content = strip_header(&content);
        let language = Language::detect(path, &content);
        let raw = analyzer_for(language).analyze(path, &content)?;
        if self.runtime {
            tracing::debug!(
                "Runtime introspection requested for {}; observations are not merged into the header",
                path.display()
            );
        }
        let analysis = resolve::resolve(&self.registry, path, language, raw)?;
        Ok(analysis)
    }

    /// Regenerate one file's header in place and report whether its import
    /// set changed. Does not cascade.
    pub fn update_file(&self, path: &Path) -> Result<UpdateOutcome> {
        tracing::info!("Analyzing file: {}", path.display());

        // Capture the committed import set before rewriting.
        let tracker = DependencyTracker::new(&self.registry);
        let previous: std::collections::BTreeSet<String> = tracker
            .header_imports(path)
            .iter()
            .map(|i| i.token())
            .collect();

        let analysis = self.analyze_file(path)?;
        self.write_header(path, &analysis)?;

        Ok(UpdateOutcome {
            file_id: analysis.file_id,
            imports_changed: previous != analysis.import_set(),
        })
    }

    /// Update a file and, if its import set changed, regenerate the
    /// headers of its direct dependents (one hop).
    pub fn update_with_cascade(&self, path: &Path) -> Result<UpdateOutcome> {
        let outcome = self.update_file(path)?;
        if outcome.imports_changed {
            self.update_dependents(outcome.file_id);
        }
        Ok(outcome)
    }

    /// Re-analyze and rewrite every direct dependent of a file. Single-hop;
    /// dependents whose own imports change do not recursively cascade.
    pub fn update_dependents(&self, changed: FileId) -> Vec<FileId> {
        let tracker = DependencyTracker::new(&self.registry);
        tracker.propagate(changed, |path| {
            let analysis = self.analyze_file(path)?;
            self.write_header(path, &analysis)
        })
    }

    /// Handle a file rename: carry the id over, refresh the renamed file's
    /// header, and regenerate dependents (their `IMP[]` entries keep
    /// pointing at the same id, but their analyses may re-resolve).
    pub fn rename(&self, old_path: &Path, new_path: &Path) -> Result<UpdateOutcome> {
        let file_id = self.registry.rename(old_path, new_path)?;
        let outcome = self.update_file(new_path)?;
        self.update_dependents(file_id);
        Ok(outcome)
    }

    /// Update every supported source file under the workspace root.
    /// Per-file failures are logged and counted, never fatal to the batch.
    pub fn update_all(&self) -> BatchReport {
        let files = self.source_files();
        let total = files.len();
        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };
        for path in files {
            match self.update_file(&path) {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    tracing::error!("Failed to update {}: {e:#}", path.display());
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Supported source files in the workspace, gitignore-aware.
    pub fn source_files(&self) -> Vec<PathBuf> {
        let root = self.registry.workspace_root();
        let mut files = Vec::new();
        for entry in WalkBuilder::new(root).hidden(true).build() {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|t| t.is_file()) {
                        continue;
                    }
                    let path = entry.path();
                    if Language::from_path(path) != Language::Other {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => tracing::warn!("Failed to read entry: {e}"),
            }
        }
        files.sort();
        files
    }

    fn write_header(&self, path: &Path, analysis: &FileAnalysis) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let header_text = header::encode(analysis);
        let updated = header::locate_or_insert(&content, &header_text, analysis.language);
        if updated != content {
            std::fs::write(path, updated)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Ok(())
    }
}

/// Remove the committed header line (and its trailing newline) from file
/// content, leaving the surrounding source untouched.
fn strip_header(content: &str) -> std::borrow::Cow<'_, str> {
    match header::locate(content) {
        Some((range, _)) => {
            let mut stripped = String::with_capacity(content.len());
            stripped.push_str(&content[..range.start]);
            let rest = &content[range.end..];
            stripped.push_str(rest.strip_prefix('\n').unwrap_or(rest));
            std::borrow::Cow::Owned(stripped)
        }
        None => std::borrow::Cow::Borrowed(content),
    }
}

/// Summary of a batch update run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub updated: usize,
    pub failed: usize,
}

//! Identity registry: stable file and symbol ids, persisted per workspace.
//!
//! Every mutating call rewrites the full registry state to
//! `.forai/registry.json` before returning. Mutation is guarded by an
//! internal mutex; the registry itself does not serialize concurrent
//! *processes* (single-writer assumption).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::{FileId, IdSpace, SymbolId, SymbolKind, SymbolRef};
use crate::workspace;

/// File ids start here; `F0` stays reserved for degraded decodes.
const FIRST_FILE_ID: u32 = 101;

/// Per-file registry entry. `path` is the only field a rename touches;
/// symbol entries are never deleted or renumbered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    #[serde(default)]
    pub symbols: BTreeMap<String, SymbolId>,
    #[serde(default = "one")]
    pub next_class_id: u32,
    #[serde(default = "one")]
    pub next_func_id: u32,
}

fn one() -> u32 {
    1
}

impl FileRecord {
    fn new(path: String) -> Self {
        FileRecord {
            path,
            symbols: BTreeMap::new(),
            next_class_id: 1,
            next_func_id: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryState {
    files: BTreeMap<FileId, FileRecord>,
    next_file_id: u32,
    file_paths: BTreeMap<String, FileId>,
}

impl RegistryState {
    fn empty() -> Self {
        RegistryState {
            files: BTreeMap::new(),
            next_file_id: FIRST_FILE_ID,
            file_paths: BTreeMap::new(),
        }
    }
}

/// The symbol registry for one workspace.
pub struct SymbolRegistry {
    workspace: PathBuf,
    registry_path: PathBuf,
    state: Mutex<RegistryState>,
}

impl SymbolRegistry {
    /// Open (or initialize) the registry for a workspace root.
    ///
    /// An unparsable registry file is logged and replaced with a fresh
    /// state: ids are re-minted from scratch, which can invalidate `IMP[]`
    /// references workspace-wide. Availability over history.
    pub fn open(workspace_root: &Path) -> Result<Self> {
        let registry_path = workspace::registry_path(workspace_root);
        let state = match std::fs::read_to_string(&registry_path) {
            Ok(text) => match serde_json::from_str::<RegistryState>(&text) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse registry file {}: {}; creating new registry",
                        registry_path.display(),
                        e
                    );
                    RegistryState::empty()
                }
            },
            Err(_) => RegistryState::empty(),
        };

        let registry = SymbolRegistry {
            workspace: workspace_root.to_path_buf(),
            registry_path,
            state: Mutex::new(state),
        };
        if !registry.registry_path.exists() {
            let guard = registry.state.lock().unwrap_or_else(|e| e.into_inner());
            registry.save(&guard)?;
        }
        Ok(registry)
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace
    }

    /// Get or allocate the stable id for a path. Idempotent: the same path
    /// always maps to the same id for the life of the registry.
    pub fn file_id_for(&self, path: &Path) -> Result<FileId> {
        let rel = self.relativize(path)?;
        let mut state = self.lock();

        if let Some(&id) = state.file_paths.get(&rel) {
            return Ok(id);
        }

        let id = FileId(state.next_file_id);
        state.next_file_id += 1;
        state.file_paths.insert(rel.clone(), id);
        state.files.insert(id, FileRecord::new(rel));
        self.save(&state)?;
        tracing::debug!("Registered {} as {}", path.display(), id);
        Ok(id)
    }

    /// Get or mint the symbol id for `name` within a file. The kind is only
    /// consulted on first mint; later calls return the existing id even if
    /// the reported kind drifts.
    pub fn symbol_id_for(&self, file: FileId, name: &str, kind: SymbolKind) -> Result<SymbolId> {
        let mut state = self.lock();
        let record = state
            .files
            .get_mut(&file)
            .ok_or(CoreError::UnknownFile(file))?;

        if let Some(&id) = record.symbols.get(name) {
            return Ok(id);
        }

        let id = match kind.id_space() {
            IdSpace::Class => {
                let id = SymbolId::new(IdSpace::Class, record.next_class_id);
                record.next_class_id += 1;
                id
            }
            IdSpace::Func => {
                let id = SymbolId::new(IdSpace::Func, record.next_func_id);
                record.next_func_id += 1;
                id
            }
        };
        record.symbols.insert(name.to_string(), id);
        self.save(&state)?;
        Ok(id)
    }

    /// Resolve a module path plus symbol name to a reference.
    ///
    /// The module path matches a registered file by trailing path
    /// components with the extension stripped. A resolved file with an
    /// unregistered symbol yields a pending reference (forward reference,
    /// re-resolve later), not a failure. An unmatched module yields `None`.
    pub fn resolve_import(&self, module: &str, symbol: &str) -> Option<SymbolRef> {
        let needle = module_components(module);
        if needle.is_empty() {
            return None;
        }

        let state = self.lock();
        for (&file_id, record) in &state.files {
            if !path_matches_module(&record.path, &needle) {
                continue;
            }
            if symbol == "*" {
                return Some(SymbolRef::wildcard(file_id));
            }
            return match record.symbols.get(symbol) {
                Some(&id) => Some(SymbolRef::named(file_id, id)),
                None => Some(SymbolRef::pending(file_id)),
            };
        }
        None
    }

    /// Move a file to a new path, preserving its id and symbol map. An
    /// unknown old path is treated as a brand new file at the new path.
    pub fn rename(&self, old_path: &Path, new_path: &Path) -> Result<FileId> {
        let rel_old = self.relativize(old_path)?;
        let rel_new = self.relativize(new_path)?;

        {
            let mut state = self.lock();
            if let Some(id) = state.file_paths.remove(&rel_old) {
                state.file_paths.insert(rel_new.clone(), id);
                if let Some(record) = state.files.get_mut(&id) {
                    record.path = rel_new.clone();
                }
                self.save(&state)?;
                tracing::debug!("Renamed {} -> {} ({})", rel_old, rel_new, id);
                return Ok(id);
            }
        }

        self.file_id_for(new_path)
    }

    /// Remove a file's record and path mapping. No other ids are
    /// renumbered; the file id is never reused.
    pub fn remove(&self, file: FileId) -> Result<()> {
        let mut state = self.lock();
        if let Some(record) = state.files.remove(&file) {
            state.file_paths.remove(&record.path);
            self.save(&state)?;
        }
        Ok(())
    }

    /// Workspace-relative path for a file id.
    pub fn relative_path_of(&self, file: FileId) -> Option<String> {
        self.lock().files.get(&file).map(|r| r.path.clone())
    }

    /// Absolute path for a file id.
    pub fn path_of(&self, file: FileId) -> Option<PathBuf> {
        self.relative_path_of(file).map(|p| self.workspace.join(p))
    }

    /// Snapshot of all known `(file_id, relative_path)` pairs.
    pub fn files(&self) -> Vec<(FileId, String)> {
        self.lock()
            .files
            .iter()
            .map(|(&id, r)| (id, r.path.clone()))
            .collect()
    }

    /// Snapshot of the symbol map for one file.
    pub fn symbols_of(&self, file: FileId) -> BTreeMap<String, SymbolId> {
        self.lock()
            .files
            .get(&file)
            .map(|r| r.symbols.clone())
            .unwrap_or_default()
    }

    /// Look up a symbol id by name within one file.
    pub fn symbol_in_file(&self, file: FileId, name: &str) -> Option<SymbolId> {
        self.lock()
            .files
            .get(&file)
            .and_then(|r| r.symbols.get(name).copied())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Full synchronous rewrite of the persisted state.
    fn save(&self, state: &RegistryState) -> Result<()> {
        workspace::ensure_forai_dir(&self.workspace).map_err(|source| CoreError::Persist {
            path: self.registry_path.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.registry_path, json).map_err(|source| CoreError::Persist {
            path: self.registry_path.clone(),
            source,
        })
    }

    /// Normalize a path to a workspace-relative, '/'-separated string.
    fn relativize(&self, path: &Path) -> Result<String> {
        let rel = path.strip_prefix(&self.workspace).unwrap_or(path);
        let rel = rel
            .to_str()
            .ok_or_else(|| CoreError::NonUtf8Path(rel.to_path_buf()))?;
        Ok(rel.replace('\\', "/"))
    }
}

/// Split a module path into components. Dots act as separators only when
/// the path is not already '/'-separated (JS import paths keep their dots).
fn module_components(module: &str) -> Vec<&str> {
    let module = module.trim_start_matches("./");
    if module.contains('/') {
        module.split('/').filter(|c| !c.is_empty() && *c != ".").collect()
    } else {
        module.split('.').filter(|c| !c.is_empty()).collect()
    }
}

/// Component-wise suffix match of a registered relative path (extension
/// stripped) against a module path.
fn path_matches_module(rel_path: &str, needle: &[&str]) -> bool {
    let mut components: Vec<&str> = rel_path.split('/').collect();
    if let Some(last) = components.last_mut() {
        if let Some((stem, _ext)) = last.rsplit_once('.') {
            *last = stem;
        }
    }
    if needle.len() > components.len() {
        return false;
    }
    components[components.len() - needle.len()..]
        .iter()
        .zip(needle)
        .all(|(a, b)| a == b)
}

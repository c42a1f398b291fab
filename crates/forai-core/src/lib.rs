//! FORAI Core — identity registry, header codec, and dependency tracker

pub mod error;
pub mod header;
pub mod model;
pub mod placement;
pub mod query;
pub mod registry;
pub mod tracker;
pub mod workspace;

#[cfg(test)]
pub mod tests;

pub use error::{CoreError, Result};
pub use model::{
    Definition, FileAnalysis, FileId, IdSpace, Language, ParentRef, RawAnalysis, RawDefinition,
    RawImport, SymbolId, SymbolKind, SymbolRef, SymbolTarget,
};
pub use query::{QueryEngine, SymbolLocation};
pub use registry::{FileRecord, SymbolRegistry};
pub use tracker::{DependencyGraph, DependencyTracker};
pub use workspace::{FORAI_DIR, REGISTRY_FILE, ensure_forai_dir, forai_dir, registry_path};

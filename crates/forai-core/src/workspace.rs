//! Workspace-local state directory helpers

use std::path::{Path, PathBuf};

/// State directory: .forai/
pub const FORAI_DIR: &str = ".forai";

/// Registry file inside the state directory
pub const REGISTRY_FILE: &str = "registry.json";

/// Get the state directory path
pub fn forai_dir(root: &Path) -> PathBuf {
    root.join(FORAI_DIR)
}

/// Get the registry file path
pub fn registry_path(root: &Path) -> PathBuf {
    root.join(FORAI_DIR).join(REGISTRY_FILE)
}

/// Ensure the state directory exists
pub fn ensure_forai_dir(root: &Path) -> std::io::Result<()> {
    let dir = forai_dir(root);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

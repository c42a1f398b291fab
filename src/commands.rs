//! CLI command implementations
//!
//! Every command prints one JSON object on stdout; logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::json;

use forai_analyzer::{UpdatePipeline, UpdatePool};
use forai_core::{QueryEngine, SymbolRegistry};

fn pipeline(workspace: &Path, runtime: bool) -> Result<UpdatePipeline> {
    let registry = Arc::new(SymbolRegistry::open(workspace)?);
    Ok(UpdatePipeline::new(registry).with_runtime(runtime))
}

fn existing_file(path: &Path) -> Result<PathBuf> {
    let path = path
        .canonicalize()
        .with_context(|| format!("File does not exist: {}", path.display()))?;
    if !path.is_file() {
        bail!("Not a file: {}", path.display());
    }
    Ok(path)
}

pub fn update(workspace: &Path, file: &Path, runtime: bool) -> Result<()> {
    let file = existing_file(file)?;
    let pipeline = pipeline(workspace, runtime)?;

    let outcome = pipeline.update_with_cascade(&file)?;
    tracing::info!("Updated header for {}", file.display());

    println!(
        "{}",
        json!({ "success": true, "imports_changed": outcome.imports_changed })
    );
    Ok(())
}

pub fn update_all(workspace: &Path, runtime: bool) -> Result<()> {
    let pipeline = Arc::new(pipeline(workspace, runtime)?);
    let files = pipeline.source_files();
    let report = UpdatePool::with_default_size().run(Arc::clone(&pipeline), files);

    tracing::info!("Updated headers for {} of {} files", report.updated, report.total);
    println!(
        "{}",
        json!({ "success": true, "updated": report.updated, "failed": report.failed, "total": report.total })
    );
    Ok(())
}

pub fn rename(workspace: &Path, old_path: &Path, new_path: &Path, runtime: bool) -> Result<()> {
    let new_path = existing_file(new_path)?;
    let pipeline = pipeline(workspace, runtime)?;

    let outcome = pipeline.rename(old_path, &new_path)?;
    tracing::info!("Updated header for renamed file {}", new_path.display());

    println!(
        "{}",
        json!({ "success": true, "file_id": outcome.file_id.to_string(), "imports_changed": outcome.imports_changed })
    );
    Ok(())
}

pub fn update_deps(workspace: &Path, file: &Path, runtime: bool) -> Result<()> {
    let file = existing_file(file)?;
    let pipeline = pipeline(workspace, runtime)?;

    let file_id = pipeline.registry().file_id_for(&file)?;
    let touched = pipeline.update_dependents(file_id);

    println!(
        "{}",
        json!({ "success": true, "updated": touched.len() })
    );
    Ok(())
}

pub fn list_deps(workspace: &Path, file: &Path) -> Result<()> {
    let file = existing_file(file)?;
    let registry = SymbolRegistry::open(workspace)?;

    let file_id = registry.file_id_for(&file)?;
    let tracker = forai_core::DependencyTracker::new(&registry);
    let dependents: Vec<String> = tracker
        .direct_dependents(file_id)
        .into_iter()
        .filter_map(|id| registry.path_of(id))
        .map(|p| p.display().to_string())
        .collect();

    println!(
        "{}",
        json!({ "success": true, "file_id": file_id.to_string(), "dependencies": dependents })
    );
    Ok(())
}

pub fn find(workspace: &Path, symbol: &str) -> Result<()> {
    let registry = SymbolRegistry::open(workspace)?;
    let query = QueryEngine::new(&registry);

    let result = match query.find_definition(symbol) {
        Some(loc) => json!({
            "success": true,
            "result": {
                "file_id": loc.file_id.to_string(),
                "file_path": loc.file_path.display().to_string(),
                "symbol_id": loc.symbol_id.to_string(),
            }
        }),
        None => json!({
            "success": true,
            "result": null,
            "message": format!("Symbol {symbol} not found"),
        }),
    };
    println!("{result}");
    Ok(())
}

pub fn file_symbols(workspace: &Path, file: &Path) -> Result<()> {
    let registry = SymbolRegistry::open(workspace)?;
    let query = QueryEngine::new(&registry);

    let result = match query.file_symbols(file) {
        Some((file_id, symbols)) => {
            let symbols: serde_json::Map<String, serde_json::Value> = symbols
                .into_iter()
                .map(|(name, id)| (name, json!(id.to_string())))
                .collect();
            json!({
                "success": true,
                "result": { "file_id": file_id.to_string(), "symbols": symbols }
            })
        }
        None => json!({
            "success": true,
            "result": null,
            "message": format!("File {} not found in registry", file.display()),
        }),
    };
    println!("{result}");
    Ok(())
}

pub fn usages(workspace: &Path, symbol: &str) -> Result<()> {
    let registry = SymbolRegistry::open(workspace)?;
    let query = QueryEngine::new(&registry);

    let usages: Vec<serde_json::Value> = query
        .usages(symbol)
        .into_iter()
        .map(|(file_id, path)| {
            json!({ "file_id": file_id.to_string(), "file_path": path.display().to_string() })
        })
        .collect();

    println!("{}", json!({ "success": true, "result": usages }));
    Ok(())
}

pub fn list(workspace: &Path) -> Result<()> {
    let registry = SymbolRegistry::open(workspace)?;
    let query = QueryEngine::new(&registry);

    let symbols: serde_json::Map<String, serde_json::Value> = query
        .all_symbols()
        .into_iter()
        .map(|(name, (file_id, symbol_id))| {
            (
                name,
                json!({ "file_id": file_id.to_string(), "symbol_id": symbol_id.to_string() }),
            )
        })
        .collect();

    println!("{}", json!({ "success": true, "result": symbols }));
    Ok(())
}

pub fn header(workspace: &Path, file: &Path) -> Result<()> {
    let file = existing_file(file)?;
    let registry = SymbolRegistry::open(workspace)?;
    let query = QueryEngine::new(&registry);

    let result = match query.file_header(&file) {
        Some(header) => json!({ "success": true, "result": header }),
        None => json!({
            "success": true,
            "result": null,
            "message": format!("No FORAI header found in {}", file.display()),
        }),
    };
    println!("{result}");
    Ok(())
}

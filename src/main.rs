//! FORAI CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "forai")]
#[command(about = "Embedded symbol headers for AI-assisted tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Workspace root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Enable runtime introspection (observed only, never merged)
    #[arg(short, long)]
    runtime: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the header of a single file (cascades to dependents)
    Update {
        /// Path to the file
        file: PathBuf,
    },
    /// Update the headers of all supported files in the workspace
    UpdateAll,
    /// Handle a file rename, preserving its id
    Rename {
        /// Old file path
        old_path: PathBuf,
        /// New file path
        new_path: PathBuf,
    },
    /// Regenerate the headers of files that depend on a file
    UpdateDeps {
        /// Path to the changed file
        file: PathBuf,
    },
    /// List the files that depend on a file
    ListDeps {
        /// Path to the file
        file: PathBuf,
    },
    /// Find where a symbol is defined
    Find {
        /// Symbol name
        symbol: String,
    },
    /// List all symbols defined in a file
    FileSymbols {
        /// Path to the file
        file: PathBuf,
    },
    /// Find all files that import a symbol
    Usages {
        /// Symbol name
        symbol: String,
    },
    /// List all symbols in the workspace
    List,
    /// Print the committed header of a file
    Header {
        /// Path to the file
        file: PathBuf,
    },
    /// Show version
    Version,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "forai={log_level},forai_core={log_level},forai_analyzer={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let workspace = match cli.workspace.canonicalize() {
        Ok(path) if path.is_dir() => path,
        _ => {
            tracing::error!("Workspace path does not exist: {}", cli.workspace.display());
            return std::process::ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Update { file } => commands::update(&workspace, &file, cli.runtime),
        Commands::UpdateAll => commands::update_all(&workspace, cli.runtime),
        Commands::Rename { old_path, new_path } => {
            commands::rename(&workspace, &old_path, &new_path, cli.runtime)
        }
        Commands::UpdateDeps { file } => commands::update_deps(&workspace, &file, cli.runtime),
        Commands::ListDeps { file } => commands::list_deps(&workspace, &file),
        Commands::Find { symbol } => commands::find(&workspace, &symbol),
        Commands::FileSymbols { file } => commands::file_symbols(&workspace, &file),
        Commands::Usages { symbol } => commands::usages(&workspace, &symbol),
        Commands::List => commands::list(&workspace),
        Commands::Header { file } => commands::header(&workspace, &file),
        Commands::Version => {
            println!("forai v{}", env!("CARGO_PKG_VERSION"));
            return std::process::ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error: {e:#}");
            println!(
                "{}",
                serde_json::json!({ "success": false, "error": format!("{e:#}") })
            );
            std::process::ExitCode::FAILURE
        }
    }
}

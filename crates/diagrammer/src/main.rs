// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagrammer - renders Mermaid diagram descriptions to images.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod serve;
mod shutdown;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use diagrammer_config::DiagrammerConfig;

/// Diagrammer - renders Mermaid diagram descriptions to images.
#[derive(Parser, Debug)]
#[command(name = "diagrammer", version, about, long_about = None)]
struct Cli {
    /// Explicit configuration file (replaces the standard search paths).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve artifact delivery and the MCP endpoint over HTTP.
    Serve,
    /// Speak MCP over stdin/stdout.
    Stdio {
        /// Do not start the HTTP delivery server alongside.
        #[arg(long)]
        no_http: bool,
    },
    /// Classify a description file (`-` for stdin) and print the result.
    Validate {
        /// Path to the description, or `-`.
        file: PathBuf,
    },
    /// Run one retention pass over the output directory.
    Sweep,
    /// Check configuration, renderer and output directory.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Serve => {
            serve::init_tracing(&config.server.log_level);
            serve::run_serve(config).await
        }
        Commands::Stdio { no_http } => {
            serve::init_tracing(&config.server.log_level);
            serve::run_stdio(config, !no_http).await
        }
        Commands::Validate { file } => run_validate(&file),
        Commands::Sweep => {
            serve::init_tracing(&config.server.log_level);
            serve::run_sweep(&config).await
        }
        Commands::Doctor { plain } => doctor::run_doctor(&config, plain).await,
    };

    if let Err(e) = result {
        eprintln!("diagrammer: {e}");
        std::process::exit(1);
    }
}

/// Loads and validates configuration, exiting with rendered diagnostics on
/// failure.
fn load_config(path: Option<&Path>) -> DiagrammerConfig {
    let loaded = match path {
        Some(path) => diagrammer_config::load_and_validate_path(path),
        None => diagrammer_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            diagrammer_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn run_validate(file: &Path) -> Result<(), diagrammer_core::DiagrammerError> {
    let description = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(diagrammer_core::DiagrammerError::storage)?;
        buf
    } else {
        std::fs::read_to_string(file).map_err(|e| {
            diagrammer_core::DiagrammerError::Validation(format!(
                "cannot read {}: {e}",
                file.display()
            ))
        })?
    };

    let result = diagrammer_render::classify(&description);
    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| diagrammer_core::DiagrammerError::Internal(e.to_string()))?;
    println!("{json}");

    if result.valid {
        Ok(())
    } else {
        Err(diagrammer_core::DiagrammerError::Validation(
            result.error.unwrap_or_else(|| "invalid description".to_string()),
        ))
    }
}

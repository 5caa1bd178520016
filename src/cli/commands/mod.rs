//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod models;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "ghostflow")]
#[command(about = "Find informal, repetitive work in operational records")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Default log filter for when `RUST_LOG` is unset.
/// Verbose runs and the server log at info, other commands only warn.
pub fn default_log_filter() -> &'static str {
    if is_verbose() || std::env::args().any(|arg| arg == "serve") {
        "ghostflow=info,tower_http=info"
    } else {
        "ghostflow=warn"
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the upload server
    Serve {
        /// Address to bind: `host:port`, a bare port or a bare host
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Analyze a single file and print the result as JSON
    Analyze {
        /// File to analyze (.txt, .log, .csv, .xlsx, .xls, .ods)
        file: PathBuf,
        /// Also write an HTML report to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List provider models and show which one would be used
    Models,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).await?;

    if let Some(path) = &config.source_path {
        tracing::info!(path = %path.display(), "Loaded config file");
    }

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&config, bind.as_deref()).await,
        Commands::Analyze {
            file,
            report,
            pretty,
        } => analyze::cmd_analyze(&config, &file, report.as_deref(), pretty).await,
        Commands::Models => models::cmd_models(&config).await,
    }
}

//! # projdocs CLI
//!
//! Command-line interface for the projdocs documentation generator.

mod commands;

use clap::{Parser, Subcommand};
use commands::ProjectArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "projdocs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to projdocs.yml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render stale documents, then refresh the index and shared assets
    Build {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// List discovered documents and whether a build would republish them
    Status {
        #[command(flatten)]
        project: ProjectArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build { project } => {
            let config = commands::load_config(cli.config.as_deref(), &project)?;
            commands::build_project(config)
        }
        Commands::Status { project, json } => {
            let config = commands::load_config(cli.config.as_deref(), &project)?;
            commands::status(config, json)
        }
    }
}

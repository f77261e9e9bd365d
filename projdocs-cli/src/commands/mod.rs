//! CLI command implementations.

pub mod build;
pub mod status;

use anyhow::{Context, Result};
use clap::Args;
use projdocs_core::{Config, Settings};
use std::path::{Path, PathBuf};

pub use build::build_project;
pub use status::status;

const DEFAULT_CONFIG: &str = "projdocs.yml";

/// Flags that override values from the configuration file
#[derive(Args, Debug, Default)]
pub struct ProjectArgs {
    /// Output directory
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Library root to scan (repeatable)
    #[arg(short, long = "lib")]
    pub libs: Vec<PathBuf>,

    /// Regex excluding root-relative paths (repeatable)
    #[arg(short, long)]
    pub except: Vec<String>,

    /// Regenerate every document regardless of timestamps
    #[arg(short, long)]
    pub force: bool,

    /// Project title
    #[arg(long)]
    pub title: Option<String>,

    /// Project description
    #[arg(long)]
    pub desc: Option<String>,

    /// Page language
    #[arg(long)]
    pub lang: Option<String>,
}

/// Read the configuration file (if any), apply flag overrides and resolve
pub fn load_config(config_path: Option<&Path>, args: &ProjectArgs) -> Result<Config> {
    let mut settings = match config_path {
        Some(path) => {
            tracing::debug!("Loading config from {:?}", path);
            Settings::from_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))?
        }
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            tracing::debug!("Loading config from {}", DEFAULT_CONFIG);
            Settings::from_file(DEFAULT_CONFIG).context("Failed to load configuration")?
        }
        None => Settings::default(),
    };

    // Flag paths are relative to the working directory, not the config file
    if let Some(out) = &args.out {
        settings.paths.output = std::path::absolute(out)?;
    }
    if !args.libs.is_empty() {
        settings.paths.libraries = args
            .libs
            .iter()
            .map(std::path::absolute)
            .collect::<std::io::Result<Vec<_>>>()?;
    }
    settings.exclude.extend(args.except.iter().cloned());
    settings.force |= args.force;
    if let Some(title) = &args.title {
        settings.project.title = title.clone();
    }
    if let Some(desc) = &args.desc {
        settings.project.description = desc.clone();
    }
    if let Some(lang) = &args.lang {
        settings.project.language = lang.clone();
    }

    settings.resolve().context("Invalid configuration")
}

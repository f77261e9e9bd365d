//! Build command implementation.

use anyhow::{Context, Result};
use projdocs_core::{Config, ProjectBuilder};
use projdocs_render::{emit_assets, write_index};

/// Render stale documents, then refresh the shared assets and the index
pub fn build_project(config: Config) -> Result<()> {
    tracing::info!(
        "Building documentation into {}",
        config.output_root().display()
    );

    let builder = ProjectBuilder::new(config);
    let report = builder.build().context("Failed to build documentation")?;
    let config = builder.config();

    emit_assets(config.output_root()).context("Failed to write static assets")?;
    write_index(config.output_root(), config.project(), &report.index)
        .context("Failed to write index")?;

    if !report.unreadable.is_empty() {
        tracing::warn!("{} source files could not be read", report.unreadable.len());
    }
    tracing::info!(
        "Build complete: {} published, {} up to date",
        report.published.len(),
        report.fresh
    );
    Ok(())
}

//! Status command: staleness of every discovered document, without writing.

use anyhow::{Context, Result};
use projdocs_core::{Config, DocumentStatus, ProjectBuilder};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
pub struct StatusResponse {
    pub output_root: PathBuf,
    pub stale: usize,
    pub fresh: usize,
    pub documents: Vec<DocumentStatus>,
}

pub fn status(config: Config, json: bool) -> Result<()> {
    let output_root = config.output_root().to_path_buf();
    let documents = ProjectBuilder::new(config)
        .status()
        .context("Failed to discover documents")?;
    let stale = documents.iter().filter(|d| d.stale).count();

    if json {
        let payload = StatusResponse {
            output_root,
            stale,
            fresh: documents.len() - stale,
            documents,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let mut group = None;
    for doc in &documents {
        if group != Some(&doc.group) {
            println!("{}:", doc.group);
            group = Some(&doc.group);
        }
        let state = if doc.stale { "stale" } else { "fresh" };
        println!("  {:<6} {} ({})", state, doc.name, doc.output);
    }
    println!("{} stale, {} fresh", stale, documents.len() - stale);
    Ok(())
}

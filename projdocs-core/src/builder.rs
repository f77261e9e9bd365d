//! Project building logic - orchestrates discovery, linking, rendering and output.

use crate::{
    config::Config,
    docset::DocumentSet,
    document::{Document, Publish},
    index::{IndexAggregator, NavigationGroup},
    markup::Parser,
    references::ReferenceMap,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Library root {0:?} does not exist or is not a directory")]
    LibraryRoot(PathBuf),

    #[error("Library root {path:?} is not readable: {source}")]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create output root {path:?}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render {path:?}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: askama::Error,
    },
}

/// Outcome of a build run
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Output files written this run, in processing order
    pub published: Vec<PathBuf>,
    /// Documents left untouched because their output was current
    pub fresh: usize,
    /// Sources that could not be read and were skipped
    pub unreadable: Vec<PathBuf>,
    pub index: Vec<NavigationGroup>,
}

/// Staleness of one discovered document, without building it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentStatus {
    pub group: String,
    pub name: String,
    pub source: PathBuf,
    pub output: String,
    pub stale: bool,
}

/// Main project builder
pub struct ProjectBuilder {
    config: Config,
}

impl ProjectBuilder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover every group's documents
    pub fn discover(&self) -> Result<Vec<DocumentSet>, BuildError> {
        DocumentSet::discover_all(&self.config)
    }

    /// Report which documents a build would republish
    pub fn status(&self) -> Result<Vec<DocumentStatus>, BuildError> {
        let force = self.config.force_regenerate();
        let sets = self.discover()?;
        Ok(sets
            .iter()
            .flat_map(|set| {
                set.iter().map(|doc| DocumentStatus {
                    group: set.group().description.clone(),
                    name: doc.name().to_string(),
                    source: doc.source_path().to_path_buf(),
                    output: doc.output_rel_path().to_string(),
                    stale: doc.is_stale(force),
                })
            })
            .collect())
    }

    /// Build the entire project
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let output_root = self.config.output_root();
        fs::create_dir_all(output_root).map_err(|source| BuildError::OutputRoot {
            path: output_root.to_path_buf(),
            source,
        })?;

        let mut sets = self.discover()?;
        let total: usize = sets.iter().map(DocumentSet::len).sum();
        tracing::info!("Found {} documents in {} groups", total, sets.len());

        // First pass - every linkable module, before anything renders
        let references = ReferenceMap::collect(&sets);

        // Second pass - render stale documents with the complete map
        let force = self.config.force_regenerate();
        let mut report = BuildReport::default();
        let mut aggregator = IndexAggregator::new(self.config.groups());

        for set in &mut sets {
            let group_index = set.group_index();
            let parser = Parser::new(set.group());

            for doc in set.iter_mut() {
                let processed = if doc.kind().is_binary() {
                    self.copy_binary(doc, force, &mut report)?
                } else {
                    self.render_document(doc, &parser, &references, force, &mut report)?
                };
                if processed {
                    aggregator.record(group_index, doc);
                }
            }
        }

        report.index = aggregator.finish();
        tracing::info!(
            "Published {} files, {} up to date",
            report.published.len(),
            report.fresh
        );
        Ok(report)
    }

    fn copy_binary(
        &self,
        doc: &Document,
        force: bool,
        report: &mut BuildReport,
    ) -> Result<bool, BuildError> {
        if doc.is_stale(force) {
            doc.publish(&[])?;
            report.published.push(doc.output_path().to_path_buf());
        } else {
            tracing::debug!("Up to date: {}", doc.output_rel_path());
            report.fresh += 1;
        }
        Ok(true)
    }

    /// Returns false when the source could not be read
    fn render_document(
        &self,
        doc: &mut Document,
        parser: &Parser,
        references: &ReferenceMap,
        force: bool,
        report: &mut BuildReport,
    ) -> Result<bool, BuildError> {
        let source = match fs::read(doc.source_path()) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                tracing::warn!("Skipping {}: {}", doc.source_path().display(), err);
                report.unreadable.push(doc.source_path().to_path_buf());
                return Ok(false);
            }
        };

        if !doc.is_stale(force) {
            tracing::debug!("Up to date: {}", doc.output_rel_path());
            let title = parser.title(&source, doc);
            doc.set_title(title);
            report.fresh += 1;
            return Ok(true);
        }

        let page = parser
            .render(doc, &source, references, self.config.project())
            .map_err(|source| BuildError::Template {
                path: doc.source_path().to_path_buf(),
                source,
            })?;
        doc.set_title(page.title);

        if doc.copy_source()? {
            tracing::debug!("Copied source for {}", doc.name());
        }
        doc.publish(page.html.as_bytes())?;
        tracing::debug!("Rendered {}", doc.output_rel_path());
        report.published.push(doc.output_path().to_path_buf());
        Ok(true)
    }
}

//! Per-file document metadata, staleness and publishing.

use crate::builder::BuildError;
use crate::config::Config;
use crate::group::{DocKind, SuffixGroup};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Operations every document kind supports during the render pass
pub trait Publish {
    /// True when forced, when the output is missing, or when the source is
    /// strictly newer than the output
    fn is_stale(&self, force: bool) -> bool;

    /// Mirror the source under `src/`; returns false when the document
    /// does not expose its source
    fn copy_source(&self) -> Result<bool, BuildError>;

    /// Replace the output file with `html`
    fn publish(&self, html: &[u8]) -> Result<(), BuildError>;
}

/// A discovered source file and where its rendered page goes
#[derive(Debug, Clone)]
pub struct Document {
    source_path: PathBuf,
    relative_path: PathBuf,
    name: String,
    output_path: PathBuf,
    output_rel: String,
    mirror_path: PathBuf,
    source_mtime: SystemTime,
    kind: DocKind,
    exposes_source: bool,
    title: Option<String>,
}

impl Document {
    /// Build a document for `source_path` found under `library_root`.
    ///
    /// Returns `None` when the relative path would escape the output root.
    pub fn from_source(
        config: &Config,
        group: &SuffixGroup,
        library_root: &Path,
        source_path: &Path,
        source_mtime: SystemTime,
    ) -> Option<Self> {
        let relative_path = confine(source_path.strip_prefix(library_root).ok()?)?;
        let rel = to_slash(&relative_path);
        let name = module_name(&relative_path, group.kind);

        let mirror_path = config.source_mirror_root().join(&relative_path);
        let (output_path, output_rel) = if group.kind.is_binary() {
            (mirror_path.clone(), format!("src/{}", rel))
        } else {
            let html_rel = format!("{}.html", rel);
            (config.output_root().join(&html_rel), html_rel)
        };

        Some(Self {
            source_path: source_path.to_path_buf(),
            relative_path,
            name,
            output_path,
            output_rel,
            mirror_path,
            source_mtime,
            kind: group.kind,
            exposes_source: group.exposes_source(),
            title: None,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Path relative to the library root, suffix included
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Module identifier, e.g. `Foo::Bar` for `Foo/Bar.pm`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Output path relative to the output root, with `/` separators
    pub fn output_rel_path(&self) -> &str {
        &self.output_rel
    }

    pub fn source_mtime(&self) -> SystemTime {
        self.source_mtime
    }

    pub fn kind(&self) -> DocKind {
        self.kind
    }

    /// Extracted title, falling back to the module name
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = Some(title);
    }

    /// `../` once per directory between the page and the output root
    pub fn asset_prefix(&self) -> String {
        let depth = self.output_rel.matches('/').count();
        "../".repeat(depth)
    }

    /// Link from the rendered page to the mirrored source, if exposed
    pub fn source_href(&self) -> Option<String> {
        if !self.exposes_source {
            return None;
        }
        Some(format!(
            "{}src/{}",
            self.asset_prefix(),
            to_slash(&self.relative_path)
        ))
    }
}

impl Publish for Document {
    fn is_stale(&self, force: bool) -> bool {
        if force {
            return true;
        }
        match fs::metadata(&self.output_path).and_then(|m| m.modified()) {
            Ok(output_mtime) => self.source_mtime > output_mtime,
            Err(_) => true,
        }
    }

    fn copy_source(&self) -> Result<bool, BuildError> {
        if !self.exposes_source {
            return Ok(false);
        }
        let bytes = fs::read(&self.source_path).map_err(|source| BuildError::Read {
            path: self.source_path.clone(),
            source,
        })?;
        write_file(&self.mirror_path, &bytes)?;
        tracing::debug!("Mirrored source: {}", self.mirror_path.display());
        Ok(true)
    }

    fn publish(&self, html: &[u8]) -> Result<(), BuildError> {
        if self.kind.is_binary() {
            // The mirror is the output for copied documents
            return self.copy_source().map(|_| ());
        }
        write_file(&self.output_path, html)?;
        tracing::debug!("Published: {}", self.output_path.display());
        Ok(())
    }
}

/// Truncate-then-write, creating parent directories
fn write_file(path: &Path, bytes: &[u8]) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Keep only normal components; reject anything that climbs out
fn confine(relative: &Path) -> Option<PathBuf> {
    let mut confined = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => confined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if confined.as_os_str().is_empty() {
        None
    } else {
        Some(confined)
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn module_name(relative: &Path, kind: DocKind) -> String {
    if !kind.uses_package_names() {
        return to_slash(relative);
    }
    let stem = relative.with_extension("");
    stem.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("::")
}

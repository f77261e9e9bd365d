//! Configuration parsing and resolution.

use crate::group::{default_groups, DefinitionRule, DocKind, MarkupSyntax, SuffixGroup};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Library root {path:?} is not readable: {source}")]
    LibraryRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Library root {0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Cannot resolve output root {path:?}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Group '{0}' declares no suffixes")]
    EmptyGroup(String),
}

/// On-disk configuration matching the projdocs.yml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub project: ProjectSettings,

    #[serde(default)]
    pub paths: PathsSettings,

    /// Regexes matched against paths relative to a library root
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub force: bool,

    /// Registration order matters: the first group claiming a suffix owns it
    #[serde(default)]
    pub groups: Option<Vec<GroupSettings>>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    String::from("en")
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSettings {
    #[serde(default = "default_root")]
    pub output: PathBuf,

    #[serde(default = "default_libraries")]
    pub libraries: Vec<PathBuf>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_libraries() -> Vec<PathBuf> {
    vec![default_root()]
}

impl Default for PathsSettings {
    fn default() -> Self {
        Self {
            output: default_root(),
            libraries: default_libraries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSettings {
    pub description: String,
    pub kind: DocKind,
    pub suffixes: Vec<String>,

    #[serde(default)]
    pub syntax: MarkupSyntax,

    /// Defaults per kind: modules and scripts expose source, manuals don't
    #[serde(default)]
    pub copy_source: Option<bool>,

    #[serde(default)]
    pub definitions: Option<DefinitionSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionSettings {
    pub pattern: String,

    #[serde(default = "default_definition_label")]
    pub label: String,
}

fn default_definition_label() -> String {
    String::from("Methods")
}

impl Settings {
    /// Defaults everywhere except the output and library roots
    pub fn for_paths(output: impl Into<PathBuf>, libraries: Vec<PathBuf>) -> Self {
        Self {
            paths: PathsSettings {
                output: output.into(),
                libraries,
            },
            ..Default::default()
        }
    }

    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut settings: Settings = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        settings.config_path = Some(path.to_path_buf());

        Ok(settings)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_ref().and_then(|p| p.parent()) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Turn settings into an immutable, absolute configuration
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let output = self.resolve_path(&self.paths.output);
        let output_root = normalize_root(&output).map_err(|source| ConfigError::OutputRoot {
            path: output.clone(),
            source,
        })?;

        let mut library_roots: Vec<PathBuf> = Vec::new();
        for lib in &self.paths.libraries {
            let path = self.resolve_path(lib);
            let root = path.canonicalize().map_err(|source| ConfigError::LibraryRoot {
                path: path.clone(),
                source,
            })?;
            if !root.is_dir() {
                return Err(ConfigError::NotADirectory(path));
            }
            std::fs::read_dir(&root).map_err(|source| ConfigError::LibraryRoot {
                path: path.clone(),
                source,
            })?;
            if !library_roots.contains(&root) {
                library_roots.push(root);
            }
        }

        let exclude = self
            .exclude
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>, _>>()?;

        let groups = match &self.groups {
            Some(groups) => groups
                .iter()
                .map(GroupSettings::resolve)
                .collect::<Result<Vec<_>, _>>()?,
            None => default_groups(),
        };

        Ok(Config {
            output_root,
            library_roots,
            exclude,
            force_regenerate: self.force,
            project: ProjectMeta {
                title: self.project.title.clone(),
                description: self.project.description.clone(),
                language: self.project.language.clone(),
            },
            groups,
        })
    }
}

impl GroupSettings {
    fn resolve(&self) -> Result<SuffixGroup, ConfigError> {
        if self.suffixes.is_empty() {
            return Err(ConfigError::EmptyGroup(self.description.clone()));
        }

        let suffixes: Vec<&str> = self
            .suffixes
            .iter()
            .map(|s| s.trim_start_matches('.'))
            .collect();
        let mut group = SuffixGroup::new(self.description.clone(), self.kind, &suffixes)
            .with_syntax(self.syntax);
        if let Some(copy) = self.copy_source {
            group.copy_source = copy;
        }
        if let Some(defs) = &self.definitions {
            group = group.with_definitions(DefinitionRule {
                pattern: compile_pattern(&defs.pattern)?,
                label: defs.label.clone(),
            });
        }
        Ok(group)
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Make a possibly missing directory absolute, resolving symlinks in the
/// part of it that already exists.
fn normalize_root(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }

    let mut resolved = existing.canonicalize()?;
    for name in missing.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Display metadata, opaque to the build logic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMeta {
    pub title: String,
    pub description: String,
    pub language: String,
}

/// Resolved, immutable build configuration
#[derive(Debug, Clone)]
pub struct Config {
    output_root: PathBuf,
    library_roots: Vec<PathBuf>,
    exclude: Vec<Regex>,
    force_regenerate: bool,
    project: ProjectMeta,
    groups: Vec<SuffixGroup>,
}

impl Config {
    /// Load and resolve a configuration file in one step
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Settings::from_file(path)?.resolve()
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn library_roots(&self) -> &[PathBuf] {
        &self.library_roots
    }

    pub fn force_regenerate(&self) -> bool {
        self.force_regenerate
    }

    pub fn project(&self) -> &ProjectMeta {
        &self.project
    }

    pub fn groups(&self) -> &[SuffixGroup] {
        &self.groups
    }

    /// Directory holding the mirrored sources
    pub fn source_mirror_root(&self) -> PathBuf {
        self.output_root.join("src")
    }

    /// Index of the group owning a file; the earliest-registered match wins
    pub fn owning_group(&self, path: &Path) -> Option<usize> {
        self.groups.iter().position(|g| g.matches(path))
    }

    /// Whether a root-relative path (with `/` separators) is excluded
    pub fn is_excluded(&self, relative: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(relative))
    }

    /// Generated trees that must never be discovered as sources
    pub fn is_generated_tree(&self, library_root: &Path, path: &Path) -> bool {
        if path == self.source_mirror_root() {
            return true;
        }
        path == self.output_root && self.output_root != library_root
    }
}

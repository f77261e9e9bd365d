//! Suffix groups: which files belong together and how they are rendered.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of document a group produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    /// Linkable module page, eligible for the reference map
    Module,
    /// Standalone manual page
    Manual,
    /// Executable script with embedded documentation
    Script,
    /// Copied verbatim, never parsed
    Binary,
}

impl DocKind {
    /// Whether documents of this kind populate the reference map
    pub fn provides_references(&self) -> bool {
        matches!(self, DocKind::Module)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, DocKind::Binary)
    }

    /// Module-like kinds are named `Foo::Bar`, the rest keep their path
    pub fn uses_package_names(&self) -> bool {
        matches!(self, DocKind::Module | DocKind::Manual)
    }

    fn exposes_source_by_default(&self) -> bool {
        matches!(self, DocKind::Module | DocKind::Script | DocKind::Binary)
    }
}

/// Where the markup lives inside a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkupSyntax {
    /// Markup paragraphs interleaved with code, `=cut` returns to code
    #[default]
    Pod,
    /// Markup inside `/* ... */` comment blocks
    CommentPod,
}

/// Pattern used to pull callable names out of a page
#[derive(Debug, Clone)]
pub struct DefinitionRule {
    pub pattern: Regex,
    pub label: String,
}

/// A named class of source files sharing suffixes and render settings
#[derive(Debug, Clone)]
pub struct SuffixGroup {
    pub description: String,
    pub kind: DocKind,
    pub suffixes: Vec<String>,
    pub syntax: MarkupSyntax,
    pub copy_source: bool,
    pub definitions: Option<DefinitionRule>,
}

impl SuffixGroup {
    pub fn new(description: impl Into<String>, kind: DocKind, suffixes: &[&str]) -> Self {
        Self {
            description: description.into(),
            kind,
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            syntax: MarkupSyntax::Pod,
            copy_source: kind.exposes_source_by_default(),
            definitions: None,
        }
    }

    pub fn with_syntax(mut self, syntax: MarkupSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_definitions(mut self, rule: DefinitionRule) -> Self {
        self.definitions = Some(rule);
        self
    }

    /// Case-sensitive exact match on the file extension
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.suffixes.iter().any(|s| s == ext))
    }

    /// Binary documents always expose their source: the copy is the output
    pub fn exposes_source(&self) -> bool {
        self.kind.is_binary() || self.copy_source
    }
}

/// Default method-extraction pattern for module pages.
///
/// Matches `new`, `new( %args )`, `$obj->method($x)`, `Foo::Bar::helper()`.
pub const DEFAULT_METHOD_PATTERN: &str =
    r"^(?:[$\w:]+(?:->|::))?([A-Za-z_]\w*)\s*(?:\(.*\))?\s*;?\s*$";

/// Groups registered when the configuration names none
pub fn default_groups() -> Vec<SuffixGroup> {
    let methods = DefinitionRule {
        pattern: Regex::new(DEFAULT_METHOD_PATTERN).unwrap(),
        label: String::from("Methods"),
    };

    vec![
        SuffixGroup::new("Modules", DocKind::Module, &["pm"]).with_definitions(methods),
        SuffixGroup::new("Manuals", DocKind::Manual, &["pod"]),
        SuffixGroup::new("Scripts", DocKind::Script, &["pl", "cgi"]),
        SuffixGroup::new("JavaScript Libraries", DocKind::Script, &["js"])
            .with_syntax(MarkupSyntax::CommentPod),
    ]
}

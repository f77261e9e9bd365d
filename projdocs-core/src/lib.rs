//! # projdocs-core
//!
//! Core library for the projdocs documentation generator.
//!
//! This crate discovers source files carrying embedded documentation markup,
//! resolves cross-references between modules, and renders one HTML page per
//! stale document.

pub mod builder;
pub mod config;
pub mod docset;
pub mod document;
pub mod group;
pub mod index;
pub mod markup;
pub mod references;
pub mod slug;

pub use builder::{BuildError, BuildReport, DocumentStatus, ProjectBuilder};
pub use config::{Config, ConfigError, ProjectMeta, Settings};
pub use docset::DocumentSet;
pub use document::{Document, Publish};
pub use group::{default_groups, DefinitionRule, DocKind, MarkupSyntax, SuffixGroup};
pub use index::{IndexAggregator, NavigationGroup, NavigationRecord};
pub use references::{encode_href, relative_href, ReferenceMap};
pub use slug::slugify;

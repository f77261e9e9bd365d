//! Project-wide module name → output location map.

use crate::docset::DocumentSet;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Module name → absolute output path.
///
/// Built in full from every reference-providing group before any page is
/// rendered, then only read.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    entries: HashMap<String, PathBuf>,
}

impl ReferenceMap {
    /// Collect pass: record every module without rendering anything
    pub fn collect(sets: &[DocumentSet]) -> Self {
        let mut map = Self::default();
        for set in sets.iter().filter(|s| s.group().kind.provides_references()) {
            for doc in set {
                if map.entries.contains_key(doc.name()) {
                    tracing::warn!("Duplicate module name {}; keeping the first", doc.name());
                    continue;
                }
                map.entries
                    .insert(doc.name().to_string(), doc.output_path().to_path_buf());
            }
        }
        tracing::debug!("Reference map holds {} modules", map.entries.len());
        map
    }

    /// Exact lookup by module name
    pub fn resolve(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

}

impl FromIterator<(String, PathBuf)> for ReferenceMap {
    fn from_iter<T: IntoIterator<Item = (String, PathBuf)>>(iter: T) -> Self {
        let mut entries = HashMap::new();
        for (name, path) in iter {
            entries.entry(name).or_insert(path);
        }
        Self { entries }
    }
}

/// Characters left as-is in an href path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode each `/`-separated segment of a relative path
pub fn encode_href(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative href from the page at `from` to the file at `to`.
///
/// Both are output paths; only their components are compared.
pub fn relative_href(from: &Path, to: &Path) -> String {
    let base: Vec<Component> = from
        .parent()
        .map(|p| p.components().collect())
        .unwrap_or_default();
    let target: Vec<Component> = to.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base.len() {
        parts.push(String::from(".."));
    }
    for component in &target[common..] {
        let segment = component.as_os_str().to_string_lossy();
        parts.push(utf8_percent_encode(&segment, SEGMENT).to_string());
    }
    parts.join("/")
}

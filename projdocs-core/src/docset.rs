//! Discovery of the documents belonging to one suffix group.

use crate::builder::BuildError;
use crate::config::Config;
use crate::document::Document;
use crate::group::SuffixGroup;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The documents of one group, discovered once and iterable many times
#[derive(Debug, Clone)]
pub struct DocumentSet {
    group_index: usize,
    group: SuffixGroup,
    documents: Vec<Document>,
}

impl DocumentSet {
    /// Walk every library root and collect the files owned by the group
    pub fn discover(config: &Config, group_index: usize) -> Result<Self, BuildError> {
        let group = config.groups()[group_index].clone();
        let mut documents = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for root in config.library_roots() {
            if !root.is_dir() {
                return Err(BuildError::LibraryRoot(root.clone()));
            }
            // The walker reports an unreadable root as an ordinary entry error
            fs::read_dir(root).map_err(|source| BuildError::UnreadableRoot {
                path: root.clone(),
                source,
            })?;

            let walker = WalkDir::new(root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !config.is_generated_tree(root, e.path()));

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!("Skipping unreadable entry: {}", err);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }

                let path = entry.path();
                if config.owning_group(path) != Some(group_index) {
                    continue;
                }

                let Some(relative) = relative_slash_path(root, path) else {
                    continue;
                };
                if config.is_excluded(&relative) {
                    tracing::debug!("Excluding {}", relative);
                    continue;
                }

                let mtime = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
                    Some(mtime) => mtime,
                    None => {
                        tracing::warn!("Cannot read modification time of {}", path.display());
                        continue;
                    }
                };

                match Document::from_source(config, &group, root, path, mtime) {
                    Some(doc) => {
                        if seen.insert(doc.relative_path().to_path_buf()) {
                            documents.push(doc);
                        } else {
                            tracing::warn!(
                                "Skipping {}: {} already provided by an earlier library root",
                                path.display(),
                                relative
                            );
                        }
                    }
                    None => {
                        tracing::warn!("Skipping {}: path escapes the output root", path.display())
                    }
                }
            }
        }

        tracing::debug!(
            "Discovered {} documents for {}",
            documents.len(),
            group.description
        );

        Ok(Self {
            group_index,
            group,
            documents,
        })
    }

    /// One set per registered group, in registration order
    pub fn discover_all(config: &Config) -> Result<Vec<Self>, BuildError> {
        (0..config.groups().len())
            .map(|idx| Self::discover(config, idx))
            .collect()
    }

    pub fn group_index(&self) -> usize {
        self.group_index
    }

    pub fn group(&self) -> &SuffixGroup {
        &self.group
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Document> {
        self.documents.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<'a> IntoIterator for &'a DocumentSet {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use tempfile::{tempdir, TempDir};

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "=head1 NAME\n").unwrap();
    }

    fn config_for(dir: &TempDir, libs: &[&str], exclude: &[&str]) -> Config {
        let libraries = libs.iter().map(|l| dir.path().join(l)).collect();
        let mut settings = Settings::for_paths(dir.path().join("docs"), libraries);
        settings.exclude = exclude.iter().map(|s| s.to_string()).collect();
        settings.resolve().unwrap()
    }

    fn names(set: &DocumentSet) -> Vec<String> {
        set.iter().map(|d| d.name().to_string()).collect()
    }

    #[test]
    fn test_depth_first_lexicographic_order() {
        let dir = tempdir().unwrap();
        let lib = dir.path().join("lib");
        for rel in ["Zed.pm", "Acme/Beta.pm", "Acme.pm", "Acme/Alpha.pm", "Acme/Sub/Deep.pm"] {
            touch(&lib, rel);
        }
        let config = config_for(&dir, &["lib"], &[]);
        let set = DocumentSet::discover(&config, 0).unwrap();
        assert_eq!(
            names(&set),
            vec![
                "Acme::Alpha",
                "Acme::Beta",
                "Acme::Sub::Deep",
                "Acme",
                "Zed"
            ]
        );
    }

    #[test]
    fn test_groups_partition_files_by_suffix() {
        let dir = tempdir().unwrap();
        let lib = dir.path().join("lib");
        touch(&lib, "Acme.pm");
        touch(&lib, "Acme/Guide.pod");
        touch(&lib, "bin/tool.pl");
        touch(&lib, "README");

        let config = config_for(&dir, &["lib"], &[]);
        let sets = DocumentSet::discover_all(&config).unwrap();
        assert_eq!(names(&sets[0]), vec!["Acme"]);
        assert_eq!(names(&sets[1]), vec!["Acme::Guide"]);
        assert_eq!(names(&sets[2]), vec!["bin/tool.pl"]);
        assert!(sets[3].is_empty());
    }

    #[test]
    fn test_exclusion_patterns_apply_to_relative_paths() {
        let dir = tempdir().unwrap();
        let lib = dir.path().join("lib");
        touch(&lib, "Acme/Public.pm");
        touch(&lib, "Acme/Internal/Secret.pm");

        let config = config_for(&dir, &["lib"], &["Internal/"]);
        let set = DocumentSet::discover(&config, 0).unwrap();
        assert_eq!(names(&set), vec!["Acme::Public"]);
    }

    #[test]
    fn test_multiple_roots_first_wins_on_duplicates() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("lib"), "Acme/One.pm");
        touch(&dir.path().join("lib"), "Acme/Shared.pm");
        touch(&dir.path().join("vendor"), "Acme/Shared.pm");
        touch(&dir.path().join("vendor"), "Vendored.pm");

        let config = config_for(&dir, &["lib", "vendor"], &[]);
        let set = DocumentSet::discover(&config, 0).unwrap();
        assert_eq!(names(&set), vec!["Acme::One", "Acme::Shared", "Vendored"]);
        let shared = set.iter().find(|d| d.name() == "Acme::Shared").unwrap();
        assert!(shared.source_path().starts_with(&config.library_roots()[0]));
    }

    #[test]
    fn test_generated_trees_are_not_rediscovered() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "Acme.pm");
        touch(dir.path(), "docs/src/Acme.pm");
        touch(dir.path(), "docs/Stray.pm");

        let config = config_for(&dir, &["."], &[]);
        let set = DocumentSet::discover(&config, 0).unwrap();
        assert_eq!(names(&set), vec!["Acme"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycles_and_dangling_links_are_skipped() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let lib = dir.path().join("lib");
        touch(&lib, "A/Ok.pm");
        symlink(&lib, lib.join("A/loop")).unwrap();
        symlink(lib.join("Missing.pm"), lib.join("Dangling.pm")).unwrap();

        let config = config_for(&dir, &["lib"], &[]);
        let set = DocumentSet::discover(&config, 0).unwrap();
        assert_eq!(names(&set), vec!["A::Ok"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_root_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let lib = dir.path().join("lib");
        touch(&lib, "A.pm");
        let config = config_for(&dir, &["lib"], &[]);

        fs::set_permissions(&lib, fs::Permissions::from_mode(0o000)).unwrap();
        let readable = fs::read_dir(&lib).is_ok();
        let result = DocumentSet::discover(&config, 0);
        fs::set_permissions(&lib, fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users bypass permission bits
        if !readable {
            assert!(matches!(result, Err(BuildError::UnreadableRoot { .. })));
        }
    }

    #[test]
    fn test_set_is_restartable() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("lib"), "A.pm");
        touch(&dir.path().join("lib"), "B.pm");
        let config = config_for(&dir, &["lib"], &[]);
        let set = DocumentSet::discover(&config, 0).unwrap();

        let first: Vec<_> = set.iter().map(|d| d.name().to_string()).collect();
        let second: Vec<_> = (&set).into_iter().map(|d| d.name().to_string()).collect();
        assert_eq!(first, second);
        assert_eq!(set.len(), 2);
    }
}

//! Navigation model handed to the index renderer.

use crate::document::Document;
use crate::group::SuffixGroup;
use crate::references::encode_href;
use serde::Serialize;

/// One published document as listed in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationRecord {
    pub group_description: String,
    /// Output path relative to the output root
    pub path: String,
    pub name: String,
    pub title: String,
}

impl NavigationRecord {
    /// `path` as a link target
    pub fn href(&self) -> String {
        encode_href(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationGroup {
    pub description: String,
    pub records: Vec<NavigationRecord>,
}

/// Collects records per group while the render pass runs
#[derive(Debug)]
pub struct IndexAggregator {
    groups: Vec<NavigationGroup>,
}

impl IndexAggregator {
    pub fn new(groups: &[SuffixGroup]) -> Self {
        Self {
            groups: groups
                .iter()
                .map(|g| NavigationGroup {
                    description: g.description.clone(),
                    records: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn record(&mut self, group_index: usize, document: &Document) {
        let Some(group) = self.groups.get_mut(group_index) else {
            return;
        };
        group.records.push(NavigationRecord {
            group_description: group.description.clone(),
            path: document.output_rel_path().to_string(),
            name: document.name().to_string(),
            title: document.title().to_string(),
        });
    }

    /// Groups in registration order, empty ones dropped
    pub fn finish(self) -> Vec<NavigationGroup> {
        self.groups
            .into_iter()
            .filter(|g| !g.records.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::group::default_groups;
    use std::time::SystemTime;
    use tempfile::tempdir;

    #[test]
    fn test_empty_groups_are_omitted_and_order_kept() {
        let dir = tempdir().unwrap();
        let config = Settings::for_paths(dir.path().join("out"), vec![dir.path().to_path_buf()])
            .resolve()
            .unwrap();
        let groups = default_groups();
        let root = config.library_roots()[0].clone();

        let doc = |group: usize, rel: &str| {
            Document::from_source(
                &config,
                &groups[group],
                &root,
                &root.join(rel),
                SystemTime::now(),
            )
            .unwrap()
        };

        let mut aggregator = IndexAggregator::new(&groups);
        aggregator.record(2, &doc(2, "bin/tool.pl"));
        aggregator.record(0, &doc(0, "Acme/B.pm"));
        aggregator.record(0, &doc(0, "Acme/A.pm"));
        let index = aggregator.finish();

        let summary: Vec<(String, Vec<String>)> = index
            .iter()
            .map(|g| {
                (
                    g.description.clone(),
                    g.records.iter().map(|r| r.name.clone()).collect(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Modules".to_string(), vec!["Acme::B".to_string(), "Acme::A".to_string()]),
                ("Scripts".to_string(), vec!["bin/tool.pl".to_string()]),
            ]
        );
        assert_eq!(index[0].records[0].path, "Acme/B.pm.html");
        assert_eq!(index[0].records[0].title, "Acme::B");
    }
}

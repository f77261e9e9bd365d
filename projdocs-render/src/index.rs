//! Top-level `index.html` and `index.json` from the navigation model.

use crate::{write_if_changed, RenderError};
use askama::Template;
use projdocs_core::{NavigationGroup, ProjectMeta};
use serde::Serialize;
use std::path::Path;

/// Site index page template
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub language: &'a str,
    pub groups: &'a [NavigationGroup],
}

#[derive(Serialize)]
struct NavigationDocument<'a> {
    title: &'a str,
    description: &'a str,
    groups: &'a [NavigationGroup],
}

pub fn render_index(
    project: &ProjectMeta,
    groups: &[NavigationGroup],
) -> Result<String, RenderError> {
    let template = IndexTemplate {
        title: &project.title,
        description: &project.description,
        language: &project.language,
        groups,
    };
    Ok(template.render()?)
}

/// Pretty-printed navigation model
pub fn navigation_json(
    project: &ProjectMeta,
    groups: &[NavigationGroup],
) -> Result<String, RenderError> {
    let document = NavigationDocument {
        title: &project.title,
        description: &project.description,
        groups,
    };
    let mut json = serde_json::to_string_pretty(&document)?;
    json.push('\n');
    Ok(json)
}

/// Write `index.html` and `index.json`; returns how many files changed
pub fn write_index(
    output_root: &Path,
    project: &ProjectMeta,
    groups: &[NavigationGroup],
) -> Result<usize, RenderError> {
    let html = render_index(project, groups)?;
    let json = navigation_json(project, groups)?;

    let mut written = 0;
    if write_if_changed(&output_root.join("index.html"), html.as_bytes())? {
        written += 1;
    }
    if write_if_changed(&output_root.join("index.json"), json.as_bytes())? {
        written += 1;
    }

    tracing::info!(
        "Index lists {} documents in {} groups",
        groups.iter().map(|g| g.records.len()).sum::<usize>(),
        groups.len()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projdocs_core::NavigationRecord;
    use tempfile::tempdir;

    fn project() -> ProjectMeta {
        ProjectMeta {
            title: "Acme".to_string(),
            description: "Acme & friends".to_string(),
            language: "en".to_string(),
        }
    }

    fn groups() -> Vec<NavigationGroup> {
        let record = |name: &str, path: &str, title: &str| NavigationRecord {
            group_description: "Modules".to_string(),
            path: path.to_string(),
            name: name.to_string(),
            title: title.to_string(),
        };
        vec![NavigationGroup {
            description: "Modules".to_string(),
            records: vec![
                record("Acme::Alpha", "Acme/Alpha.pm.html", "first <letter>"),
                record("Zed", "Zed.pm.html", "Zed"),
            ],
        }]
    }

    #[test]
    fn test_index_lists_groups_and_escapes_titles() {
        let html = render_index(&project(), &groups()).unwrap();
        assert!(html.contains("<title>Acme</title>"));
        assert!(html.contains("Acme &#38; friends"));
        assert!(html.contains("<h2>Modules</h2>"));
        assert!(html.contains(r#"<a href="Acme/Alpha.pm.html">Acme::Alpha</a>"#));
        assert!(html.contains("first &#60;letter&#62;"));
        assert!(!html.contains("<letter>"));
        // Titles equal to the name are not repeated
        assert!(!html.contains(r#"<span class="record-title">Zed</span>"#));
    }

    #[test]
    fn test_index_links_are_percent_encoded() {
        let mut groups = groups();
        groups[0].records[1].path = "bin/run me#2.pl.html".to_string();
        let html = render_index(&project(), &groups).unwrap();
        assert!(html.contains(r#"<a href="bin/run%20me%232.pl.html">Zed</a>"#));

        let json = navigation_json(&project(), &groups).unwrap();
        assert!(json.contains(r#""path": "bin/run me#2.pl.html""#));
    }

    #[test]
    fn test_navigation_json_shape() {
        let json = navigation_json(&project(), &groups()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["title"], "Acme");
        assert_eq!(value["groups"][0]["description"], "Modules");
        assert_eq!(value["groups"][0]["records"][0]["path"], "Acme/Alpha.pm.html");
        assert_eq!(value["groups"][0]["records"][1]["name"], "Zed");
    }

    #[test]
    fn test_empty_navigation_json() {
        let project = ProjectMeta {
            title: "T".to_string(),
            ..Default::default()
        };
        let json = navigation_json(&project, &[]).unwrap();
        insta::assert_snapshot!(json.trim_end(), @r###"
        {
          "title": "T",
          "description": "",
          "groups": []
        }
        "###);
    }

    #[test]
    fn test_unchanged_index_is_not_rewritten() {
        let dir = tempdir().unwrap();
        assert_eq!(write_index(dir.path(), &project(), &groups()).unwrap(), 2);
        assert_eq!(write_index(dir.path(), &project(), &groups()).unwrap(), 0);
        assert!(dir.path().join("index.json").is_file());
    }
}

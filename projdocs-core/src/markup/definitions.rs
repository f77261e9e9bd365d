//! Definition extraction for the per-page sidebar.

use super::tree::{Block, DocumentTree, HeadingNode};
use crate::group::DefinitionRule;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionEntry {
    pub name: String,
    pub anchor: String,
}

/// Sub-headings and definition terms matching the rule, in document order
pub fn extract(rule: &DefinitionRule, tree: &DocumentTree) -> Vec<DefinitionEntry> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    for child in &tree.root.children {
        visit(rule, child, &mut entries, &mut seen);
    }
    entries
}

fn visit(
    rule: &DefinitionRule,
    node: &HeadingNode,
    entries: &mut Vec<DefinitionEntry>,
    seen: &mut HashSet<String>,
) {
    if node.level >= 2 {
        consider(rule, &node.plain_title(), &node.anchor, entries, seen);
    }
    terms(rule, &node.blocks, entries, seen);
    for child in &node.children {
        visit(rule, child, entries, seen);
    }
}

fn terms(
    rule: &DefinitionRule,
    blocks: &[Block],
    entries: &mut Vec<DefinitionEntry>,
    seen: &mut HashSet<String>,
) {
    for block in blocks {
        match block {
            Block::Definitions(definitions) => {
                for definition in definitions {
                    let term = super::inline::plain_text(&definition.term);
                    consider(rule, &term, &definition.anchor, entries, seen);
                    terms(rule, &definition.blocks, entries, seen);
                }
            }
            Block::List { items, .. } => {
                for item in items {
                    terms(rule, &item.blocks, entries, seen);
                }
            }
            _ => {}
        }
    }
}

fn consider(
    rule: &DefinitionRule,
    text: &str,
    anchor: &str,
    entries: &mut Vec<DefinitionEntry>,
    seen: &mut HashSet<String>,
) {
    let text = text.trim();
    let Some(captures) = rule.pattern.captures(text) else {
        return;
    };
    let name = captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    if name.is_empty() || !seen.insert(name.clone()) {
        return;
    }
    entries.push(DefinitionEntry {
        name,
        anchor: anchor.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::DEFAULT_METHOD_PATTERN;
    use crate::markup::lexer::tokenize;
    use regex::Regex;

    fn methods() -> DefinitionRule {
        DefinitionRule {
            pattern: Regex::new(DEFAULT_METHOD_PATTERN).unwrap(),
            label: "Methods".to_string(),
        }
    }

    fn names(markup: &str) -> Vec<String> {
        let tree = DocumentTree::build(tokenize(markup));
        extract(&methods(), &tree)
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    #[test]
    fn test_headings_and_terms_in_document_order() {
        let markup = "=head1 METHODS\n\n=head2 new( %args )\n\n=over\n\n=item $obj->render\n\n=item Acme::Widget::reset()\n\n=back\n\n=head2 This is prose, not a method\n\n=head2 run\n";
        assert_eq!(names(markup), vec!["new", "render", "reset", "run"]);
    }

    #[test]
    fn test_top_level_headings_are_not_definitions() {
        assert!(names("=head1 METHODS\n\n=head1 new\n").is_empty());
    }

    #[test]
    fn test_duplicates_keep_first_anchor() {
        let tree = DocumentTree::build(tokenize("=head1 M\n\n=head2 new\n\n=head2 new()\n"));
        let entries = extract(&methods(), &tree);
        assert_eq!(
            entries,
            vec![DefinitionEntry {
                name: "new".into(),
                anchor: "new".into()
            }]
        );
    }
}

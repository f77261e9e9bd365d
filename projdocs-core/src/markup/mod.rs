//! Embedded documentation markup: extraction, parsing and page rendering.

pub mod definitions;
pub mod html;
pub mod inline;
pub mod lexer;
pub mod tree;

use crate::config::ProjectMeta;
use crate::document::Document;
use crate::group::{DefinitionRule, MarkupSyntax, SuffixGroup};
use crate::references::ReferenceMap;
use askama::Template;
use definitions::DefinitionEntry;
use html::{render_toc, HtmlWriter};
use inline::InlineRenderer;

pub use tree::DocumentTree;

/// Full page template
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate<'a> {
    pub language: &'a str,
    pub title: &'a str,
    pub name: &'a str,
    pub project_title: &'a str,
    pub project_description: &'a str,

    // Path adjustments (for nested pages)
    pub asset_prefix: &'a str,
    pub source_href: Option<String>,

    pub toc_html: Option<String>,
    pub definitions: Vec<DefinitionEntry>,
    pub definitions_label: &'a str,

    pub content: String,
}

/// Result of rendering one document
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub title: String,
    pub html: String,
}

/// Parser configured for one suffix group
#[derive(Debug, Clone)]
pub struct Parser {
    syntax: MarkupSyntax,
    definitions: Option<DefinitionRule>,
}

impl Parser {
    pub fn new(group: &SuffixGroup) -> Self {
        Self {
            syntax: group.syntax,
            definitions: group.definitions.clone(),
        }
    }

    pub fn parse(&self, source: &str) -> DocumentTree {
        DocumentTree::build(lexer::tokenize(&lexer::extract(source, self.syntax)))
    }

    /// Title only, for documents that are not re-rendered
    pub fn title(&self, source: &str, document: &Document) -> String {
        self.parse(source)
            .title()
            .unwrap_or_else(|| document.name().to_string())
    }

    /// Render a complete HTML page for `document`
    pub fn render(
        &self,
        document: &Document,
        source: &str,
        references: &ReferenceMap,
        project: &ProjectMeta,
    ) -> Result<RenderedPage, askama::Error> {
        let tree = self.parse(source);
        let title = tree
            .title()
            .unwrap_or_else(|| document.name().to_string());

        let asset_prefix = document.asset_prefix();
        let inline = InlineRenderer::new(references, document.output_path(), document.name());
        let content = HtmlWriter::new(&inline, &asset_prefix).render(&tree.root);

        let (definitions, definitions_label) = match &self.definitions {
            Some(rule) => (definitions::extract(rule, &tree), rule.label.as_str()),
            None => (Vec::new(), ""),
        };

        let page = PageTemplate {
            language: &project.language,
            title: &title,
            name: document.name(),
            project_title: &project.title,
            project_description: &project.description,
            asset_prefix: &asset_prefix,
            source_href: document.source_href(),
            toc_html: render_toc(&tree.root),
            definitions,
            definitions_label,
            content,
        };
        let html = page.render()?;

        Ok(RenderedPage { title, html })
    }
}

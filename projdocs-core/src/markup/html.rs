//! HTML emission for parsed documents.

use super::inline::InlineRenderer;
use super::tree::{Block, HeadingNode};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Writes page bodies: headings with anchors, blocks, and inline text
pub struct HtmlWriter<'a> {
    inline: &'a InlineRenderer<'a>,
    asset_prefix: &'a str,
    out: String,
}

impl<'a> HtmlWriter<'a> {
    pub fn new(inline: &'a InlineRenderer<'a>, asset_prefix: &'a str) -> Self {
        Self {
            inline,
            asset_prefix,
            out: String::new(),
        }
    }

    /// Render the synthetic root and every heading beneath it
    pub fn render(mut self, root: &HeadingNode) -> String {
        self.blocks(&root.blocks);
        for child in &root.children {
            self.heading(child);
        }
        self.out
    }

    fn heading(&mut self, node: &HeadingNode) {
        let level = node.level.clamp(1, 6);
        let anchor = escape(&node.anchor);
        self.out.push_str(&format!(
            "<h{level} id=\"{anchor}\" name=\"{anchor}\">{}<a href=\"#TOP\" class=\"toplink\"><img alt=\"^\" src=\"{}up.svg\"></a></h{level}>\n",
            self.inline.render(&node.title),
            self.asset_prefix,
        ));
        self.blocks(&node.blocks);
        for child in &node.children {
            self.heading(child);
        }
    }

    fn blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.block(block);
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(text) => {
                self.out.push_str("<p>");
                self.out.push_str(&self.inline.render(text.trim()));
                self.out.push_str("</p>\n");
            }
            Block::Verbatim(text) => {
                self.out.push_str("<pre>");
                self.out.push_str(&escape(&dedent(text)));
                self.out.push_str("</pre>\n");
            }
            Block::List { ordered, items } => {
                let tag = if *ordered { "ol" } else { "ul" };
                self.out.push_str(&format!("<{}>\n", tag));
                for item in items {
                    self.out.push_str("<li>");
                    self.list_item_blocks(&item.blocks);
                    self.out.push_str("</li>\n");
                }
                self.out.push_str(&format!("</{}>\n", tag));
            }
            Block::Definitions(definitions) => {
                self.out.push_str("<dl>\n");
                for definition in definitions {
                    let anchor = escape(&definition.anchor);
                    self.out.push_str(&format!(
                        "<dt id=\"{anchor}\" name=\"{anchor}\">{}</dt>\n<dd>",
                        self.inline.render(&definition.term)
                    ));
                    self.blocks(&definition.blocks);
                    self.out.push_str("</dd>\n");
                }
                self.out.push_str("</dl>\n");
            }
            Block::Html(raw) => {
                self.out.push_str(raw);
                self.out.push('\n');
            }
        }
    }

    /// A lone leading paragraph in a list item is rendered without `<p>`
    fn list_item_blocks(&mut self, blocks: &[Block]) {
        match blocks {
            [Block::Paragraph(text)] => self.out.push_str(&self.inline.render(text.trim())),
            _ => self.blocks(blocks),
        }
    }
}

/// Strip the run of leading spaces shared by every non-blank line
fn dedent(text: &str) -> String {
    let text = text.replace('\t', "        ");
    let leading = |l: &str| l.len() - l.trim_start_matches(' ').len();
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(leading)
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|l| &l[leading(l).min(indent)..])
        .collect::<Vec<_>>()
        .join("\n")
}

/// Nested contents list, or `None` when the page has no headings
pub fn render_toc(root: &HeadingNode) -> Option<String> {
    if root.children.is_empty() {
        return None;
    }
    let mut html = String::from(r#"<nav class="toc-nav"><h3>Contents</h3>"#);
    toc_list(&root.children, &mut html);
    html.push_str("</nav>");
    Some(html)
}

fn toc_list(nodes: &[HeadingNode], html: &mut String) {
    html.push_str(r#"<ul class="toc-list">"#);
    for node in nodes {
        html.push_str(&format!(
            r##"<li class="toc-level-{}"><a href="#{}">{}</a>"##,
            node.level,
            escape(&node.anchor),
            escape(&node.plain_title())
        ));
        if !node.children.is_empty() {
            toc_list(&node.children, html);
        }
        html.push_str("</li>");
    }
    html.push_str("</ul>");
}

//! Heading tree construction from markup paragraphs.

use super::inline::plain_text;
use super::lexer::Token;
use crate::slug::AnchorRegistry;

/// A heading and everything under it; the root is a synthetic level 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingNode {
    pub level: u8,
    pub anchor: String,
    /// Raw title markup
    pub title: String,
    pub blocks: Vec<Block>,
    pub children: Vec<HeadingNode>,
}

impl HeadingNode {
    fn root() -> Self {
        Self::new(0, String::new(), String::new())
    }

    fn new(level: u8, anchor: String, title: String) -> Self {
        Self {
            level,
            anchor,
            title,
            blocks: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Title with formatting codes flattened
    pub fn plain_title(&self) -> String {
        plain_text(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Raw paragraph markup, formatted by the inline pass
    Paragraph(String),
    Verbatim(String),
    List { ordered: bool, items: Vec<ListItem> },
    Definitions(Vec<Definition>),
    /// Contents of an `=begin html` region
    Html(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub term: String,
    pub anchor: String,
    pub blocks: Vec<Block>,
}

/// Parsed document: the synthetic root and its heading hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    pub root: HeadingNode,
}

impl DocumentTree {
    pub fn build(tokens: Vec<Token>) -> Self {
        let mut builder = TreeBuilder::new();
        for token in tokens {
            builder.token(token);
        }
        builder.finish()
    }

    /// Every heading in document order
    pub fn headings(&self) -> Vec<&HeadingNode> {
        fn walk<'a>(node: &'a HeadingNode, out: &mut Vec<&'a HeadingNode>) {
            for child in &node.children {
                out.push(child);
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    /// Title from a leading `NAME` section, else the first level-1 heading
    pub fn title(&self) -> Option<String> {
        let first = self.root.children.iter().find(|h| h.level == 1)?;
        let heading = first.plain_title();

        if heading.trim().eq_ignore_ascii_case("NAME") {
            let paragraph = first.blocks.iter().find_map(|b| match b {
                Block::Paragraph(text) => Some(text),
                _ => None,
            });
            if let Some(text) = paragraph {
                let text = collapse_whitespace(&plain_text(text));
                let title = match text.split_once(" - ") {
                    Some((_, description)) => description.trim().to_string(),
                    None => text,
                };
                if !title.is_empty() {
                    return Some(title);
                }
            }
        }

        let heading = collapse_whitespace(&heading);
        if heading.is_empty() {
            None
        } else {
            Some(heading)
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Number,
    Definition,
}

#[derive(Debug, Default)]
struct ListFrame {
    kind: Option<ListKind>,
    items: Vec<ItemFrame>,
    /// Blocks seen before the first item
    loose: Vec<Block>,
}

#[derive(Debug)]
struct ItemFrame {
    term: Option<(String, String)>,
    blocks: Vec<Block>,
}

struct FormatRegion {
    html: bool,
    buffer: Vec<String>,
}

struct TreeBuilder {
    anchors: AnchorRegistry,
    headings: Vec<HeadingNode>,
    lists: Vec<ListFrame>,
    format: Option<FormatRegion>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            anchors: AnchorRegistry::new(),
            headings: vec![HeadingNode::root()],
            lists: Vec::new(),
            format: None,
        }
    }

    fn token(&mut self, token: Token) {
        if self.format.is_some() {
            let (is_end, is_heading) = match &token {
                Token::Command { name, .. } => (name == "end", name.starts_with("head")),
                _ => (false, false),
            };
            if is_end || is_heading {
                self.close_format();
                if is_heading {
                    self.token(token);
                }
                return;
            }

            let raw = match token {
                Token::Command { name, text } => format!("={} {}", name, text),
                Token::Verbatim(text) | Token::Text(text) => text,
            };
            if let Some(region) = self.format.as_mut() {
                region.buffer.push(raw);
            }
            return;
        }

        match token {
            Token::Command { name, text } => self.command(&name, text),
            Token::Verbatim(text) => self.push_block(Block::Verbatim(text)),
            Token::Text(text) => self.push_block(Block::Paragraph(text)),
        }
    }

    fn command(&mut self, name: &str, text: String) {
        if let Some(level) = name.strip_prefix("head") {
            match level.parse::<u8>() {
                Ok(level) if level > 0 => self.heading(level, text),
                _ => tracing::debug!("Ignoring unknown heading command ={}", name),
            }
            return;
        }

        match name {
            "over" => self.lists.push(ListFrame::default()),
            "item" => self.item(text),
            "back" => {
                if !self.lists.is_empty() {
                    self.close_list();
                }
            }
            "begin" => {
                let format = text.split_whitespace().next().unwrap_or_default();
                self.format = Some(FormatRegion {
                    html: is_html_format(format),
                    buffer: Vec::new(),
                });
            }
            "for" => {
                let (format, content) = text
                    .split_once(char::is_whitespace)
                    .unwrap_or((text.as_str(), ""));
                if is_html_format(format) {
                    self.push_block(Block::Html(content.trim().to_string()));
                }
            }
            "pod" | "cut" | "encoding" | "end" => {}
            other => tracing::debug!("Ignoring unknown command ={}", other),
        }
    }

    fn heading(&mut self, level: u8, title: String) {
        self.close_all_lists();

        while self.headings.len() > 1 && self.headings.last().is_some_and(|h| h.level >= level) {
            self.pop_heading();
        }

        let anchor = self.anchors.claim(&plain_text(&title));
        self.headings.push(HeadingNode::new(level, anchor, title));
    }

    fn pop_heading(&mut self) {
        if let Some(node) = self.headings.pop() {
            if let Some(parent) = self.headings.last_mut() {
                parent.children.push(node);
            }
        }
    }

    fn item(&mut self, text: String) {
        if self.lists.is_empty() {
            self.lists.push(ListFrame::default());
        }

        let kind = match self.lists.last_mut() {
            Some(frame) => *frame.kind.get_or_insert_with(|| classify_item(&text)),
            None => return,
        };

        let item = match kind {
            ListKind::Bullet => ItemFrame {
                term: None,
                blocks: leading_paragraph(strip_bullet(&text)),
            },
            ListKind::Number => ItemFrame {
                term: None,
                blocks: leading_paragraph(strip_number(&text)),
            },
            ListKind::Definition => {
                let anchor = self.anchors.claim(&plain_text(&text));
                ItemFrame {
                    term: Some((text, anchor)),
                    blocks: Vec::new(),
                }
            }
        };

        if let Some(frame) = self.lists.last_mut() {
            frame.items.push(item);
        }
    }

    fn push_block(&mut self, block: Block) {
        if let Some(frame) = self.lists.last_mut() {
            match frame.items.last_mut() {
                Some(item) => item.blocks.push(block),
                None => frame.loose.push(block),
            }
        } else if let Some(heading) = self.headings.last_mut() {
            heading.blocks.push(block);
        }
    }

    fn close_list(&mut self) {
        let Some(frame) = self.lists.pop() else {
            return;
        };

        for block in frame.loose {
            self.push_block(block);
        }
        if frame.items.is_empty() {
            return;
        }

        let block = match frame.kind {
            Some(ListKind::Definition) => Block::Definitions(
                frame
                    .items
                    .into_iter()
                    .map(|item| {
                        let (term, anchor) = item.term.unwrap_or_default();
                        Definition {
                            term,
                            anchor,
                            blocks: item.blocks,
                        }
                    })
                    .collect(),
            ),
            kind => Block::List {
                ordered: kind == Some(ListKind::Number),
                items: frame
                    .items
                    .into_iter()
                    .map(|item| ListItem {
                        blocks: item.blocks,
                    })
                    .collect(),
            },
        };
        self.push_block(block);
    }

    fn close_all_lists(&mut self) {
        while !self.lists.is_empty() {
            self.close_list();
        }
    }

    fn close_format(&mut self) {
        if let Some(region) = self.format.take() {
            if region.html && !region.buffer.is_empty() {
                self.push_block(Block::Html(region.buffer.join("\n\n")));
            }
        }
    }

    fn finish(mut self) -> DocumentTree {
        self.close_format();
        self.close_all_lists();
        while self.headings.len() > 1 {
            self.pop_heading();
        }
        let root = self.headings.pop().unwrap_or_else(HeadingNode::root);
        DocumentTree { root }
    }
}

fn is_html_format(format: &str) -> bool {
    format.trim_start_matches(':').eq_ignore_ascii_case("html")
}

fn classify_item(text: &str) -> ListKind {
    let text = text.trim();
    let mut chars = text.chars();
    match chars.next() {
        None => ListKind::Bullet,
        Some('*' | '-' | '+') if chars.next().map_or(true, char::is_whitespace) => ListKind::Bullet,
        Some(c) if c.is_ascii_digit() => {
            let rest = text.trim_start_matches(|c: char| c.is_ascii_digit());
            let rest = rest.strip_prefix('.').unwrap_or(rest);
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                ListKind::Number
            } else {
                ListKind::Definition
            }
        }
        _ => ListKind::Definition,
    }
}

fn strip_bullet(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix(['*', '-', '+']).unwrap_or(text).trim()
}

fn strip_number(text: &str) -> &str {
    let text = text.trim();
    let rest = text.trim_start_matches(|c: char| c.is_ascii_digit());
    rest.strip_prefix('.').unwrap_or(rest).trim()
}

fn leading_paragraph(text: &str) -> Vec<Block> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Block::Paragraph(text.to_string())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::MarkupSyntax;
    use crate::markup::lexer::{extract, tokenize};

    fn tree(markup: &str) -> DocumentTree {
        DocumentTree::build(tokenize(&extract(markup, MarkupSyntax::Pod)))
    }

    fn outline(node: &HeadingNode, depth: usize, out: &mut Vec<String>) {
        for child in &node.children {
            out.push(format!("{}{} #{}", "  ".repeat(depth), child.title, child.anchor));
            outline(child, depth + 1, out);
        }
    }

    #[test]
    fn test_headings_nest_by_level() {
        let doc = tree(
            "=head1 NAME\n\nx\n\n=head1 METHODS\n\n=head2 new\n\n=head3 args\n\n=head2 run\n\n=head1 AUTHOR\n",
        );
        let mut lines = Vec::new();
        outline(&doc.root, 0, &mut lines);
        assert_eq!(
            lines,
            vec![
                "NAME #name",
                "METHODS #methods",
                "  new #new",
                "    args #args",
                "  run #run",
                "AUTHOR #author",
            ]
        );
    }

    #[test]
    fn test_skipped_levels_attach_to_nearest_lower() {
        let doc = tree("=head2 Loose\n\n=head1 Top\n\n=head3 Deep\n");
        assert_eq!(doc.root.children.len(), 2);
        assert_eq!(doc.root.children[0].level, 2);
        assert_eq!(doc.root.children[1].children[0].title, "Deep");
    }

    #[test]
    fn test_duplicate_titles_get_distinct_anchors() {
        let doc = tree("=head1 Topic\n\n=head2 Topic\n\n=head1 Topic\n");
        let anchors: Vec<_> = doc.headings().iter().map(|h| h.anchor.clone()).collect();
        assert_eq!(anchors, vec!["topic", "topic-2", "topic-3"]);
    }

    #[test]
    fn test_list_kinds() {
        let doc = tree(
            "=head1 L\n\n=over 4\n\n=item * one\n\n=item * two\n\nmore\n\n=back\n\n=over\n\n=item 1. first\n\n=back\n\n=over\n\n=item verbose\n\nTalk more.\n\n=back\n",
        );
        let blocks = &doc.root.children[0].blocks;
        assert_eq!(
            blocks[0],
            Block::List {
                ordered: false,
                items: vec![
                    ListItem {
                        blocks: vec![Block::Paragraph("one".into())]
                    },
                    ListItem {
                        blocks: vec![
                            Block::Paragraph("two".into()),
                            Block::Paragraph("more".into())
                        ]
                    },
                ]
            }
        );
        assert_eq!(
            blocks[1],
            Block::List {
                ordered: true,
                items: vec![ListItem {
                    blocks: vec![Block::Paragraph("first".into())]
                }]
            }
        );
        assert_eq!(
            blocks[2],
            Block::Definitions(vec![Definition {
                term: "verbose".into(),
                anchor: "verbose".into(),
                blocks: vec![Block::Paragraph("Talk more.".into())],
            }])
        );
    }

    #[test]
    fn test_nested_lists_live_inside_items() {
        let doc = tree("=over\n\n=item * outer\n\n=over\n\n=item * inner\n\n=back\n\n=back\n");
        let Block::List { items, .. } = &doc.root.blocks[0] else {
            panic!("expected list");
        };
        assert!(matches!(items[0].blocks[1], Block::List { .. }));
    }

    #[test]
    fn test_unterminated_list_closes_at_next_heading() {
        let doc = tree("=head1 A\n\n=over\n\n=item * dangling\n\n=head1 B\n\nafter\n");
        assert!(matches!(doc.root.children[0].blocks[0], Block::List { .. }));
        assert_eq!(
            doc.root.children[1].blocks,
            vec![Block::Paragraph("after".into())]
        );
    }

    #[test]
    fn test_unterminated_list_closes_at_end_of_input() {
        let doc = tree("=head1 A\n\n=over\n\n=item * dangling\n");
        assert!(matches!(doc.root.children[0].blocks[0], Block::List { .. }));
    }

    #[test]
    fn test_over_without_items_keeps_blocks() {
        let doc = tree("=head1 A\n\n=over\n\nindented prose\n\n=back\n");
        assert_eq!(
            doc.root.children[0].blocks,
            vec![Block::Paragraph("indented prose".into())]
        );
    }

    #[test]
    fn test_html_regions() {
        let doc = tree(
            "=head1 A\n\n=begin html\n\n<b>raw</b>\n\n=end html\n\n=for html <i>inline</i>\n\n=begin text\n\nignored\n\n=end text\n",
        );
        assert_eq!(
            doc.root.children[0].blocks,
            vec![
                Block::Html("<b>raw</b>".into()),
                Block::Html("<i>inline</i>".into())
            ]
        );
    }

    #[test]
    fn test_title_from_name_section() {
        let doc =
            tree("=head1 NAME\n\nAcme::Widget - Widgets for B<everyone>\n\n=head1 DESCRIPTION\n");
        assert_eq!(doc.title().as_deref(), Some("Widgets for everyone"));
    }

    #[test]
    fn test_title_from_first_heading() {
        let doc = tree("=head1 Getting Started\n\ntext\n");
        assert_eq!(doc.title().as_deref(), Some("Getting Started"));
        assert_eq!(tree("no markup here").title(), None);
    }

    #[test]
    fn test_title_skips_leading_subheadings() {
        let doc = tree("=head2 Loose\n\n=head1 Top\n");
        assert_eq!(doc.title().as_deref(), Some("Top"));
        assert_eq!(tree("=head2 Only\n").title(), None);
    }

    #[test]
    fn test_item_classification() {
        assert_eq!(classify_item("*"), ListKind::Bullet);
        assert_eq!(classify_item("* text"), ListKind::Bullet);
        assert_eq!(classify_item(""), ListKind::Bullet);
        assert_eq!(classify_item("2."), ListKind::Number);
        assert_eq!(classify_item("10 text"), ListKind::Number);
        assert_eq!(classify_item("-verbose"), ListKind::Definition);
        assert_eq!(classify_item("2nd"), ListKind::Definition);
        assert_eq!(classify_item("new( %args )"), ListKind::Definition);
    }
}

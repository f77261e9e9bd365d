//! Inline formatting codes and module reference resolution.

use super::html::escape;
use crate::references::{relative_href, ReferenceMap};
use crate::slug::slugify;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Parsed inline markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Code(Vec<Inline>),
    File(Vec<Inline>),
    NonBreaking(Vec<Inline>),
    /// Decoded `E<...>` character(s)
    Escape(String),
    /// Named entity passed through as `&name;`
    Entity(String),
    /// Raw `L<...>` content, interpreted at render time
    Link(String),
}

static MODULE_REGEX: OnceLock<Regex> = OnceLock::new();
static MODULE_EXACT_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();

const MODULE_NAME: &str = r"[A-Za-z_][A-Za-z0-9_]*(?:::[A-Za-z_][A-Za-z0-9_]*)+";

fn module_regex() -> &'static Regex {
    MODULE_REGEX.get_or_init(|| Regex::new(MODULE_NAME).unwrap())
}

fn module_exact_regex() -> &'static Regex {
    MODULE_EXACT_REGEX.get_or_init(|| Regex::new(&format!("^{}$", MODULE_NAME)).unwrap())
}

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:[^:]").unwrap())
}

/// Whether `text` has the shape of a qualified module name
pub fn is_module_name(text: &str) -> bool {
    module_exact_regex().is_match(text)
}

/// Parse formatting codes; unclosed codes end with the text
pub fn parse(text: &str) -> Vec<Inline> {
    let mut scanner = Scanner {
        chars: text.chars().collect(),
        pos: 0,
    };
    scanner.sequence(Close::End).0
}

/// Text content with all formatting removed
pub fn plain_text(text: &str) -> String {
    let mut out = String::new();
    flatten(&parse(text), &mut out);
    out
}

fn flatten(nodes: &[Inline], out: &mut String) {
    for node in nodes {
        match node {
            Inline::Text(text) | Inline::Escape(text) => out.push_str(text),
            Inline::Entity(name) => {
                out.push('&');
                out.push_str(name);
                out.push(';');
            }
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Code(children)
            | Inline::File(children)
            | Inline::NonBreaking(children) => flatten(children, out),
            Inline::Link(raw) => {
                let link = LinkSpec::parse(raw);
                out.push_str(&link.default_text());
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Close {
    End,
    Single,
    Multi(usize),
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    /// Returns the nodes and the position where the content ended
    fn sequence(&mut self, close: Close) -> (Vec<Inline>, usize) {
        let mut nodes = Vec::new();
        let mut text = String::new();

        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            match close {
                Close::Single if c == '>' => {
                    let end = self.pos;
                    self.pos += 1;
                    push_text(&mut nodes, &mut text);
                    return (nodes, end);
                }
                Close::Multi(n) if c.is_whitespace() => {
                    if let Some(after) = self.multi_close_at(n) {
                        let end = self.pos;
                        self.pos = after;
                        push_text(&mut nodes, &mut text);
                        return (nodes, end);
                    }
                }
                _ => {}
            }

            if let Some((letter, inner)) = self.code_start() {
                push_text(&mut nodes, &mut text);
                let start = self.pos;
                let (children, end) = self.sequence(inner);
                let raw: String = self.chars[start..end].iter().collect();
                if let Some(node) = build_code(letter, children, raw) {
                    nodes.push(node);
                }
                continue;
            }

            text.push(c);
            self.pos += 1;
        }

        push_text(&mut nodes, &mut text);
        (nodes, self.chars.len())
    }

    /// Detect `X<` / `X<< ` at the cursor and step past the opener
    fn code_start(&mut self) -> Option<(char, Close)> {
        let letter = *self.chars.get(self.pos)?;
        if !"BICLEFSXZ".contains(letter) || self.chars.get(self.pos + 1) != Some(&'<') {
            return None;
        }

        let angles = self.chars[self.pos + 1..]
            .iter()
            .take_while(|&&c| c == '<')
            .count();
        let after = self.pos + 1 + angles;
        if angles > 1 && self.chars.get(after).is_some_and(|c| c.is_whitespace()) {
            self.pos = after;
            // `C<< >>` is empty; leave its whitespace for the closer
            if self.multi_close_at(angles).is_none() {
                while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
                    self.pos += 1;
                }
            }
            Some((letter, Close::Multi(angles)))
        } else {
            self.pos += 2;
            Some((letter, Close::Single))
        }
    }

    /// Position after a whitespace run followed by `n` closing angles
    fn multi_close_at(&self, n: usize) -> Option<usize> {
        let mut pos = self.pos;
        while self.chars.get(pos).is_some_and(|c| c.is_whitespace()) {
            pos += 1;
        }
        let closing = self.chars.get(pos..pos + n)?;
        if closing.iter().all(|&c| c == '>') {
            Some(pos + n)
        } else {
            None
        }
    }
}

fn push_text(nodes: &mut Vec<Inline>, text: &mut String) {
    if !text.is_empty() {
        nodes.push(Inline::Text(std::mem::take(text)));
    }
}

fn build_code(letter: char, children: Vec<Inline>, raw: String) -> Option<Inline> {
    match letter {
        'B' => Some(Inline::Bold(children)),
        'I' => Some(Inline::Italic(children)),
        'C' => Some(Inline::Code(children)),
        'F' => Some(Inline::File(children)),
        'S' => Some(Inline::NonBreaking(children)),
        'L' => Some(Inline::Link(raw.trim().to_string())),
        'E' => Some(decode_escape(raw.trim())),
        // X<> index entries and Z<> null codes render nothing
        _ => None,
    }
}

fn decode_escape(name: &str) -> Inline {
    let named = match name {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "verbar" => Some("|"),
        "sol" => Some("/"),
        "quot" => Some("\""),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "nbsp" => Some("\u{a0}"),
        _ => None,
    };
    if let Some(text) = named {
        return Inline::Escape(text.to_string());
    }

    let code = if let Some(hex) = name.strip_prefix("0x").or_else(|| name.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(octal) = name.strip_prefix('0').filter(|o| !o.is_empty()) {
        u32::from_str_radix(octal, 8).ok()
    } else if name.chars().all(|c| c.is_ascii_digit()) && !name.is_empty() {
        name.parse::<u32>().ok()
    } else {
        None
    };
    if let Some(c) = code.and_then(char::from_u32) {
        return Inline::Escape(c.to_string());
    }

    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric()) {
        Inline::Entity(name.to_string())
    } else {
        Inline::Text(format!("E<{}>", name))
    }
}

/// Target of an `L<...>` code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Url(String),
    /// A page (possibly empty for "this page") and an optional section
    Page {
        name: String,
        section: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    /// Explicit display text before `|`
    pub text: Option<String>,
    pub target: LinkTarget,
}

impl LinkSpec {
    pub fn parse(raw: &str) -> Self {
        let (text, target) = match split_display(raw) {
            Some((text, target)) => (Some(text.trim().to_string()), target.trim()),
            None => (None, raw.trim()),
        };

        if url_regex().is_match(target) {
            return Self {
                text,
                target: LinkTarget::Url(target.to_string()),
            };
        }

        let (name, section) = if target.starts_with('"') {
            ("", Some(target))
        } else {
            match target.split_once('/') {
                Some((name, section)) => (name.trim(), Some(section)),
                None => (target, None),
            }
        };
        let section = section
            .map(|s| s.trim().trim_matches('"').trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            text,
            target: LinkTarget::Page {
                name: name.to_string(),
                section,
            },
        }
    }

    /// Text shown when no explicit display text was given
    pub fn default_text(&self) -> String {
        if let Some(text) = &self.text {
            return plain_text(text);
        }
        match &self.target {
            LinkTarget::Url(url) => url.clone(),
            LinkTarget::Page { name, section } => match section {
                Some(section) if name.is_empty() => plain_text(section),
                Some(section) => format!("{} in {}", plain_text(section), name),
                None => name.clone(),
            },
        }
    }
}

/// Split `text|target` at the first `|` outside nested codes
fn split_display(raw: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (idx, c) in raw.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => return Some((&raw[..idx], &raw[idx + 1..])),
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, Copy, Default)]
struct Mode {
    in_code: bool,
    in_link: bool,
    non_breaking: bool,
}

/// Renders inline markup for one page.
///
/// `here` is the page's own output path, used to compute relative hrefs.
pub struct InlineRenderer<'a> {
    references: &'a ReferenceMap,
    here: &'a Path,
    own_name: &'a str,
}

impl<'a> InlineRenderer<'a> {
    pub fn new(references: &'a ReferenceMap, here: &'a Path, own_name: &'a str) -> Self {
        Self {
            references,
            here,
            own_name,
        }
    }

    pub fn render(&self, text: &str) -> String {
        let mut out = String::new();
        self.nodes(&parse(text), Mode::default(), &mut out);
        out
    }

    /// Href for a module, `None` for unknown modules and the page itself
    fn module_href(&self, name: &str) -> Option<String> {
        if name == self.own_name {
            return None;
        }
        let target = self.references.resolve(name)?;
        Some(relative_href(self.here, target))
    }

    fn nodes(&self, nodes: &[Inline], mode: Mode, out: &mut String) {
        for node in nodes {
            match node {
                Inline::Text(text) => {
                    if mode.in_code || mode.in_link {
                        emit_text(text, mode, out);
                    } else {
                        self.bare_references(text, mode, out);
                    }
                }
                Inline::Escape(text) => emit_text(text, mode, out),
                Inline::Entity(name) => {
                    out.push('&');
                    out.push_str(name);
                    out.push(';');
                }
                Inline::Bold(children) => self.wrap("strong", children, mode, out),
                Inline::Italic(children) => self.wrap("em", children, mode, out),
                Inline::File(children) => {
                    out.push_str("<em class=\"file\">");
                    self.nodes(children, mode, out);
                    out.push_str("</em>");
                }
                Inline::NonBreaking(children) => {
                    let inner = Mode {
                        non_breaking: true,
                        ..mode
                    };
                    self.nodes(children, inner, out);
                }
                Inline::Code(children) => self.code(children, mode, out),
                Inline::Link(raw) => self.link(raw, mode, out),
            }
        }
    }

    fn wrap(&self, tag: &str, children: &[Inline], mode: Mode, out: &mut String) {
        out.push('<');
        out.push_str(tag);
        out.push('>');
        self.nodes(children, mode, out);
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn code(&self, children: &[Inline], mode: Mode, out: &mut String) {
        let inner = Mode {
            in_code: true,
            ..mode
        };

        if !mode.in_link {
            let mut plain = String::new();
            flatten(children, &mut plain);
            if is_module_name(&plain) {
                if let Some(href) = self.module_href(&plain) {
                    out.push_str(&format!("<a href=\"{}\"><code>", escape(&href)));
                    self.nodes(children, inner, out);
                    out.push_str("</code></a>");
                    return;
                }
            }
        }

        out.push_str("<code>");
        self.nodes(children, inner, out);
        out.push_str("</code>");
    }

    /// Turn qualified module names in running text into links
    fn bare_references(&self, text: &str, mode: Mode, out: &mut String) {
        let mut last = 0;
        for m in module_regex().find_iter(text) {
            let preceded_by_sigil = text[..m.start()]
                .chars()
                .next_back()
                .is_some_and(|c| "$@%&*:".contains(c) || c.is_alphanumeric() || c == '_');
            if preceded_by_sigil {
                continue;
            }

            emit_text(&text[last..m.start()], mode, out);
            let name = m.as_str();
            match self.module_href(name) {
                Some(href) => {
                    out.push_str(&format!("<a href=\"{}\">", escape(&href)));
                    emit_text(name, mode, out);
                    out.push_str("</a>");
                }
                None => {
                    out.push_str("<code>");
                    emit_text(name, mode, out);
                    out.push_str("</code>");
                }
            }
            last = m.end();
        }
        emit_text(&text[last..], mode, out);
    }

    fn link(&self, raw: &str, mode: Mode, out: &mut String) {
        let spec = LinkSpec::parse(raw);
        let label_mode = Mode {
            in_link: true,
            ..mode
        };

        // No nested anchors: inside another link only the label survives
        if mode.in_link {
            self.link_label(&spec, label_mode, out);
            return;
        }

        let href = match &spec.target {
            LinkTarget::Url(url) => Some(url.clone()),
            LinkTarget::Page { name, section } => {
                let fragment = section.as_ref().map(|s| format!("#{}", slugify(&plain_text(s))));
                if name.is_empty() || name == self.own_name {
                    fragment
                } else {
                    self.module_href(name)
                        .map(|href| format!("{}{}", href, fragment.unwrap_or_default()))
                }
            }
        };

        match href {
            Some(href) => {
                out.push_str(&format!("<a href=\"{}\">", escape(&href)));
                self.link_label(&spec, label_mode, out);
                out.push_str("</a>");
            }
            None if spec.text.is_some() => self.link_label(&spec, label_mode, out),
            None => {
                out.push_str("<code>");
                emit_text(&spec.default_text(), label_mode, out);
                out.push_str("</code>");
            }
        }
    }

    fn link_label(&self, spec: &LinkSpec, mode: Mode, out: &mut String) {
        match &spec.text {
            Some(text) => self.nodes(&parse(text), mode, out),
            None => emit_text(&spec.default_text(), mode, out),
        }
    }
}

fn emit_text(text: &str, mode: Mode, out: &mut String) {
    let escaped = escape(text);
    if mode.non_breaking {
        out.push_str(&escaped.replace(' ', "&nbsp;"));
    } else {
        out.push_str(&escaped);
    }
}

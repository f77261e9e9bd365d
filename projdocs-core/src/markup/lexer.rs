//! Markup extraction and paragraph tokenization.

use crate::group::MarkupSyntax;

/// One markup paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `=name text`
    Command { name: String, text: String },
    /// Indented literal text; adjacent verbatim paragraphs are merged
    Verbatim(String),
    /// Ordinary paragraph text
    Text(String),
}

/// Pull the markup regions out of a source file
pub fn extract(source: &str, syntax: MarkupSyntax) -> String {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    match syntax {
        MarkupSyntax::Pod => extract_pod(source),
        MarkupSyntax::CommentPod => extract_pod(&comment_bodies(source)),
    }
}

/// Lines between a command paragraph and the next `=cut`
fn extract_pod(source: &str) -> String {
    let mut out = String::new();
    let mut in_markup = false;

    for line in source.lines() {
        let is_cut = command_name(line) == Some("cut");
        if in_markup {
            if is_cut {
                in_markup = false;
                out.push('\n');
            } else {
                out.push_str(line);
                out.push('\n');
            }
        } else if command_name(line).is_some() && !is_cut {
            in_markup = true;
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

/// Concatenated contents of every `/* ... */` block
fn comment_bodies(source: &str) -> String {
    let mut out = String::new();
    let mut rest = source;

    while let Some(start) = rest.find("/*") {
        let body = &rest[start + 2..];
        let (inner, next) = match body.find("*/") {
            Some(end) => (&body[..end], &body[end + 2..]),
            None => (body, ""),
        };
        out.push_str(inner);
        out.push('\n');
        rest = next;
    }

    out
}

/// Name of the command on a line such as `=head1 NAME`
fn command_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('=')?;
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != ':')
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Split extracted markup into paragraphs
pub fn tokenize(markup: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in markup.lines() {
        if line.trim().is_empty() {
            flush(&mut paragraph, &mut tokens);
        } else {
            paragraph.push(line);
        }
    }
    flush(&mut paragraph, &mut tokens);

    tokens
}

fn flush(paragraph: &mut Vec<&str>, tokens: &mut Vec<Token>) {
    let Some(first) = paragraph.first() else {
        return;
    };

    let token = if let Some(name) = command_name(first) {
        let mut text = first[1 + name.len()..].trim().to_string();
        for line in &paragraph[1..] {
            text.push('\n');
            text.push_str(line);
        }
        Token::Command {
            name: name.to_string(),
            text: text.trim().to_string(),
        }
    } else if first.starts_with([' ', '\t']) {
        let text = paragraph
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        match tokens.last_mut() {
            Some(Token::Verbatim(previous)) => {
                previous.push_str("\n\n");
                previous.push_str(&text);
                paragraph.clear();
                return;
            }
            _ => Token::Verbatim(text),
        }
    } else {
        Token::Text(paragraph.join("\n"))
    };

    tokens.push(token);
    paragraph.clear();
}

//! Anchor slug generation and per-document uniqueness.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();

fn separator_regex() -> &'static Regex {
    SEPARATOR_REGEX.get_or_init(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}]+").unwrap())
}

/// Convert heading text to an anchor slug
///
/// Rules:
/// - Lowercase
/// - Every run of non-alphanumeric characters becomes a single hyphen
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use projdocs_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("new( %args )"), "new-args");
/// assert_eq!(slugify("Foo::Bar"), "foo-bar");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.to_lowercase();
    let collapsed = separator_regex().replace_all(&lowercased, "-");
    collapsed.trim_matches('-').to_string()
}

/// Hands out anchors that are unique within one document.
///
/// The first occurrence of a slug is returned as-is; later occurrences get
/// `-2`, `-3`, ... in the order they are claimed.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    seen: HashMap<String, usize>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an anchor for the given text
    pub fn claim(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = String::from("section");
        }

        let mut candidate = base.clone();
        loop {
            let count = self.seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                candidate = format!("{}-{}", base, count);
            }
            // A suffixed candidate may collide with a literal heading like "topic-2"
            if candidate == base || !self.seen.contains_key(&candidate) {
                break;
            }
        }
        self.seen.insert(candidate.clone(), 1);
        candidate
    }
}

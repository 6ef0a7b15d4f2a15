//! Utility functions and helpers.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

static WHITESPACE: OnceLock<Regex> = OnceLock::new();
static PAPER_ID: OnceLock<Regex> = OnceLock::new();

/// Collapse every run of whitespace to a single space.
///
/// Leading and trailing whitespace is collapsed, not removed, so adjacent
/// fragments keep their word boundary when concatenated.
pub fn collapse_whitespace(text: &str) -> String {
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re.replace_all(text, " ").into_owned()
}

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the arXiv identifier from an abstract URL.
///
/// Handles both modern ids (`/abs/2408.12345`) and archive-prefixed ids
/// (`/abs/physics/9403001`).
pub fn extract_paper_id(url: &str) -> Option<String> {
    let re = PAPER_ID.get_or_init(|| {
        Regex::new(r"/abs/([a-z-]+(?:\.[A-Z]{2})?/\d{7}|\d{4}\.\d{4,5})(?:v\d+)?")
            .expect("static regex")
    });
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

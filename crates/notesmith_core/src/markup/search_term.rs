//! Citation search-term heuristic.
//!
//! Strips an enumeration prefix and a trailing page reference from note text
//! so it can seed a bibliographic lookup. Each rule is anchored to one end of
//! the string; nothing is removed from the middle.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_LIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(https?://|www\.)").expect("valid url prefix regex"));
static ENUMERATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\.?\s*").expect("valid enumeration regex"));
static PAGE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",?\s*(pp?\.?)?\s*\d+(-\d+)?\.?$").expect("valid page range regex")
});
static TRAILING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",?\s*\d+\.?$").expect("valid trailing number regex"));

/// Returns whether `text` already looks like a URL.
pub fn is_url_like(text: &str) -> bool {
    URL_LIKE_RE.is_match(text.trim_start())
}

/// Derives a lookup query from a note's untagged full text.
///
/// URL-looking text passes through unchanged apart from surrounding
/// whitespace.
pub fn derive_search_term(full_text: &str) -> String {
    let text = full_text.trim();
    if is_url_like(text) {
        return text.to_string();
    }

    let text = ENUMERATION_RE.replace(text, "");
    let text = PAGE_RANGE_RE.replace(&text, "");
    let text = TRAILING_NUMBER_RE.replace(&text, "");
    text.trim().to_string()
}

//! Simplified-markup grammar exchanged with the editing surface.
//!
//! # Responsibility
//! - Render spans as flat `<em>`/`<a href>`-tagged text.
//! - Split edited markup back into spans with a capturing regex split.
//! - Derive citation search terms from untagged note text.
//!
//! # Invariants
//! - The grammar is flat: tags never nest in each other or themselves.
//! - Untagged text between tags is preserved verbatim, interior whitespace
//!   included.
//! - Only `&nbsp;` and `&amp;` are unescaped; any other entity stays literal.
//! - A tag-like token that fails the exact pattern is kept as plain text.

pub mod search_term;

use crate::model::note::{Span, SpanKind};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="[^"]+">.*?</a>|<em>.*?</em>"#).expect("valid markup tag regex")
});
static HYPERLINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^<a href="([^"]+)">(.*?)</a>$"#).expect("valid hyperlink token regex")
});

const EM_OPEN: &str = "<em>";
const EM_CLOSE: &str = "</em>";
const HYPERLINK_PREFIX: &str = "<a href=";

/// Renders spans to their simplified-markup form, without trimming.
pub fn render_markup(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match &span.kind {
            SpanKind::Plain => out.push_str(&span.text),
            SpanKind::Emphasis => {
                out.push_str(EM_OPEN);
                out.push_str(&span.text);
                out.push_str(EM_CLOSE);
            }
            SpanKind::Hyperlink { target } => {
                out.push_str("<a href=\"");
                out.push_str(target);
                out.push_str("\">");
                out.push_str(&span.text);
                out.push_str("</a>");
            }
        }
    }
    out
}

/// Splits markup into tagged and untagged tokens, keeping the tags.
///
/// Equivalent to a split-with-capture: the returned pieces concatenate back
/// to `markup` exactly. Empty pieces are omitted.
pub fn split_tokens(markup: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    for found in TAG_RE.find_iter(markup) {
        if found.start() > cursor {
            tokens.push(&markup[cursor..found.start()]);
        }
        tokens.push(found.as_str());
        cursor = found.end();
    }
    if cursor < markup.len() {
        tokens.push(&markup[cursor..]);
    }
    tokens
}

/// Replaces the two entities the editor is allowed to emit.
pub fn unescape_entities(token: &str) -> String {
    token.replace("&nbsp;", " ").replace("&amp;", "&")
}

/// Parses edited markup into spans, in order.
///
/// Plain and emphasis spans with empty text are dropped; they would produce
/// empty runs. An empty hyperlink is kept so its target is still registered.
pub fn parse_markup(markup: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    for raw in split_tokens(markup) {
        let token = unescape_entities(raw);
        let span = classify_token(token);
        if !span.text.is_empty() || matches!(span.kind, SpanKind::Hyperlink { .. }) {
            spans.push(span);
        }
    }
    spans
}

fn classify_token(token: String) -> Span {
    if token.starts_with(HYPERLINK_PREFIX) {
        if let Some(caps) = HYPERLINK_RE.captures(&token) {
            let target = caps.get(1).map_or("", |m| m.as_str());
            let text = caps.get(2).map_or("", |m| m.as_str());
            return Span::hyperlink(target, text);
        }
        warn!(
            "event=markup_token module=markup status=skip reason=hyperlink_pattern_mismatch token_len={}",
            token.len()
        );
        return Span::plain(token);
    }

    if token.len() >= EM_OPEN.len() + EM_CLOSE.len()
        && token.starts_with(EM_OPEN)
        && token.ends_with(EM_CLOSE)
    {
        let inner = &token[EM_OPEN.len()..token.len() - EM_CLOSE.len()];
        return Span::emphasis(inner);
    }

    Span::plain(token)
}

//! Minimal rich text for notebook prose.
//!
//! Page authors write plain text with a handful of inline conventions:
//!
//! | Input | Output |
//! |-------|--------|
//! | `**bold**` | `<strong>bold</strong>` |
//! | `*italic*` | `<em>italic</em>` |
//! | `https://…` | `<a href="…" class="inline-link">…</a>` |
//! | blank line | paragraph break |
//! | single newline | `<br>` |
//!
//! This is deliberately not markdown: no lists, headings, or tables. The
//! input is HTML-escaped before any markup is synthesized, so text from a
//! page file can never inject tags of its own. URLs are linked verbatim;
//! asterisks inside them are not treated as emphasis.

use crate::naming::value_text;
use maud::Escaper;
use regex::Regex;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::LazyLock;

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(https?://[^\s)]+)").unwrap());
static STRONG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Render text to HTML paragraphs. Empty input renders to `""`.
pub fn rich_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = Escaper::new(&mut escaped).write_str(text.trim());

    let mut marked = String::with_capacity(escaped.len());
    let mut last = 0;
    for url in URL.find_iter(&escaped) {
        marked.push_str(&emphasize(&escaped[last..url.start()]));
        let _ = write!(marked, r#"<a href="{0}" class="inline-link">{0}</a>"#, url.as_str());
        last = url.end();
    }
    marked.push_str(&emphasize(&escaped[last..]));

    PARAGRAPH_BREAK
        .split(&marked)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bold then italic, applied only to text outside URLs.
fn emphasize(span: &str) -> String {
    let strong = STRONG.replace_all(span, "<strong>$1</strong>");
    EMPHASIS.replace_all(&strong, "<em>$1</em>").into_owned()
}

/// Render a JSON field, coercing non-string values to text first.
pub fn rich_text_value(value: Option<&Value>) -> String {
    value.map(|v| rich_text(&value_text(v))).unwrap_or_default()
}

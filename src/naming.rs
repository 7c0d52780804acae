//! Naming conventions shared by every stage of the export.
//!
//! Anchors, titles, and file stems all pass through the helpers here so the
//! table of contents, the rendered document, and the asset tree agree on
//! the same identifiers.
//!
//! ## Slugs
//!
//! A slug is the lowercase, hyphen-separated form of arbitrary text:
//! - `"August"` → `"august"`
//! - `"August-Drivetrain V1-2025-08-28"` → `"august-drivetrain-v1-2025-08-28"`
//! - `"!!!"` → `"section"` (nothing left to slug)
//!
//! ## JSON text coercion
//!
//! Page files are hand-written JSON, so fields that should be strings are
//! sometimes numbers or booleans. [`value_text`] turns any value into display
//! text, treating `null`, `false`, `0` and `""` as empty.

use serde_json::Value;

/// Lowercase `value` and collapse every run of non-alphanumeric characters
/// into a single `-`. Returns `"section"` when nothing remains.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Remove the last `.ext` suffix from a file name (`"drive.v1.json"` → `"drive.v1"`).
pub fn strip_ext(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => &name[..pos],
        _ => name,
    }
}

/// Final `/`-separated component of a path-like string.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether a JSON value counts as "present" (non-empty, non-zero, non-null).
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Display text for a JSON value. Falsy values become the empty string.
pub fn value_text(value: &Value) -> String {
    if !is_truthy(value) {
        return String::new();
    }
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Display text for an optional JSON value.
pub fn opt_text(value: Option<&Value>) -> String {
    value.map(value_text).unwrap_or_default()
}

/// The first present value's text, or empty when none is.
pub fn first_text<'a>(values: impl IntoIterator<Item = Option<&'a Value>>) -> String {
    values
        .into_iter()
        .flatten()
        .find(|v| is_truthy(v))
        .map(value_text)
        .unwrap_or_default()
}

/// The first non-empty string, or empty when all are.
pub fn first_non_empty<'a>(values: impl IntoIterator<Item = &'a str>) -> &'a str {
    values.into_iter().find(|s| !s.is_empty()).unwrap_or("")
}

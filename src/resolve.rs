//! Placeholder expansion and `src` resolution.
//!
//! Page files reference images, scripts, and documents with paths relative
//! to the project root, optionally templated with placeholder tokens so a
//! page can point at "its own" resources folder:
//!
//! ```text
//! resources/{class}/Entry/{title}/main.py
//! ```
//!
//! ## Placeholder grammar
//!
//! | Token | Replacement |
//! |-------|-------------|
//! | `{title}` | page `title` (or the id), itself expanded for `{file}`, `{class}`, `{id}` |
//! | `{class}` | the month the entry is filed under |
//! | `{type}` | page `type` |
//! | `{id}` | the entry id from the manifest |
//! | `{file}` | the id's file name without extension |
//!
//! Expansion is a single left-to-right pass of literal substitution. Text
//! produced by a replacement is never scanned again, so a title containing
//! `{id}` stays `{id}` in the output.
//!
//! ## Resolution
//!
//! [`Resolver::resolve_src`] turns an expanded value into a [`ResolvedSrc`]:
//! absolute `http(s)://` URLs pass through untouched; everything else is
//! joined onto the project root. A path that escapes the root keeps its
//! href but loses its filesystem path, so it is never read or copied.

use crate::naming::{opt_text, strip_ext};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

/// Characters escaped in a single href segment: everything except the
/// RFC 3986 unreserved set.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Where an entry lives in the manifest: its month ("class") and id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub class: String,
    pub id: String,
}

impl PageContext {
    pub fn new(class: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            id: id.into(),
        }
    }

    /// The id's file name without extension, used for `{file}`.
    pub fn file_stem(&self) -> &str {
        strip_ext(crate::naming::file_name(&self.id))
    }
}

/// A reference after resolution.
///
/// `href` is what goes into the document. `fs_path` is present only for
/// local references inside the project root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedSrc {
    pub href: String,
    pub fs_path: Option<PathBuf>,
}

impl ResolvedSrc {
    pub fn is_empty(&self) -> bool {
        self.href.is_empty()
    }
}

/// Ordered token → replacement table for one substitution pass.
#[derive(Debug, Default)]
pub struct Placeholders {
    entries: Vec<(&'static str, String)>,
}

impl Placeholders {
    /// Add a token. Re-inserting a token replaces its earlier value.
    pub fn insert(&mut self, token: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    /// Tokens available in titles: `{file}`, `{class}`, `{id}`.
    pub fn for_title(ctx: &PageContext) -> Self {
        let mut table = Self::default();
        table.insert("{file}", ctx.file_stem());
        table.insert("{class}", ctx.class.as_str());
        table.insert("{id}", ctx.id.as_str());
        table
    }

    /// Tokens available in `src` paths: all five.
    pub fn for_src(page: &Map<String, Value>, ctx: &PageContext) -> Self {
        let raw_title = match page.get("title").map(crate::naming::value_text) {
            Some(title) if !title.is_empty() => title,
            _ => ctx.id.clone(),
        };
        let title = Self::for_title(ctx).expand(&raw_title);

        let mut table = Self::default();
        table.insert("{title}", title);
        table.insert("{class}", ctx.class.as_str());
        table.insert("{type}", opt_text(page.get("type")));
        table.insert("{id}", ctx.id.as_str());
        table.insert("{file}", ctx.file_stem());
        table
    }

    /// Replace every token occurrence in one pass over `input`.
    pub fn expand(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let candidate = &rest[open..];
            match self
                .entries
                .iter()
                .find(|(token, _)| candidate.starts_with(token))
            {
                Some((token, value)) => {
                    out.push_str(value);
                    rest = &candidate[token.len()..];
                }
                None => {
                    out.push('{');
                    rest = &candidate[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Apply title placeholders (`{file}`, `{class}`, `{id}`).
pub fn apply_placeholders(raw: &str, ctx: &PageContext) -> String {
    Placeholders::for_title(ctx).expand(raw)
}

/// Expand a raw `src` value against its page. `None`/`null` expand to "".
pub fn expand_template_path(
    value: Option<&Value>,
    page: &Map<String, Value>,
    ctx: &PageContext,
) -> String {
    let raw = match value {
        None | Some(Value::Null) => return String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    Placeholders::for_src(page, ctx).expand(&raw)
}

/// Case-insensitive `http://` / `https://` prefix check.
pub fn is_http(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Percent-encode each `/`-separated segment, keeping the separators.
pub fn encode_local_href(path: &str) -> String {
    path.split('/')
        .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Collapse `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of `target` relative to `base`, as a `/`-joined string.
///
/// Both paths are expected to be absolute. `..` segments are emitted when
/// `target` is not below `base`. Returns `"."` for identical paths.
pub fn relative_path(base: &Path, target: &Path) -> String {
    let base: Vec<_> = base.components().collect();
    let target: Vec<_> = target.components().collect();
    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = std::iter::repeat_n("..".to_string(), base.len() - common).collect();
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Resolves page references against a fixed project root.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
}

impl Resolver {
    /// `root` should already be canonical; containment checks compare
    /// against it component by component.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw `src` value for `page`.
    pub fn resolve_src(
        &self,
        src: Option<&Value>,
        page: &Map<String, Value>,
        ctx: &PageContext,
    ) -> ResolvedSrc {
        let raw = expand_template_path(src, page, ctx);
        self.resolve_expanded(&raw)
    }

    /// Resolve an already-expanded reference.
    pub fn resolve_expanded(&self, raw: &str) -> ResolvedSrc {
        if raw.is_empty() {
            return ResolvedSrc::default();
        }
        if is_http(raw) {
            return ResolvedSrc {
                href: raw.to_string(),
                fs_path: None,
            };
        }

        let normalized = raw.strip_prefix('/').unwrap_or(raw);
        ResolvedSrc {
            href: encode_local_href(normalized),
            fs_path: self.contain(&self.root.join(normalized)),
        }
    }

    /// Absolute form of `candidate` if it stays inside the root.
    pub fn contain(&self, candidate: &Path) -> Option<PathBuf> {
        let lexical = normalize_lexically(candidate);
        let resolved = std::fs::canonicalize(&lexical).unwrap_or(lexical);
        resolved.starts_with(&self.root).then_some(resolved)
    }
}

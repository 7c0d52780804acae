//! Entry building: one page file → one titled, anchored notebook entry.
//!
//! Page files live at `<pages_dir>/<month>/<id>.json`:
//!
//! ```json
//! {
//!   "title": "Drivetrain V1 - First Drive",
//!   "date": "2025-08-28",
//!   "type": "Build",
//!   "brief": ["Assemble chassis", "Test drive"],
//!   "elements": [
//!     {"type": "synopsis", "content": "Built **v1** drivetrain."}
//!   ]
//! }
//! ```

use crate::assets::AssetManager;
use crate::elements::{ElementView, PageScope, process_element};
use crate::imaging::ImageBackend;
use crate::manifest::EntryRef;
use crate::naming::{first_non_empty, first_text, opt_text, slugify, value_text};
use crate::notebook::NotebookError;
use crate::resolve::{PageContext, Resolver, apply_placeholders};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    /// In-document link target; see [`entry_anchor`].
    pub anchor: String,
    pub title: String,
    pub date: String,
    pub entry_type: String,
    pub brief: Vec<String>,
    pub elements: Vec<ElementView>,
}

/// `slug(class-title-(date or id))`. Two entries in the same month with the
/// same title and date share an anchor.
pub fn entry_anchor(ctx: &PageContext, title: &str, date: &str) -> String {
    let disambiguator = first_non_empty([date, ctx.id.as_str()]);
    slugify(&format!("{}-{}-{}", ctx.class, title, disambiguator))
}

/// First non-empty of `title`, `name`, the id, and the id's file stem, with
/// title placeholders expanded.
pub fn entry_title(page: &Map<String, Value>, ctx: &PageContext) -> String {
    let raw_title = match first_text([page.get("title"), page.get("name")]) {
        title if !title.is_empty() => title,
        _ => first_non_empty([ctx.id.as_str(), ctx.file_stem()]).to_string(),
    };
    apply_placeholders(&raw_title, ctx)
}

/// Build an entry from a parsed page record.
pub fn build_entry<B: ImageBackend>(
    page: &Map<String, Value>,
    ctx: &PageContext,
    resolver: &Resolver,
    assets: &mut AssetManager<B>,
) -> Entry {
    let title = entry_title(page, ctx);
    let date = opt_text(page.get("date"));

    let brief = match page.get("brief") {
        Some(Value::Array(items)) => items.iter().map(value_text).collect(),
        _ => Vec::new(),
    };

    let scope = PageScope {
        page,
        ctx,
        resolver,
    };
    let elements = match page.get("elements") {
        Some(Value::Array(elements)) => elements
            .iter()
            .filter_map(|el| process_element(el, &scope, assets))
            .collect(),
        _ => Vec::new(),
    };

    Entry {
        id: ctx.id.clone(),
        anchor: entry_anchor(ctx, &title, &date),
        title,
        date,
        entry_type: opt_text(page.get("type")),
        brief,
        elements,
    }
}

/// Path of the page file for `id` filed under `month`.
pub fn entry_path(pages_dir: &Path, month: &str, id: &str) -> PathBuf {
    pages_dir.join(month).join(format!("{id}.json"))
}

/// Read and parse the page file behind a manifest reference.
pub fn read_page(
    pages_dir: &Path,
    month: &str,
    entry_ref: &EntryRef,
) -> Result<(PageContext, Map<String, Value>), NotebookError> {
    let id = entry_ref
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| NotebookError::EntryMissingId {
            month: month.to_string(),
        })?;

    let path = entry_path(pages_dir, month, id);
    if !path.exists() {
        return Err(NotebookError::EntryNotFound { path });
    }
    let text = fs::read_to_string(&path).map_err(|source| NotebookError::Io {
        path: path.clone(),
        source,
    })?;
    let page = match serde_json::from_str(&text) {
        Ok(Value::Object(page)) => page,
        Ok(_) => Map::new(),
        Err(source) => return Err(NotebookError::Json { path, source }),
    };
    Ok((PageContext::new(month, id), page))
}

/// Load and build the entry behind a manifest reference.
pub fn load_entry<B: ImageBackend>(
    pages_dir: &Path,
    month: &str,
    entry_ref: &EntryRef,
    resolver: &Resolver,
    assets: &mut AssetManager<B>,
) -> Result<Entry, NotebookError> {
    let (ctx, page) = read_page(pages_dir, month, entry_ref)?;
    Ok(build_entry(&page, &ctx, resolver, assets))
}

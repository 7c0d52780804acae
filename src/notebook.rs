//! Notebook assembly: manifest → months → rendered document → PDF.
//!
//! [`export`] runs the whole pipeline once:
//!
//! 1. load `<pages_dir>/manifest.json`
//! 2. build every entry, month by month, in manifest order
//! 3. pull the home sections out of the home page
//! 4. render and write the HTML in one shot
//! 5. print it to PDF unless skipped
//!
//! The first failure aborts the run. Recoverable trouble (unprocessable
//! images, missing scripts, anchors shared by two entries) is logged and the
//! run goes on.
//!
//! [`check`] validates the manifest and every page file without writing
//! anything.

use crate::assets::{AssetConflict, AssetError, AssetManager, AssetSettings, AssetStats};
use crate::config::{ConfigError, NotebookConfig};
use crate::entry::{Entry, entry_anchor, entry_title, load_entry, read_page};
use crate::home::{HomeError, extract_home_content, parse_selectors};
use crate::imaging::ImageBackend;
use crate::manifest::{Manifest, load_manifest};
use crate::naming::{opt_text, slugify};
use crate::pdf::{PdfError, Rasterizer};
use crate::render::{NotebookDocument, render_notebook};
use crate::resolve::{Resolver, encode_local_href, relative_path};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HTML_FILENAME: &str = "notebook.html";
pub const PDF_FILENAME: &str = "notebook.pdf";

#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("Manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },
    #[error("failed to parse manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid manifest {path}: {message}")]
    ManifestShape { path: PathBuf, message: String },
    #[error("Entry in {month} missing 'id'")]
    EntryMissingId { month: String },
    #[error("Entry file not found: {path}")]
    EntryNotFound { path: PathBuf },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Home(#[from] HomeError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
}

/// A group of entries filed under one manifest key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Month {
    pub name: String,
    pub anchor: String,
    pub entries: Vec<Entry>,
}

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocNode {
    pub title: String,
    pub anchor: String,
    pub children: Vec<TocNode>,
}

impl TocNode {
    fn leaf(title: &str, anchor: &str) -> Self {
        Self {
            title: title.to_string(),
            anchor: anchor.to_string(),
            children: Vec::new(),
        }
    }
}

/// Two titles that render to the same in-document anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorCollision {
    pub anchor: String,
    pub first: String,
    pub second: String,
}

/// Build every month's entries in manifest order.
pub fn build_months<B: ImageBackend>(
    manifest: &Manifest,
    pages_dir: &Path,
    resolver: &Resolver,
    assets: &mut AssetManager<B>,
) -> Result<Vec<Month>, NotebookError> {
    manifest
        .months
        .iter()
        .map(|month| {
            let entries = month
                .entries
                .iter()
                .map(|entry_ref| load_entry(pages_dir, &month.name, entry_ref, resolver, assets))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Month {
                name: month.name.clone(),
                anchor: slugify(&month.name),
                entries,
            })
        })
        .collect()
}

/// `(anchor, title)` of the sections every document opens with.
const FIXED_SECTIONS: [(&str, &str); 3] = [
    ("title-page", "Title Page"),
    ("table-of-contents", "Table of Contents"),
    ("home", "Home"),
];

/// Fixed Title Page / Table of Contents / Home prefix, then the months.
pub fn build_toc(months: &[Month]) -> Vec<TocNode> {
    let mut toc: Vec<TocNode> = FIXED_SECTIONS
        .iter()
        .map(|(anchor, title)| TocNode::leaf(title, anchor))
        .collect();
    toc.extend(months.iter().map(|month| TocNode {
        title: month.name.clone(),
        anchor: month.anchor.clone(),
        children: month
            .entries
            .iter()
            .map(|entry| TocNode::leaf(&entry.title, &entry.anchor))
            .collect(),
    }));
    toc
}

/// Every later `(anchor, title)` pair that reuses an earlier anchor.
pub fn find_anchor_collisions<'a>(
    anchors: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Vec<AnchorCollision> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    let mut collisions = Vec::new();
    for (anchor, title) in anchors {
        match seen.get(anchor) {
            Some(first) => collisions.push(AnchorCollision {
                anchor: anchor.to_string(),
                first: first.to_string(),
                second: title.to_string(),
            }),
            None => {
                seen.insert(anchor, title);
            }
        }
    }
    collisions
}

/// Anchors used by the document: the fixed sections, months, and entries.
fn document_anchors(months: &[Month]) -> impl Iterator<Item = (&str, &str)> {
    FIXED_SECTIONS.into_iter().chain(months.iter().flat_map(|month| {
        std::iter::once((month.anchor.as_str(), month.name.as_str())).chain(
            month
                .entries
                .iter()
                .map(|e| (e.anchor.as_str(), e.title.as_str())),
        )
    }))
}

/// `<base href>` that leads from the HTML file's directory back to the root.
pub fn base_href(html_dir: &Path, root: &Path) -> String {
    match relative_path(html_dir, root).as_str() {
        "." => "./".to_string(),
        rel => format!("{rel}/"),
    }
}

/// Paths and switches for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Project root; page and asset paths are relative to it.
    pub root: PathBuf,
    /// Defaults to `<root>/<output_dir from config>`.
    pub output_dir: Option<PathBuf>,
    /// Defaults to `<output>/notebook.html`.
    pub html_path: Option<PathBuf>,
    /// Defaults to `<output>/notebook.pdf`.
    pub pdf_path: Option<PathBuf>,
    pub skip_pdf: bool,
}

/// What an export produced.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub months: Vec<Month>,
    pub output_dir: PathBuf,
    pub html_path: PathBuf,
    pub html_bytes: u64,
    pub pdf_path: Option<PathBuf>,
    pub assets: AssetStats,
    /// Sources renamed because another source took their output name.
    pub asset_conflicts: Vec<AssetConflict>,
    pub collisions: Vec<AnchorCollision>,
}

impl ExportReport {
    pub fn entry_count(&self) -> usize {
        self.months.iter().map(|m| m.entries.len()).sum()
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> NotebookError + '_ {
    move |source| NotebookError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Make a relative path absolute against the working directory.
fn absolute(path: &Path) -> Result<PathBuf, NotebookError> {
    std::path::absolute(path).map_err(io_err(path))
}

fn canonical_root(root: &Path) -> Result<PathBuf, NotebookError> {
    fs::canonicalize(root).map_err(io_err(root))
}

/// Run the full export.
pub fn export<B: ImageBackend, R: Rasterizer>(
    options: &ExportOptions,
    config: &NotebookConfig,
    backend: B,
    rasterizer: &R,
) -> Result<ExportReport, NotebookError> {
    let root = canonical_root(&options.root)?;
    let output_dir = match &options.output_dir {
        Some(dir) => absolute(dir)?,
        None => root.join(&config.output_dir),
    };
    fs::create_dir_all(&output_dir).map_err(io_err(&output_dir))?;
    let output_dir = fs::canonicalize(&output_dir).map_err(io_err(&output_dir))?;

    let pages_dir = root.join(&config.pages_dir);
    let manifest = load_manifest(&pages_dir)?;
    log::info!(
        "Loaded manifest: {} months, {} entries",
        manifest.months.len(),
        manifest.entry_count()
    );

    let resolver = Resolver::new(&root);
    let settings = AssetSettings {
        bounds: config.images.bounds(),
        quality: config.images.quality(),
    };
    let mut assets = AssetManager::new(&root, &output_dir, backend, settings)?;

    let months = build_months(&manifest, &pages_dir, &resolver, &mut assets)?;
    let collisions = find_anchor_collisions(document_anchors(&months));
    for collision in &collisions {
        log::warn!(
            "Anchor '{}' is shared by '{}' and '{}'; links will jump to the first",
            collision.anchor,
            collision.first,
            collision.second
        );
    }

    let selectors = parse_selectors(&config.home_sections);
    let home_html = extract_home_content(
        &root.join(&config.home_page),
        &selectors,
        &resolver,
        &mut assets,
    )?;

    let html_path = match &options.html_path {
        Some(path) => absolute(path)?,
        None => output_dir.join(HTML_FILENAME),
    };
    let html_dir = match html_path.parent() {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
            fs::canonicalize(parent).map_err(io_err(parent))?
        }
        None => output_dir.clone(),
    };

    let toc = build_toc(&months);
    let base = base_href(&html_dir, &root);
    let logo = encode_local_href(config.logo.trim_start_matches('/'));
    log::info!("Rendering {}", config.title);
    let html = render_notebook(&NotebookDocument {
        title: &config.title,
        base_href: &base,
        logo_href: &logo,
        home_html: &home_html,
        months: &months,
        toc: &toc,
        theme: &config.theme,
    });

    fs::write(&html_path, &html).map_err(io_err(&html_path))?;
    let html_bytes = html.len() as u64;
    log::info!(
        "Wrote HTML notebook to {} ({:.1} KB)",
        html_path.display(),
        html_bytes as f64 / 1024.0
    );

    let asset_conflicts = assets.conflicts().to_vec();
    let stats = assets.into_stats();
    if stats.total() > 0 {
        log::info!("Processed {stats}");
    } else {
        log::info!("No local image assets required processing.");
    }

    let pdf_path = if options.skip_pdf {
        None
    } else {
        let pdf_path = match &options.pdf_path {
            Some(path) => absolute(path)?,
            None => output_dir.join(PDF_FILENAME),
        };
        rasterizer.render_pdf(&html_path, &pdf_path, &config.pdf)?;
        Some(pdf_path)
    };

    Ok(ExportReport {
        months,
        output_dir,
        html_path,
        html_bytes,
        pdf_path,
        assets: stats,
        asset_conflicts,
        collisions,
    })
}

// ============================================================================
// Check mode
// ============================================================================

/// One page file that loaded cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedEntry {
    pub id: String,
    pub title: String,
    pub date: String,
    pub elements: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedMonth {
    pub name: String,
    pub entries: Vec<CheckedEntry>,
}

/// Inventory of a project that passed [`check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub months: Vec<CheckedMonth>,
    pub collisions: Vec<AnchorCollision>,
    pub home_page_found: bool,
}

/// Validate the manifest and every page file without writing anything.
pub fn check(root: &Path, config: &NotebookConfig) -> Result<CheckReport, NotebookError> {
    let root = canonical_root(root)?;
    let pages_dir = root.join(&config.pages_dir);
    let manifest = load_manifest(&pages_dir)?;

    let mut months = Vec::new();
    let mut anchors: Vec<(String, String)> = FIXED_SECTIONS
        .iter()
        .map(|(anchor, title)| (anchor.to_string(), title.to_string()))
        .collect();
    for month in &manifest.months {
        anchors.push((slugify(&month.name), month.name.clone()));
        let mut entries = Vec::new();
        for entry_ref in &month.entries {
            let (ctx, page) = read_page(&pages_dir, &month.name, entry_ref)?;
            let title = entry_title(&page, &ctx);
            let date = opt_text(page.get("date"));
            anchors.push((entry_anchor(&ctx, &title, &date), title.clone()));
            entries.push(CheckedEntry {
                elements: page
                    .get("elements")
                    .and_then(|e| e.as_array())
                    .map_or(0, Vec::len),
                id: ctx.id,
                title,
                date,
            });
        }
        months.push(CheckedMonth {
            name: month.name.clone(),
            entries,
        });
    }

    let collisions =
        find_anchor_collisions(anchors.iter().map(|(a, t)| (a.as_str(), t.as_str())));
    Ok(CheckReport {
        months,
        collisions,
        home_page_found: root.join(&config.home_page).exists(),
    })
}

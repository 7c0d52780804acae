//! Shared test utilities for the notebook-export test suite.
//!
//! [`ProjectBuilder`] lays out a throwaway project root in a temp directory
//! so tests can describe exactly the manifest, pages, and resources they
//! need. [`setup_fixtures`] copies the checked-in sample project instead.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = ProjectBuilder::new()
//!     .manifest(r#"{"August": [{"id": "drive-v1"}]}"#)
//!     .page("August", "drive-v1", r#"{"title": "Drivetrain V1"}"#)
//!     .png("resources/August/drive.png", 64, 48)
//!     .build();
//!
//! let report = check(project.root(), &NotebookConfig::default()).unwrap();
//! assert_eq!(find_checked_entry(&report, "drive-v1").title, "Drivetrain V1");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::notebook::{CheckReport, CheckedEntry, ExportReport, Month};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/project/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/project");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// A project root living in a temp directory for the length of a test.
pub struct TempProject {
    _tmp: TempDir,
    root: PathBuf,
}

impl TempProject {
    /// Canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

enum Fixture {
    Text(String, String),
    Png(String, u32, u32),
}

/// Declarative builder for [`TempProject`]s.
#[derive(Default)]
pub struct ProjectBuilder {
    files: Vec<Fixture>,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pages/manifest.json`.
    pub fn manifest(self, json: &str) -> Self {
        self.file("pages/manifest.json", json)
    }

    /// `pages/<month>/<id>.json`.
    pub fn page(self, month: &str, id: &str, json: &str) -> Self {
        self.file(&format!("pages/{month}/{id}.json"), json)
    }

    /// `index.html` at the root.
    pub fn home(self, html: &str) -> Self {
        self.file("index.html", html)
    }

    /// Any text file, relative to the root.
    pub fn file(mut self, rel: &str, contents: &str) -> Self {
        self.files
            .push(Fixture::Text(rel.to_string(), contents.to_string()));
        self
    }

    /// A solid-color PNG of the given size.
    pub fn png(mut self, rel: &str, width: u32, height: u32) -> Self {
        self.files.push(Fixture::Png(rel.to_string(), width, height));
        self
    }

    pub fn build(self) -> TempProject {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        for fixture in self.files {
            match fixture {
                Fixture::Text(rel, contents) => {
                    let path = root.join(rel);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(path, contents).unwrap();
                }
                Fixture::Png(rel, width, height) => {
                    let path = root.join(rel);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    image::RgbImage::from_pixel(width, height, image::Rgb([139, 30, 45]))
                        .save(path)
                        .unwrap();
                }
            }
        }
        TempProject { _tmp: tmp, root }
    }
}

// =========================================================================
// Report lookups: panic with a clear message on miss
// =========================================================================

/// Find a month by name in an export report. Panics if not found.
pub fn find_month<'a>(report: &'a ExportReport, name: &str) -> &'a Month {
    report
        .months
        .iter()
        .find(|m| m.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = report.months.iter().map(|m| m.name.as_str()).collect();
            panic!("month '{name}' not found. Available: {names:?}")
        })
}

/// Find a checked entry by id anywhere in a check report. Panics if not found.
pub fn find_checked_entry<'a>(report: &'a CheckReport, id: &str) -> &'a CheckedEntry {
    report
        .months
        .iter()
        .flat_map(|m| &m.entries)
        .find(|e| e.id == id)
        .unwrap_or_else(|| {
            let ids: Vec<&str> = report
                .months
                .iter()
                .flat_map(|m| &m.entries)
                .map(|e| e.id.as_str())
                .collect();
            panic!("entry '{id}' not found. Available: {ids:?}")
        })
}

/// Element templates of every entry in a month, in order.
pub fn element_templates(month: &Month) -> Vec<Vec<&'static str>> {
    month
        .entries
        .iter()
        .map(|e| e.elements.iter().map(|el| el.template()).collect())
        .collect()
}

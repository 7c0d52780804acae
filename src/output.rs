//! CLI output formatting for `build` and `check`.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each entry leads
//! with its positional index and title; the page file and anchor it came
//! from are indented context lines. The result reads as a table of contents
//! that can still be traced back to files.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! August
//! 001 Season Kickoff (2 elements)
//!     Source: pages/August/kickoff.json
//!     Anchor: #august-season-kickoff-2025-08-02
//! 002 Drivetrain V1 - First Drive (4 elements)
//!     Source: pages/August/drive-v1.json
//!     Anchor: #august-drivetrain-v1-first-drive-2025-08-28
//!
//! Assets
//!     3 assets (2 resized, 1 copied). 4.1 MB → 0.6 MB (saved 3.5 MB)
//!
//! Output
//!     HTML: compilation/output/notebook.html (48.2 KB)
//!     PDF: compilation/output/notebook.pdf
//!
//! Exported 2 months, 3 entries
//! ```
//!
//! ## Check
//!
//! ```text
//! August
//! 001 Season Kickoff (2 elements)
//!     Source: pages/August/kickoff.json
//!
//! Home page: found
//! 2 months, 3 entries
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::assets::{AssetConflict, AssetStats};
use crate::entry::entry_path;
use crate::notebook::{AnchorCollision, CheckReport, ExportReport};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 entry`, `3 entries`.
fn count(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

/// Entry header: positional index + title + element count.
///
/// ```text
/// 001 Drivetrain V1 (4 elements)
/// ```
fn entry_header(index: usize, title: &str, elements: usize) -> String {
    format!("{} {} ({})", format_index(index), title, count(elements, "element", "elements"))
}

/// Display `path` relative to `base` when it is inside it.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn source_line(root: &Path, pages_dir: &str, month: &str, id: &str) -> String {
    let path = entry_path(&root.join(pages_dir), month, id);
    format!("{}Source: {}", indent(1), display_path(&path, root))
}

fn warning_lines(collisions: &[AnchorCollision], conflicts: &[AssetConflict]) -> Vec<String> {
    if collisions.is_empty() && conflicts.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Warnings".to_string()];
    lines.extend(collisions.iter().map(|c| {
        format!(
            "{}Anchor #{} shared by \"{}\" and \"{}\"",
            indent(1),
            c.anchor,
            c.first,
            c.second
        )
    }));
    lines.extend(conflicts.iter().map(|c| {
        format!(
            "{}Asset {} claimed by {}; {} renamed",
            indent(1),
            c.target.display(),
            c.first.display(),
            c.second.display()
        )
    }));
    lines
}

// ============================================================================
// Build output
// ============================================================================

/// Summary lines for the run's asset counters.
pub fn format_asset_summary(stats: &AssetStats) -> Vec<String> {
    let mut lines = Vec::new();
    if stats.total() == 0 {
        lines.push(format!("{}No local image assets required processing", indent(1)));
    } else {
        lines.push(format!("{}{}", indent(1), stats));
    }
    if stats.failures > 0 {
        lines.push(format!(
            "{}{} could not be resized; originals copied",
            indent(1),
            count(stats.failures, "image", "images")
        ));
    }
    lines
}

/// Format `build` output: months and entries, assets, warnings, output files.
pub fn format_export_output(report: &ExportReport, root: &Path, pages_dir: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for (m, month) in report.months.iter().enumerate() {
        if m > 0 {
            lines.push(String::new());
        }
        lines.push(month.name.clone());
        for (i, entry) in month.entries.iter().enumerate() {
            lines.push(entry_header(i + 1, &entry.title, entry.elements.len()));
            lines.push(source_line(root, pages_dir, &month.name, &entry.id));
            lines.push(format!("{}Anchor: #{}", indent(1), entry.anchor));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push("Assets".to_string());
    lines.extend(format_asset_summary(&report.assets));

    lines.extend(warning_lines(&report.collisions, &report.asset_conflicts));

    lines.push(String::new());
    lines.push("Output".to_string());
    lines.push(format!(
        "{}HTML: {} ({:.1} KB)",
        indent(1),
        display_path(&report.html_path, root),
        report.html_bytes as f64 / 1024.0
    ));
    match &report.pdf_path {
        Some(pdf) => lines.push(format!("{}PDF: {}", indent(1), display_path(pdf, root))),
        None => lines.push(format!("{}PDF: skipped", indent(1))),
    }

    lines.push(String::new());
    lines.push(format!(
        "Exported {}, {}",
        count(report.months.len(), "month", "months"),
        count(report.entry_count(), "entry", "entries")
    ));
    lines
}

pub fn print_export_output(report: &ExportReport, root: &Path, pages_dir: &str) {
    for line in format_export_output(report, root, pages_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format `check` output: the inventory that would be exported.
pub fn format_check_output(report: &CheckReport, root: &Path, pages_dir: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut entries = 0;

    for (m, month) in report.months.iter().enumerate() {
        if m > 0 {
            lines.push(String::new());
        }
        lines.push(month.name.clone());
        for (i, entry) in month.entries.iter().enumerate() {
            lines.push(entry_header(i + 1, &entry.title, entry.elements));
            lines.push(source_line(root, pages_dir, &month.name, &entry.id));
            if !entry.date.is_empty() {
                lines.push(format!("{}Date: {}", indent(1), entry.date));
            }
        }
        entries += month.entries.len();
    }

    lines.extend(warning_lines(&report.collisions, &[]));

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Home page: {}",
        if report.home_page_found { "found" } else { "missing" }
    ));
    lines.push(format!(
        "{}, {}",
        count(report.months.len(), "month", "months"),
        count(entries, "entry", "entries")
    ));
    lines
}

pub fn print_check_output(report: &CheckReport, root: &Path, pages_dir: &str) {
    for line in format_check_output(report, root, pages_dir) {
        println!("{}", line);
    }
}

//! # Notebook Export
//!
//! Compiles a robotics team's engineering notebook into one printable
//! document. The notebook's content lives as JSON: a manifest lists entries
//! month by month, and each entry is a page file holding typed elements
//! (synopsis, design brief, notes, images, scripts, PDFs, videos).
//!
//! # Pipeline
//!
//! ```text
//! pages/manifest.json ─┐
//! pages/<month>/*.json ├─→ months/entries ─→ notebook.html ─→ notebook.pdf
//! index.html sections ─┘        │
//!                               └─→ compilation/output/assets/ (downscaled images)
//! ```
//!
//! Everything happens in one run. There are no intermediate files; the only
//! persistent state is the asset directory, which doubles as a cache keyed
//! by modification time.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`notebook`] | Orchestration: [`notebook::export`] and [`notebook::check`] |
//! | [`manifest`] | `manifest.json` parsing and per-month date ordering |
//! | [`entry`] | Page file → titled, anchored [`entry::Entry`] |
//! | [`elements`] | Element type dispatch and per-kind normalization |
//! | [`resolve`] | Placeholder expansion and root-contained path resolution |
//! | [`rich_text`] | Minimal inline markup (`**bold**`, `*italic*`, line breaks) |
//! | [`assets`] | Image downscale-or-copy into the output asset cache |
//! | [`home`] | Section extraction from the static home page |
//! | [`render`] | Maud templates for the whole document |
//! | [`pdf`] | Headless Chrome printing behind the [`pdf::Rasterizer`] seam |
//! | [`config`] | `notebook.toml` loading, validation, theme CSS |
//! | [`imaging`] | Pure-Rust image downscaling behind [`imaging::ImageBackend`] |
//! | [`naming`] | Slugs, file-name helpers, JSON value coercion |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Root Is a Hard Boundary
//!
//! Page files reference resources by root-relative path, with placeholders
//! such as `{class}` and `{title}`. Every resolved path is normalized and
//! checked against the project root. Anything that escapes the root is
//! treated as an external reference: it is linked as written and never read,
//! copied, or resized.
//!
//! ## Failures Abort, Oddities Degrade
//!
//! A missing manifest, a missing page file, or malformed JSON stops the run
//! with the offending path. Content problems inside a page (an unreadable
//! image, a missing script, an unknown element type) are logged and rendered
//! as well as possible.
//!
//! ## Concurrency
//!
//! A run is single-threaded and assumes it owns its output directory. Two
//! runs writing the same output directory at once may race on the asset
//! cache; serializing them is the caller's job.

pub mod assets;
pub mod config;
pub mod elements;
pub mod entry;
pub mod home;
pub mod imaging;
pub mod manifest;
pub mod naming;
pub mod notebook;
pub mod output;
pub mod pdf;
pub mod render;
pub mod resolve;
pub mod rich_text;

#[cfg(test)]
pub(crate) mod test_helpers;

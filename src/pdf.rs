//! PDF output through headless Chrome.
//!
//! The rendered HTML file is opened in a headless browser and printed with
//! the page settings from `[pdf]` (Letter by default, backgrounds on, CSS
//! `@page` size preferred). The HTML on disk is never touched here, so a
//! failed print leaves it intact.
//!
//! [`Rasterizer`] is the seam: the export drives whatever implementation it
//! is given, and tests substitute a recording fake for [`ChromeRasterizer`].

use crate::config::PdfConfig;
use crate::resolve::encode_local_href;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF rasterizer unavailable: {0}. Install Chrome or Chromium, or pass --skip-pdf")]
    RasterizerUnavailable(String),
    #[error("PDF rendering failed: {0}")]
    Render(String),
    #[error("failed to write PDF {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Turns a written HTML document into a PDF file.
pub trait Rasterizer {
    fn render_pdf(&self, html_path: &Path, pdf_path: &Path, settings: &PdfConfig) -> Result<(), PdfError>;
}

/// `file://` URL for an absolute path, percent-encoded per segment.
pub fn file_url(path: &Path) -> String {
    format!("file://{}", encode_local_href(&path.to_string_lossy()))
}

/// Prints through a freshly launched headless Chrome per call.
#[derive(Debug, Clone)]
pub struct ChromeRasterizer {
    /// Applies to browser idle time and every page operation.
    pub timeout: Duration,
}

impl Default for ChromeRasterizer {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60 * 60),
        }
    }
}

impl Rasterizer for ChromeRasterizer {
    fn render_pdf(&self, html_path: &Path, pdf_path: &Path, settings: &PdfConfig) -> Result<(), PdfError> {
        let url = file_url(html_path);
        log::info!("Generating PDF from {url}");

        let browser = Browser::new(LaunchOptions {
            idle_browser_timeout: self.timeout,
            ..Default::default()
        })
        .map_err(|e| PdfError::RasterizerUnavailable(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| PdfError::RasterizerUnavailable(e.to_string()))?;
        tab.set_default_timeout(self.timeout);

        let bytes = tab
            .navigate_to(&url)
            .and_then(|tab| tab.wait_until_navigated())
            .and_then(|tab| tab.print_to_pdf(Some(print_options(settings))))
            .map_err(|e| PdfError::Render(e.to_string()))?;

        if let Some(parent) = pdf_path.parent() {
            fs::create_dir_all(parent).map_err(|source| PdfError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(pdf_path, &bytes).map_err(|source| PdfError::Io {
            path: pdf_path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Wrote PDF to {} ({:.1} MB)",
            pdf_path.display(),
            bytes.len() as f64 / (1024.0 * 1024.0)
        );
        Ok(())
    }
}

fn print_options(settings: &PdfConfig) -> PrintToPdfOptions {
    PrintToPdfOptions {
        print_background: Some(settings.print_background),
        paper_width: Some(settings.paper_width),
        paper_height: Some(settings.paper_height),
        prefer_css_page_size: Some(settings.prefer_css_page_size),
        ..Default::default()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records calls and writes a stub PDF, or fails like a missing browser.
    #[derive(Default)]
    pub struct MockRasterizer {
        pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
        pub unavailable: bool,
    }

    impl MockRasterizer {
        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Rasterizer for MockRasterizer {
        fn render_pdf(&self, html_path: &Path, pdf_path: &Path, _: &PdfConfig) -> Result<(), PdfError> {
            self.calls
                .lock()
                .unwrap()
                .push((html_path.to_path_buf(), pdf_path.to_path_buf()));
            if self.unavailable {
                return Err(PdfError::RasterizerUnavailable("no browser".into()));
            }
            fs::write(pdf_path, b"%PDF-1.4 mock").map_err(|source| PdfError::Io {
                path: pdf_path.to_path_buf(),
                source,
            })
        }
    }

    #[test]
    fn file_url_encodes_segments() {
        assert_eq!(
            file_url(Path::new("/home/team 5840/out/notebook.html")),
            "file:///home/team%205840/out/notebook.html"
        );
    }

    #[test]
    fn print_options_follow_config() {
        let options = print_options(&PdfConfig::default());
        assert_eq!(options.paper_width, Some(8.5));
        assert_eq!(options.paper_height, Some(11.0));
        assert_eq!(options.print_background, Some(true));
        assert_eq!(options.prefer_css_page_size, Some(true));
    }

    #[test]
    fn unavailable_error_mentions_skip_flag() {
        let err = PdfError::RasterizerUnavailable("Could not auto detect a chrome executable".into());
        assert!(err.to_string().contains("--skip-pdf"));
    }
}

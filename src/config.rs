//! Notebook configuration.
//!
//! Handles loading, validating, and merging `notebook.toml`. The file is
//! optional: every key has a stock default, and a user file only needs the
//! keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! <project root>/
//! ├── notebook.toml        # Optional; overrides stock defaults
//! ├── index.html           # Static home page (sections pulled into the notebook)
//! ├── pages/
//! │   ├── manifest.json
//! │   └── August/drive-v1.json
//! └── resources/...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! title = "Team 5840C Engineering Notebook"
//! pages_dir = "pages"
//! home_page = "index.html"
//! home_sections = ["section#about", "section#links"]
//! logo = "resources/home/vex_logo.png"
//! output_dir = "compilation/output"
//!
//! [images]
//! max_width = 1600
//! max_height = 1200
//! quality = 85
//!
//! [pdf]
//! paper_width = 8.5
//! paper_height = 11.0
//! print_background = true
//! prefer_css_page_size = true
//!
//! [theme]
//! accent = "#8b1e2d"
//! text = "#1a1a1a"
//! muted = "#666666"
//! border = "#d0d0d0"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::home::SectionSelector;
use crate::imaging::{BoundingBox, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the project root.
pub const CONFIG_FILENAME: &str = "notebook.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Notebook configuration loaded from `notebook.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotebookConfig {
    /// Document title shown on the title page and in `<title>`.
    pub title: String,
    /// Directory (relative to the root) holding `manifest.json` and page files.
    pub pages_dir: String,
    /// Static HTML page the home sections are extracted from.
    pub home_page: String,
    /// Selectors (`tag`, `#id`, `.class`, or combined) of the home sections, in order.
    pub home_sections: Vec<String>,
    /// Logo shown on the title page, relative to the root.
    pub logo: String,
    /// Default output directory, relative to the root.
    pub output_dir: String,
    /// Image downscaling settings.
    pub images: ImagesConfig,
    /// PDF page settings.
    pub pdf: PdfConfig,
    /// Document colors.
    pub theme: ThemeConfig,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            title: "Team 5840C Engineering Notebook".to_string(),
            pages_dir: "pages".to_string(),
            home_page: "index.html".to_string(),
            home_sections: vec!["section#about".to_string(), "section#links".to_string()],
            logo: "resources/home/vex_logo.png".to_string(),
            output_dir: "compilation/output".to_string(),
            images: ImagesConfig::default(),
            pdf: PdfConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl NotebookConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.max_width == 0 || self.images.max_height == 0 {
            return Err(ConfigError::Validation(
                "images.max_width and images.max_height must be non-zero".into(),
            ));
        }
        if self.pdf.paper_width <= 0.0 || self.pdf.paper_height <= 0.0 {
            return Err(ConfigError::Validation(
                "pdf.paper_width and pdf.paper_height must be positive".into(),
            ));
        }
        if self.pages_dir.trim().is_empty() {
            return Err(ConfigError::Validation("pages_dir must not be empty".into()));
        }
        for selector in &self.home_sections {
            if SectionSelector::parse(selector).is_none() {
                return Err(ConfigError::Validation(format!(
                    "home_sections: unsupported selector '{selector}'"
                )));
            }
        }
        Ok(())
    }
}

/// Image downscaling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Longest allowed output width in pixels.
    pub max_width: u32,
    /// Longest allowed output height in pixels.
    pub max_height: u32,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: 1600,
            max_height: 1200,
            quality: 85,
        }
    }
}

impl ImagesConfig {
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

/// PDF page settings handed to the browser's print engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdfConfig {
    /// Paper width in inches (Letter = 8.5).
    pub paper_width: f64,
    /// Paper height in inches (Letter = 11).
    pub paper_height: f64,
    /// Print background colors and images.
    pub print_background: bool,
    /// Let CSS `@page` rules override the paper size.
    pub prefer_css_page_size: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            paper_width: 8.5,
            paper_height: 11.0,
            print_background: true,
            prefer_css_page_size: true,
        }
    }
}

/// Document colors, emitted as CSS custom properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Headings, rules, and link color.
    pub accent: String,
    /// Body text.
    pub text: String,
    /// Dates, captions, and labels.
    pub muted: String,
    /// Card and table borders.
    pub border: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: "#8b1e2d".to_string(),
            text: "#1a1a1a".to_string(),
            muted: "#666666".to_string(),
            border: "#d0d0d0".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(NotebookConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load config from `notebook.toml` in `root`, or stock defaults if absent.
pub fn load_config(root: &Path) -> Result<NotebookConfig, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    let merged = if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merge_toml(stock_defaults_value(), overlay)
    } else {
        stock_defaults_value()
    };
    let config: NotebookConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Generate CSS custom properties from the theme.
pub fn generate_theme_css(theme: &ThemeConfig) -> String {
    format!(
        r#":root {{
    --color-accent: {accent};
    --color-text: {text};
    --color-muted: {muted};
    --color-border: {border};
}}"#,
        accent = theme.accent,
        text = theme.text,
        muted = theme.muted,
        border = theme.border,
    )
}

/// Returns a fully-commented stock `notebook.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Notebook Export Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Title on the title page and in the document <title>.
title = "Team 5840C Engineering Notebook"

# Directory holding manifest.json and one folder of page files per month.
pages_dir = "pages"

# Static HTML page whose sections are copied into the "Home" chapter.
home_page = "index.html"

# Sections to copy, in order. Supported: tag, #id, .class, and combinations
# such as section#about or div.links.
home_sections = ["section#about", "section#links"]

# Logo shown on the title page.
logo = "resources/home/vex_logo.png"

# Where notebook.html, notebook.pdf and assets/ are written by default.
output_dir = "compilation/output"

# ---------------------------------------------------------------------------
# Image downscaling
# ---------------------------------------------------------------------------
[images]
# Images larger than this box are downscaled (aspect ratio preserved).
max_width = 1600
max_height = 1200

# JPEG quality (1 = worst, 100 = best).
quality = 85

# ---------------------------------------------------------------------------
# PDF output
# ---------------------------------------------------------------------------
[pdf]
# Paper size in inches. Letter is 8.5 x 11.
paper_width = 8.5
paper_height = 11.0

# Print background colors and images.
print_background = true

# Let @page rules in the stylesheet override the paper size.
prefer_css_page_size = true

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[theme]
accent = "#8b1e2d"
text = "#1a1a1a"
muted = "#666666"
border = "#d0d0d0"
"##
}

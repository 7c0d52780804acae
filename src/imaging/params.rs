//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. The asset
//! manager fills them in from config and hands them to an
//! [`ImageBackend`](super::ImageBackend), which does the pixel work.
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 85). Clamped on construction.
//! - [`BoundingBox`]: the largest output size allowed; images are fit inside it.
//! - [`DownscaleParams`]: source, output path, bounding box, quality.

use std::path::PathBuf;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Maximum output dimensions. Aspect ratio is always preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            max_width: 1600,
            max_height: 1200,
        }
    }
}

/// Decode `source`, flatten to RGB, fit inside `bounds`, write JPEG to `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct DownscaleParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub bounds: BoundingBox,
    pub quality: Quality,
}

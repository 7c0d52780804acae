//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, BMP, GIF, TIFF, WebP) | `image::ImageReader` |
//! | Flatten alpha onto white | [`flatten_to_rgb`] |
//! | Resize | `image::imageops::resize` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Palette images are expanded by the decoders, so by the time pixels reach
//! [`flatten_to_rgb`] they are either RGB(A) or luma(A).

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{fit_within, needs_downscale};
use super::params::{DownscaleParams, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use std::path::Path;

/// Extensions routed through decode → resize → JPEG.
pub const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff", "webp"];

/// Whether `path` has one of the [`RASTER_EXTENSIONS`] (case-insensitive).
pub fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| RASTER_EXTENSIONS.iter().any(|r| e.eq_ignore_ascii_case(r)))
}

/// Backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Composite any transparency onto a solid white background.
pub fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }
    let rgba = img.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

fn save_jpeg(img: &RgbImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let mut writer = std::io::BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality.value() as u8)
        .encode_image(img)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

impl ImageBackend for RustBackend {
    fn downscale(&self, params: &DownscaleParams) -> Result<Dimensions, BackendError> {
        let rgb = flatten_to_rgb(load_image(&params.source)?);
        let (width, height) = fit_within(rgb.dimensions(), params.bounds);

        let fitted = if needs_downscale(rgb.dimensions(), params.bounds) {
            image::imageops::resize(&rgb, width, height, FilterType::Lanczos3)
        } else {
            rgb
        };

        save_jpeg(&fitted, &params.output, params.quality)?;
        Ok(Dimensions { width, height })
    }
}

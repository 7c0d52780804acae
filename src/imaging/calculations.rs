//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::BoundingBox;

/// Dimensions that fit `source` inside `bounds`, preserving aspect ratio.
///
/// Images already inside the box are returned unchanged (never upscaled).
/// Neither output dimension drops below 1.
///
/// ```text
/// 4000x3000 in 1600x1200 → 1600x1200
/// 3000x4000 in 1600x1200 →  900x1200
///  800x600  in 1600x1200 →  800x600
/// ```
pub fn fit_within(source: (u32, u32), bounds: BoundingBox) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w <= bounds.max_width && src_h <= bounds.max_height {
        return source;
    }
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let scale_w = bounds.max_width as f64 / src_w as f64;
    let scale_h = bounds.max_height as f64 / src_h as f64;
    let scale = scale_w.min(scale_h);

    let w = ((src_w as f64 * scale).round() as u32).clamp(1, bounds.max_width.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, bounds.max_height.max(1));
    (w, h)
}

/// Whether `source` has to be resized to fit `bounds`.
pub fn needs_downscale(source: (u32, u32), bounds: BoundingBox) -> bool {
    fit_within(source, bounds) != source
}

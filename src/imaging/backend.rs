//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the one operation the asset manager
//! needs: downscale to JPEG. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! recording [`tests::MockBackend`] so they can assert how often the
//! expensive path ran.

use super::params::DownscaleParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Output size of a downscale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Decode, flatten, fit and re-encode. Returns the output dimensions.
    fn downscale(&self, params: &DownscaleParams) -> Result<Dimensions, BackendError>;
}

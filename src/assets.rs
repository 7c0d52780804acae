//! Asset preparation and per-run caching.
//!
//! Every local image or file a page references is copied into the output
//! directory under `assets/`, mirroring its path relative to the project
//! root. Raster images are downscaled and re-encoded as JPEG on the way;
//! everything else is copied byte for byte.
//!
//! ```text
//! resources/August/drive.png   →  <output>/assets/resources/August/drive.jpg
//! resources/August/cad.pdf     →  <output>/assets/resources/August/cad.pdf
//! ```
//!
//! # Caching
//!
//! Two layers keep repeated work down:
//!
//! - **Within a run**: results are cached by canonical (symlink-resolved)
//!   source path, so an image referenced from ten pages is processed once
//!   and every reference gets the same href.
//! - **Across runs**: an output whose modification time is not older than
//!   its source is reused as-is. Raster reuse skips decoding entirely, so an
//!   unchanged source leaves a byte-identical output.
//!
//! # Failure handling
//!
//! A raster image the backend cannot process (corrupt file, unsupported
//! variant) is copied verbatim instead, and the failure is counted in
//! [`AssetStats::failures`]. Filesystem errors are returned to the caller.
//!
//! # Shared output names
//!
//! Sibling rasters such as `x.png` and `x.jpg` both map to `x.jpg`. The
//! first source seen in a run keeps that name; any later source claiming it
//! is written to `x-<ext>.jpg` instead and recorded as an [`AssetConflict`].
//!
//! # Concurrency
//!
//! Nothing here locks the output tree. Two exports writing to the same
//! output directory at once may interleave file writes; callers must not
//! run them concurrently.

use crate::imaging::{BackendError, BoundingBox, DownscaleParams, ImageBackend, Quality, is_raster};
use crate::resolve::{ResolvedSrc, encode_local_href, relative_path};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Name of the mirror directory inside the output directory.
pub const ASSETS_DIRNAME: &str = "assets";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> AssetError + '_ {
    move |source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Byte and file counters for one export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetStats {
    /// Total size of the sources that were processed or copied.
    pub original_bytes: u64,
    /// Total size of the outputs written for them.
    pub output_bytes: u64,
    /// Raster images decoded, downscaled and re-encoded.
    pub resized: usize,
    /// Files copied verbatim (non-raster, or raster fallback).
    pub copied: usize,
    /// Raster images the backend failed on.
    pub failures: usize,
}

impl AssetStats {
    pub fn total(&self) -> usize {
        self.resized + self.copied
    }

    /// Bytes saved by processing; negative when outputs grew.
    pub fn saved_bytes(&self) -> i64 {
        self.original_bytes as i64 - self.output_bytes as i64
    }
}

impl fmt::Display for AssetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MB: f64 = 1024.0 * 1024.0;
        write!(
            f,
            "{} assets ({} resized, {} copied). {:.1} MB → {:.1} MB (saved {:.1} MB)",
            self.total(),
            self.resized,
            self.copied,
            self.original_bytes as f64 / MB,
            self.output_bytes as f64 / MB,
            self.saved_bytes() as f64 / MB,
        )
    }
}

/// Two sources that map to the same file under `assets/`.
///
/// Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConflict {
    /// Output both sources would have used.
    pub target: PathBuf,
    /// Source that kept `target`.
    pub first: PathBuf,
    /// Source that was renamed.
    pub second: PathBuf,
}

/// Image settings applied to every raster asset.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetSettings {
    pub bounds: BoundingBox,
    pub quality: Quality,
}

/// Produces processed copies of referenced files under `<output>/assets/`.
pub struct AssetManager<B: ImageBackend> {
    root: PathBuf,
    assets_dir: PathBuf,
    backend: B,
    settings: AssetSettings,
    cache: HashMap<PathBuf, String>,
    /// Output path → canonical source that claimed it this run.
    claims: HashMap<PathBuf, PathBuf>,
    conflicts: Vec<AssetConflict>,
    stats: AssetStats,
}

impl<B: ImageBackend> AssetManager<B> {
    /// Create the manager and its `assets/` directory.
    ///
    /// `root` must be canonical; sources outside it are never copied.
    pub fn new(
        root: impl Into<PathBuf>,
        output_dir: &Path,
        backend: B,
        settings: AssetSettings,
    ) -> Result<Self, AssetError> {
        let assets_dir = output_dir.join(ASSETS_DIRNAME);
        fs::create_dir_all(&assets_dir).map_err(io_err(&assets_dir))?;
        Ok(Self {
            root: root.into(),
            assets_dir,
            backend,
            settings,
            cache: HashMap::new(),
            claims: HashMap::new(),
            conflicts: Vec::new(),
            stats: AssetStats::default(),
        })
    }

    pub fn stats(&self) -> &AssetStats {
        &self.stats
    }

    /// Finish the run and hand back its counters.
    pub fn into_stats(self) -> AssetStats {
        self.stats
    }

    /// Sources that had to be renamed because another took their output.
    pub fn conflicts(&self) -> &[AssetConflict] {
        &self.conflicts
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Return the href to embed for `resolved`, processing it if needed.
    ///
    /// - empty href → `""`
    /// - external, missing, or out-of-root → the href unchanged
    /// - otherwise → href of the processed copy under `assets/`
    pub fn prepare_image(&mut self, resolved: &ResolvedSrc) -> Result<String, AssetError> {
        if resolved.href.is_empty() {
            return Ok(String::new());
        }
        let Some(fs_path) = resolved.fs_path.as_deref().filter(|p| p.exists()) else {
            return Ok(resolved.href.clone());
        };

        let source = fs::canonicalize(fs_path).map_err(io_err(fs_path))?;
        if let Some(href) = self.cache.get(&source) {
            return Ok(href.clone());
        }
        let Ok(rel) = source.strip_prefix(&self.root).map(Path::to_path_buf) else {
            return Ok(resolved.href.clone());
        };

        let raster = is_raster(&source);
        let target = self.claim_target(&source, &rel, raster);
        let target = if raster {
            self.prepare_raster(&source, target)?
        } else {
            self.prepare_copy(&source, target)?
        };

        let href = encode_local_href(&relative_path(&self.root, &target));
        self.cache.insert(source, href.clone());
        Ok(href)
    }

    /// Output path for `source`, renamed when another source already owns it.
    fn claim_target(&mut self, source: &Path, rel: &Path, raster: bool) -> PathBuf {
        let mut target = if raster {
            self.assets_dir.join(rel.with_extension("jpg"))
        } else {
            self.assets_dir.join(rel)
        };
        if let Some(first) = self.claims.get(&target).cloned()
            && first != source
        {
            let conflict = AssetConflict {
                target: relative_to(&target, &self.root),
                first: relative_to(&first, &self.root),
                second: rel.to_path_buf(),
            };
            target = disambiguate(&target, source);
            log::warn!(
                "{} and {} both map to {}; writing the second to {}",
                conflict.first.display(),
                conflict.second.display(),
                conflict.target.display(),
                target.display()
            );
            self.conflicts.push(conflict);
        }
        self.claims.insert(target.clone(), source.to_path_buf());
        target
    }

    fn prepare_copy(&mut self, source: &Path, target: PathBuf) -> Result<PathBuf, AssetError> {
        ensure_parent(&target)?;
        if is_stale(&target, source)? {
            copy_preserving_mtime(source, &target)?;
            log::debug!("Copied asset without resize: {} -> {}", source.display(), target.display());
        }
        self.record_copy(source, &target)?;
        Ok(target)
    }

    fn prepare_raster(&mut self, source: &Path, target: PathBuf) -> Result<PathBuf, AssetError> {
        ensure_parent(&target)?;
        if !is_stale(&target, source)? {
            log::debug!("Reusing processed image {}", target.display());
            return Ok(target);
        }

        let params = DownscaleParams {
            source: source.to_path_buf(),
            output: target.clone(),
            bounds: self.settings.bounds,
            quality: self.settings.quality,
        };
        match self.backend.downscale(&params) {
            Ok(dims) => {
                let original = file_size(source)?;
                let output = file_size(&target)?;
                log::debug!(
                    "Resized image {} -> {} ({}x{}, original {:.1} KB, output {:.1} KB)",
                    source.display(),
                    target.display(),
                    dims.width,
                    dims.height,
                    original as f64 / 1024.0,
                    output as f64 / 1024.0,
                );
                self.stats.resized += 1;
                self.stats.original_bytes += original;
                self.stats.output_bytes += output;
            }
            Err(err) => {
                self.record_failure(source, &err);
                copy_preserving_mtime(source, &target)?;
                self.record_copy(source, &target)?;
            }
        }
        Ok(target)
    }

    fn record_copy(&mut self, source: &Path, target: &Path) -> Result<(), AssetError> {
        let original = file_size(source)?;
        let output = if target.exists() { file_size(target)? } else { original };
        self.stats.copied += 1;
        self.stats.original_bytes += original;
        self.stats.output_bytes += output;
        Ok(())
    }

    fn record_failure(&mut self, source: &Path, err: &BackendError) {
        log::warn!("Failed to resize {} ({}); copying original", source.display(), err);
        self.stats.failures += 1;
    }
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}

/// `x.jpg` for source `x.png` → `x-png.jpg`.
fn disambiguate(target: &Path, source: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    let ext = source.extension().unwrap_or_default().to_string_lossy();
    let name = match target.extension() {
        Some(out) => format!("{stem}-{ext}.{}", out.to_string_lossy()),
        None => format!("{stem}-{ext}"),
    };
    target.with_file_name(name)
}

fn ensure_parent(target: &Path) -> Result<(), AssetError> {
    match target.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(io_err(parent)),
        None => Ok(()),
    }
}

fn file_size(path: &Path) -> Result<u64, AssetError> {
    Ok(fs::metadata(path).map_err(io_err(path))?.len())
}

fn modified(path: &Path) -> Result<SystemTime, AssetError> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(io_err(path))
}

/// A target is stale when missing or older than its source.
fn is_stale(target: &Path, source: &Path) -> Result<bool, AssetError> {
    if !target.exists() {
        return Ok(true);
    }
    Ok(modified(target)? < modified(source)?)
}

/// Copy `source` to `target` and carry over the source's modification time.
fn copy_preserving_mtime(source: &Path, target: &Path) -> Result<(), AssetError> {
    fs::copy(source, target).map_err(io_err(target))?;
    let mtime = modified(source)?;
    fs::File::options()
        .write(true)
        .open(target)
        .and_then(|f| f.set_modified(mtime))
        .map_err(io_err(target))
}

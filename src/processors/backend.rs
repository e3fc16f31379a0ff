// texbatch/src/processors/backend.rs
use crate::core::{ImageDescriptor, Result};
use image::Rgba32FImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory pixels handed between backend operations.
pub type PixelBuffer = Rgba32FImage;

/// Blur kernel: a named shape with independent horizontal and vertical widths in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelSpec {
    pub name: String,
    pub width_x: f32,
    pub width_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Lat-long environment map.
    EnvLatLong,
    Texture,
}

/// Pixel-level operations the conversion pipeline drives.
///
/// Implementations own format support and pixel correctness. Every method is
/// called from a worker thread, one call at a time.
pub trait ImagingBackend: Send + Sync {
    fn describe(&self, path: &Path) -> Result<ImageDescriptor>;

    fn read(&self, path: &Path) -> Result<Arc<PixelBuffer>>;

    fn resize(&self, buffer: &PixelBuffer, width: u32, height: u32, filter: &str) -> Result<PixelBuffer>;

    fn convolve(&self, buffer: &PixelBuffer, kernel: &KernelSpec) -> Result<PixelBuffer>;

    fn color_convert(&self, buffer: &PixelBuffer, from: &str, to: &str) -> Result<PixelBuffer>;

    fn encode_tiled_texture(
        &self,
        buffer: &PixelBuffer,
        out: &Path,
        tile_size: u32,
        filter: &str,
        kind: TextureKind,
    ) -> Result<()>;

    fn encode_image(&self, buffer: &PixelBuffer, out: &Path, quality: u8) -> Result<()>;

    /// Drop anything cached for `path`.
    fn invalidate_cache(&self, path: &Path);
}

/// Invalidates the backend cache for one file when dropped.
pub struct CacheScope<'a> {
    backend: &'a dyn ImagingBackend,
    path: PathBuf,
}

impl<'a> CacheScope<'a> {
    pub fn new(backend: &'a dyn ImagingBackend, path: &Path) -> Self {
        Self {
            backend,
            path: path.to_path_buf(),
        }
    }
}

impl Drop for CacheScope<'_> {
    fn drop(&mut self) {
        self.backend.invalidate_cache(&self.path);
    }
}

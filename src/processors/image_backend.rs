// texbatch/src/processors/image_backend.rs
use crate::core::{ImageDescriptor, Result};
use crate::processors::backend::{ImagingBackend, KernelSpec, PixelBuffer, TextureKind};
use crate::processors::compressor::Compressor;
use crate::processors::filter;
use crate::processors::loader::Loader;
use crate::processors::resizer::Resizer;
use std::path::Path;
use std::sync::Arc;

/// Backend built on the `image` and `exr` codecs.
#[derive(Default)]
pub struct ImageBackend {
    loader: Loader,
}

impl ImageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded buffers currently held in the cache.
    pub fn cached_entries(&self) -> usize {
        self.loader.cached_entries()
    }
}

impl ImagingBackend for ImageBackend {
    fn describe(&self, path: &Path) -> Result<ImageDescriptor> {
        self.loader.describe(path)
    }

    fn read(&self, path: &Path) -> Result<Arc<PixelBuffer>> {
        self.loader.load(path)
    }

    fn resize(&self, buffer: &PixelBuffer, width: u32, height: u32, filter: &str) -> Result<PixelBuffer> {
        Resizer::from_name(filter)?.resize(buffer, width, height)
    }

    fn convolve(&self, buffer: &PixelBuffer, kernel: &KernelSpec) -> Result<PixelBuffer> {
        filter::convolve(buffer, kernel)
    }

    fn color_convert(&self, buffer: &PixelBuffer, from: &str, to: &str) -> Result<PixelBuffer> {
        filter::color_convert(buffer, from, to)
    }

    fn encode_tiled_texture(
        &self,
        buffer: &PixelBuffer,
        out: &Path,
        tile_size: u32,
        filter: &str,
        kind: TextureKind,
    ) -> Result<()> {
        let resizer = Resizer::from_name(filter)?;
        Compressor::new(100).save_tiled_exr(buffer, out, tile_size, &resizer, kind)
    }

    fn encode_image(&self, buffer: &PixelBuffer, out: &Path, quality: u8) -> Result<()> {
        Compressor::new(quality).save_jpeg(buffer, out)
    }

    fn invalidate_cache(&self, path: &Path) {
        self.loader.invalidate(path);
    }
}

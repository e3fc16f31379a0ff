// texbatch/src/processors/pipeline.rs
use crate::core::{Asset, ConvertConfig, ConvertError, Result, WorkItem, WorkKind};
use crate::processors::backend::{CacheScope, ImagingBackend, KernelSpec, PixelBuffer, TextureKind};
use crate::processors::committer::{ProducedOutput, ResultCommitter};
use crate::processors::monitor::ProgressMonitor;
use crate::utils::resize_height;
use std::path::Path;

/// Display slots for the in-flight unit of work.
pub const SLOT_SAVING: usize = 0;
pub const SLOT_RESIZING: usize = 1;
pub const SLOT_FILTERING: usize = 2;

/// Runs the backend operations for one work item.
///
/// Never fails: every error ends up in the returned `ProducedOutput`.
pub struct ConversionPipeline<'a> {
    backend: &'a dyn ImagingBackend,
    config: &'a ConvertConfig,
    monitor: ProgressMonitor<'a>,
    committer: ResultCommitter,
}

impl<'a> ConversionPipeline<'a> {
    pub fn new(backend: &'a dyn ImagingBackend, config: &'a ConvertConfig, monitor: ProgressMonitor<'a>) -> Self {
        Self {
            backend,
            config,
            monitor,
            committer: ResultCommitter::new(),
        }
    }

    /// Convert `item` into a staged file inside `output_dir`.
    pub fn run(&self, item: &WorkItem, output_dir: &Path) -> ProducedOutput {
        let asset = &item.asset;
        let _scope = CacheScope::new(self.backend, asset.path());

        log::debug!("{} {}", item.kind.label(), asset);

        let staged = match self
            .committer
            .stage(output_dir, asset.stem(), self.marker(item.kind))
        {
            Ok(staged) => staged,
            Err(e) => return ProducedOutput::failed(&e),
        };

        let outcome = match item.kind {
            WorkKind::Tile => self.tile(asset, staged.path()),
            WorkKind::Blur => self.blur(asset, staged.path()),
            WorkKind::Preview => self.preview(asset, staged.path()),
            WorkKind::MipmapTexture => self.mipmap(asset, staged.path()),
        };

        match outcome {
            Ok(()) => ProducedOutput::produced(staged),
            Err(e) => {
                drop(staged);
                ProducedOutput::failed(&e)
            }
        }
    }

    fn marker(&self, kind: WorkKind) -> &str {
        match kind {
            WorkKind::Tile => &self.config.tiled_marker,
            WorkKind::Blur => &self.config.blurred_marker,
            WorkKind::Preview => "",
            WorkKind::MipmapTexture => &self.config.mipmap_marker,
        }
    }

    /// Size as reported by the backend header, not the decoded buffer.
    fn source_size(&self, asset: &Asset) -> Result<(u32, u32)> {
        let descriptor = self.backend.describe(asset.path()).map_err(|e| match e {
            ConvertError::ClassificationRead { path, message } => ConvertError::Backend { path, message },
            other => other,
        })?;
        Ok((descriptor.width, descriptor.height))
    }

    fn tile(&self, asset: &Asset, out: &Path) -> Result<()> {
        let backend = self.backend;
        let config = self.config;
        let (width, height) = self.source_size(asset)?;
        let source = backend.read(asset.path())?;

        let resized;
        let buffer: &PixelBuffer = if width > config.hdr_max_width {
            let new_height = resize_height(width, height, config.hdr_max_width);
            log::debug!(
                "{} is {}x{}, downsizing to {}x{}",
                asset,
                width,
                height,
                config.hdr_max_width,
                new_height
            );
            resized = self.monitor.run(SLOT_RESIZING, "Resizing", || {
                backend.resize(&source, config.hdr_max_width, new_height, &config.resize_filter)
            })?;
            &resized
        } else {
            &source
        };

        self.monitor.run(SLOT_SAVING, "Saving", || {
            backend.encode_tiled_texture(
                buffer,
                out,
                config.tile_size,
                &config.texture_filter,
                TextureKind::EnvLatLong,
            )
        })
    }

    fn blur(&self, asset: &Asset, out: &Path) -> Result<()> {
        let backend = self.backend;
        let config = self.config;
        let (width, height) = self.source_size(asset)?;
        let source = backend.read(asset.path())?;
        let new_height = resize_height(width, height, config.blur_width);

        let resized = self.monitor.run(SLOT_RESIZING, "Resizing", || {
            backend.resize(&source, config.blur_width, new_height, &config.resize_filter)
        })?;
        drop(source);

        let kernel = KernelSpec {
            name: config.blur_filter.clone(),
            width_x: config.blur_amount_x,
            width_y: config.blur_amount_y,
        };
        let blurred = self
            .monitor
            .run(SLOT_FILTERING, "Blurring", || backend.convolve(&resized, &kernel))?;
        drop(resized);

        self.monitor.run(SLOT_SAVING, "Saving", || {
            backend.encode_tiled_texture(
                &blurred,
                out,
                config.tile_size,
                &config.texture_filter,
                TextureKind::EnvLatLong,
            )
        })
    }

    fn preview(&self, asset: &Asset, out: &Path) -> Result<()> {
        let backend = self.backend;
        let config = self.config;
        let (width, height) = self.source_size(asset)?;
        let source = backend.read(asset.path())?;
        let new_height = resize_height(width, height, config.thumbnail_width);

        let display = self.monitor.run(SLOT_FILTERING, "Lin2sRGB", || {
            backend.color_convert(&source, "linear", "sRGB")
        })?;
        drop(source);

        let thumbnail = self.monitor.run(SLOT_RESIZING, "Resizing", || {
            backend.resize(&display, config.thumbnail_width, new_height, &config.resize_filter)
        })?;

        self.monitor.run(SLOT_SAVING, "Saving", || {
            backend.encode_image(&thumbnail, out, config.preview_quality)
        })
    }

    fn mipmap(&self, asset: &Asset, out: &Path) -> Result<()> {
        let backend = self.backend;
        let config = self.config;
        let source = backend.read(asset.path())?;

        self.monitor.run(SLOT_SAVING, "Saving", || {
            backend.encode_tiled_texture(
                &source,
                out,
                config.tile_size,
                &config.texture_filter,
                TextureKind::Texture,
            )
        })
    }
}

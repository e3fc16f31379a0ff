// texbatch/src/processors/classifier.rs
use crate::core::{Asset, ConvertConfig, ImageDescriptor, Layout, Result, WorkKind};
use crate::processors::backend::{CacheScope, ImagingBackend};
use crate::processors::scanner::FileScanner;
use crate::utils::{derived_path, has_marker};
use std::collections::HashSet;
use std::path::Path;

/// Disjoint per-kind queues computed from one directory snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkQueues {
    tile: Vec<Asset>,
    blur: Vec<Asset>,
    preview: Vec<Asset>,
    mipmap: Vec<Asset>,
    unreadable: Vec<Asset>,
}

impl WorkQueues {
    pub fn queue(&self, kind: WorkKind) -> &[Asset] {
        match kind {
            WorkKind::Tile => &self.tile,
            WorkKind::Blur => &self.blur,
            WorkKind::Preview => &self.preview,
            WorkKind::MipmapTexture => &self.mipmap,
        }
    }

    pub fn push(&mut self, kind: WorkKind, asset: Asset) {
        self.queue_mut(kind).push(asset);
    }

    /// Files the backend could not open; they are in no queue.
    pub fn unreadable(&self) -> &[Asset] {
        &self.unreadable
    }

    pub fn total(&self) -> usize {
        self.tile.len() + self.blur.len() + self.preview.len() + self.mipmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Point pending items that reference `old` at `new`, keeping their position.
    /// Returns how many entries changed.
    pub fn repoint(&mut self, old: &Asset, new: &Asset) -> usize {
        let mut changed = 0;
        for queue in [&mut self.tile, &mut self.blur, &mut self.preview, &mut self.mipmap] {
            for asset in queue.iter_mut().filter(|asset| *asset == old) {
                *asset = new.clone();
                changed += 1;
            }
        }
        changed
    }

    fn queue_mut(&mut self, kind: WorkKind) -> &mut Vec<Asset> {
        match kind {
            WorkKind::Tile => &mut self.tile,
            WorkKind::Blur => &mut self.blur,
            WorkKind::Preview => &mut self.preview,
            WorkKind::MipmapTexture => &mut self.mipmap,
        }
    }
}

/// Decides which derived artifacts each asset still needs.
pub struct WorkClassifier<'a> {
    backend: &'a dyn ImagingBackend,
    config: &'a ConvertConfig,
}

impl<'a> WorkClassifier<'a> {
    pub fn new(backend: &'a dyn ImagingBackend, config: &'a ConvertConfig) -> Self {
        Self { backend, config }
    }

    /// Tile, Blur and Preview queues for the lighting directory.
    pub fn classify_hdrs<I>(&self, assets: I, layout: &Layout) -> WorkQueues
    where
        I: IntoIterator<Item = Asset>,
    {
        let preview_stems = self.preview_stems(&layout.preview_dir);
        let mut queues = WorkQueues::default();

        for asset in assets {
            let descriptor = match self.describe(&asset) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    log::warn!("Skipping {}: {}", asset, e);
                    queues.unreadable.push(asset);
                    continue;
                }
            };

            if self.needs_blur(&asset, &layout.blur_dir) {
                queues.push(WorkKind::Blur, asset.clone());
            }
            if descriptor.needs_tiling() {
                queues.push(WorkKind::Tile, asset.clone());
            }
            if !preview_stems.contains(asset.stem()) {
                queues.push(WorkKind::Preview, asset.clone());
            }
        }

        log::debug!(
            "Classified HDRs: {} tiling, {} blurring, {} previews, {} unreadable",
            queues.tile.len(),
            queues.blur.len(),
            queues.preview.len(),
            queues.unreadable.len()
        );

        queues
    }

    /// MipmapTexture queue for texture mode.
    pub fn classify_textures<I>(&self, assets: I) -> WorkQueues
    where
        I: IntoIterator<Item = Asset>,
    {
        let mut queues = WorkQueues::default();

        for asset in assets {
            if has_marker(asset.stem(), &self.config.mipmap_marker) {
                log::debug!("{} is a previous output, skipping", asset);
                continue;
            }

            let descriptor = match self.describe(&asset) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    log::warn!("Skipping {}: {}", asset, e);
                    queues.unreadable.push(asset);
                    continue;
                }
            };

            if descriptor.needs_tiling() && !self.mipmap_path(&asset).exists() {
                queues.push(WorkKind::MipmapTexture, asset);
            }
        }

        log::debug!(
            "Classified textures: {} need mip-maps, {} unreadable",
            queues.mipmap.len(),
            queues.unreadable.len()
        );

        queues
    }

    pub fn needs_blur(&self, asset: &Asset, blur_dir: &Path) -> bool {
        !has_marker(asset.stem(), &self.config.blurred_marker) && !self.blur_path(asset, blur_dir).exists()
    }

    pub fn blur_path(&self, asset: &Asset, blur_dir: &Path) -> std::path::PathBuf {
        derived_path(
            blur_dir,
            asset.stem(),
            &self.config.blurred_marker,
            &self.config.hdr_extension,
        )
    }

    pub fn preview_path(&self, asset: &Asset, preview_dir: &Path) -> std::path::PathBuf {
        derived_path(preview_dir, asset.stem(), "", &self.config.thumbnail_extension)
    }

    pub fn mipmap_path(&self, asset: &Asset) -> std::path::PathBuf {
        derived_path(
            asset.directory(),
            asset.stem(),
            &self.config.mipmap_marker,
            &self.config.mipmap_extension,
        )
    }

    fn describe(&self, asset: &Asset) -> Result<ImageDescriptor> {
        let _scope = CacheScope::new(self.backend, asset.path());
        self.backend.describe(asset.path())
    }

    fn preview_stems(&self, preview_dir: &Path) -> HashSet<String> {
        FileScanner::new(preview_dir, std::slice::from_ref(&self.config.thumbnail_extension))
            .scan()
            .map(|asset| asset.stem().to_string())
            .collect()
    }
}

// texbatch/src/processors/loader.rs
use crate::core::{ConvertError, ImageDescriptor, Result};
use crate::processors::backend::PixelBuffer;
use crate::utils::image_format_to_string;
use exr::math::RoundingMode;
use exr::meta::attribute::LevelMode;
use exr::meta::{BlockDescription, MetaData};
use image::ImageReader;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const EXR_MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

/// Decodes files and caches decoded pixels per path.
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
    cache: Mutex<HashMap<PathBuf, Arc<PixelBuffer>>>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((100_000, 100_000)),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    pub fn describe(&self, path: &Path) -> Result<ImageDescriptor> {
        self.describe_inner(path)
            .map_err(|e| match e {
                ConvertError::ClassificationRead { .. } => e,
                other => ConvertError::ClassificationRead {
                    path: path.to_path_buf(),
                    message: other.to_string(),
                },
            })
    }

    fn describe_inner(&self, path: &Path) -> Result<ImageDescriptor> {
        self.validate_path(path)?;

        if is_exr(path)? {
            return exr_descriptor(path);
        }

        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader
            .format()
            .map(image_format_to_string)
            .unwrap_or_else(|| "Unknown".to_string());
        let (width, height) = reader.into_dimensions()?;

        Ok(ImageDescriptor {
            width,
            height,
            tile_width: 0,
            tile_height: 0,
            mip_levels: 1,
            format,
        })
    }

    pub fn load(&self, path: &Path) -> Result<Arc<PixelBuffer>> {
        if let Some(buffer) = self.cached(path) {
            log::debug!("Cache hit for {}", path.display());
            return Ok(buffer);
        }

        log::debug!("Loading image from: {}", path.display());
        self.validate_path(path)?;

        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| ConvertError::Backend {
                path: path.to_path_buf(),
                message: format!("Failed to decode image: {}", e),
            })?;

        if let Some((max_w, max_h)) = self.max_dimensions {
            if image.width() > max_w || image.height() > max_h {
                return Err(ConvertError::Backend {
                    path: path.to_path_buf(),
                    message: format!(
                        "Image dimensions {}x{} exceed maximum {}x{}",
                        image.width(),
                        image.height(),
                        max_w,
                        max_h
                    ),
                });
            }
        }

        log::debug!(
            "Loaded image: {}x{} pixels, format: {:?}",
            image.width(),
            image.height(),
            image.color()
        );

        let buffer = Arc::new(image.into_rgba32f());
        self.lock_cache()
            .insert(path.to_path_buf(), Arc::clone(&buffer));

        Ok(buffer)
    }

    pub fn invalidate(&self, path: &Path) {
        if self.lock_cache().remove(path).is_some() {
            log::debug!("Invalidated cache entry for {}", path.display());
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.lock_cache().len()
    }

    fn cached(&self, path: &Path) -> Option<Arc<PixelBuffer>> {
        self.lock_cache().get(path).cloned()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<PixelBuffer>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn validate_path(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ConvertError::ClassificationRead {
                path: path.to_path_buf(),
                message: "File does not exist".to_string(),
            });
        }

        let metadata = path.metadata()?;
        if metadata.len() == 0 {
            return Err(ConvertError::ClassificationRead {
                path: path.to_path_buf(),
                message: "File is empty".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_exr(path: &Path) -> Result<bool> {
    let mut magic = [0u8; 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == EXR_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn exr_descriptor(path: &Path) -> Result<ImageDescriptor> {
    let meta = MetaData::read_from_file(path, false)?;
    let header = meta.headers.first().ok_or_else(|| ConvertError::ClassificationRead {
        path: path.to_path_buf(),
        message: "OpenEXR file has no layers".to_string(),
    })?;

    let width = header.layer_size.0 as u32;
    let height = header.layer_size.1 as u32;

    let (tile_width, tile_height, mip_levels) = match &header.blocks {
        BlockDescription::ScanLines => (0, 0, 1),
        BlockDescription::Tiles(tiles) => {
            let levels = match tiles.level_mode {
                LevelMode::Singular => 1,
                LevelMode::MipMap | LevelMode::RipMap => mip_level_count(
                    width,
                    height,
                    matches!(tiles.rounding_mode, RoundingMode::Up),
                ),
            };
            (tiles.tile_size.0 as u32, tiles.tile_size.1 as u32, levels)
        }
    };

    Ok(ImageDescriptor {
        width,
        height,
        tile_width,
        tile_height,
        mip_levels,
        format: "OpenEXR".to_string(),
    })
}

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32, round_up: bool) -> u32 {
    let mut size = width.max(height).max(1);
    let mut levels = 1;
    while size > 1 {
        size = if round_up { (size + 1) / 2 } else { size / 2 };
        levels += 1;
    }
    levels
}

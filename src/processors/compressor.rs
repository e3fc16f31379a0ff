// texbatch/src/processors/compressor.rs
use crate::core::{ConvertError, Result};
use crate::processors::backend::{PixelBuffer, TextureKind};
use crate::processors::resizer::Resizer;
use crate::utils::format_file_size;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes tiled mip-mapped OpenEXR textures and JPEG previews.
pub struct Compressor {
    quality: u8,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn save_jpeg(&self, image: &PixelBuffer, path: &Path) -> Result<()> {
        log::debug!(
            "Saving JPEG to {}, quality: {}",
            path.display(),
            self.quality
        );

        let rgb = DynamicImage::ImageRgba32F(image.clone()).to_rgb8();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        JpegEncoder::new_with_quality(&mut writer, self.quality).encode_image(&rgb)?;
        writer.flush()?;

        self.log_save_result(path)
    }

    /// Tiled OpenEXR with a full round-down mip chain.
    pub fn save_tiled_exr(
        &self,
        image: &PixelBuffer,
        path: &Path,
        tile_size: u32,
        resizer: &Resizer,
        kind: TextureKind,
    ) -> Result<()> {
        if tile_size == 0 {
            return Err(ConvertError::InvalidParameter("Tile size must be greater than zero".to_string()));
        }

        let (width, height) = image.dimensions();
        log::debug!(
            "Saving {:?} texture {}x{} to {} with {}x{} tiles",
            kind,
            width,
            height,
            path.display(),
            tile_size,
            tile_size
        );

        let levels = self.mip_chain(image, resizer)?;

        exr_writer::write_mip_mapped(&levels, path, tile_size as usize).map_err(|e| {
            ConvertError::Backend {
                path: path.to_path_buf(),
                message: format!("Failed to write tiled EXR: {}", e),
            }
        })?;

        self.log_save_result(path)
    }

    fn mip_chain(&self, image: &PixelBuffer, resizer: &Resizer) -> Result<Vec<PixelBuffer>> {
        let mut levels = vec![image.clone()];

        loop {
            let (width, height) = match levels.last() {
                Some(last) => last.dimensions(),
                None => break,
            };
            if width <= 1 && height <= 1 {
                break;
            }

            let next_width = (width / 2).max(1);
            let next_height = (height / 2).max(1);
            let next = resizer.resize(&levels[levels.len() - 1], next_width, next_height)?;
            levels.push(next);
        }

        log::debug!("Built {} mip levels", levels.len());
        Ok(levels)
    }

    fn log_save_result(&self, path: &Path) -> Result<()> {
        let file_size = std::fs::metadata(path)?.len();
        log::info!("Saved image: {} ({})", path.display(), format_file_size(file_size));
        Ok(())
    }
}

mod exr_writer {
    use super::PixelBuffer;
    use exr::math::RoundingMode;
    use exr::prelude::*;
    use std::path::Path;

    const CHANNEL_NAMES: [&str; 4] = ["R", "G", "B", "A"];

    /// `levels[0]` is the full resolution image, each following level half the previous.
    pub(super) fn write_mip_mapped(levels: &[PixelBuffer], path: &Path, tile_size: usize) -> exr::error::Result<()> {
        let (width, height) = levels
            .first()
            .map(|level| level.dimensions())
            .unwrap_or((1, 1));

        let channels: Vec<AnyChannel<Levels<FlatSamples>>> = CHANNEL_NAMES
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let level_data = levels
                    .iter()
                    .map(|level| FlatSamples::F32(level.pixels().map(|p| p.0[index]).collect()))
                    .collect();

                AnyChannel::new(
                    *name,
                    Levels::Mip {
                        rounding_mode: RoundingMode::Down,
                        level_data,
                    },
                )
            })
            .collect();

        let layer = Layer::new(
            Vec2(width as usize, height as usize),
            LayerAttributes::default(),
            Encoding {
                compression: Compression::ZIP16,
                blocks: Blocks::Tiles(Vec2(tile_size, tile_size)),
                line_order: LineOrder::Increasing,
            },
            AnyChannels::sort(channels.into()),
        );

        Image::from_layer(layer).write().to_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResizeAlgorithm;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use image::Rgba;

    #[test]
    fn mip_chain_halves_down_to_one() {
        let image = PixelBuffer::from_pixel(16, 4, Rgba([1.0, 1.0, 1.0, 1.0]));
        let resizer = Resizer::new(ResizeAlgorithm::Bilinear);

        let levels = Compressor::new(80).mip_chain(&image, &resizer).unwrap();
        let sizes: Vec<(u32, u32)> = levels.iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, vec![(16, 4), (8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn writes_a_jpeg() {
        let temp = TempDir::new().unwrap();
        let out = temp.child("preview.jpg");
        let image = PixelBuffer::from_pixel(27, 13, Rgba([0.2, 0.4, 0.8, 1.0]));

        Compressor::new(80).save_jpeg(&image, out.path()).unwrap();

        let decoded = image::open(out.path()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (27, 13));
    }
}

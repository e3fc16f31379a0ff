// texbatch/src/processors/resizer.rs
use crate::core::{ConvertError, ResizeAlgorithm, Result};
use crate::processors::backend::PixelBuffer;
use image::imageops::{self, FilterType};

pub struct Resizer {
    algorithm: ResizeAlgorithm,
    max_dimension: u32,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self {
            algorithm,
            max_dimension: 100_000,
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        ResizeAlgorithm::from_name(name)
            .map(Self::new)
            .ok_or_else(|| ConvertError::InvalidParameter(format!("Unknown resampling filter: {}", name)))
    }

    pub fn resize(&self, image: &PixelBuffer, width: u32, height: u32) -> Result<PixelBuffer> {
        if width == 0 || height == 0 {
            return Err(ConvertError::InvalidParameter(format!(
                "Cannot resize to {}x{}",
                width, height
            )));
        }

        if width > self.max_dimension || height > self.max_dimension {
            return Err(ConvertError::InvalidParameter(format!(
                "Target resolution {}x{} exceeds maximum {}",
                width, height, self.max_dimension
            )));
        }

        if width == image.width() && height == image.height() {
            log::debug!("Image dimensions unchanged, skipping resize");
            return Ok(image.clone());
        }

        log::debug!(
            "Resizing image from {}x{} to {}x{} ({:?})",
            image.width(),
            image.height(),
            width,
            height,
            self.algorithm
        );

        Ok(imageops::resize(image, width, height, self.filter_type()))
    }

    fn filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Gaussian => FilterType::Gaussian,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

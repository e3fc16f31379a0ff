// texbatch/src/core/mod.rs
mod asset;
pub mod processor;
mod report;

pub use asset::{Asset, ConversionResult, ErrorKind, ImageDescriptor, WorkItem, WorkKind};
pub use report::{Phase, PhaseOutcome, RunReport};
pub use processor::Converter;

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Resampling filters understood by the bundled backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Gaussian,
    Lanczos3,
}

impl ResizeAlgorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "nearest" | "box" => Some(Self::Nearest),
            "triangle" | "bilinear" => Some(Self::Bilinear),
            "mitchell" | "catmull-rom" | "catmullrom" | "bicubic" | "cubic" => Some(Self::Bicubic),
            "gaussian" => Some(Self::Gaussian),
            "lanczos3" | "lanczos" => Some(Self::Lanczos3),
            _ => None,
        }
    }
}

/// Blur kernels understood by the bundled backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelShape {
    Box,
    Triangle,
    Gaussian,
    BSpline,
}

impl KernelShape {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "box" => Some(Self::Box),
            "triangle" => Some(Self::Triangle),
            "gaussian" => Some(Self::Gaussian),
            "bspline" | "b-spline" => Some(Self::BSpline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub hdr_max_width: u32,
    pub blur_width: u32,
    pub thumbnail_width: u32,
    pub tile_size: u32,
    pub blur_amount_x: f32,
    pub blur_amount_y: f32,
    pub blur_filter: String,
    pub resize_filter: String,
    pub texture_filter: String,
    pub preview_quality: u8,
    pub tiled_marker: String,
    pub blurred_marker: String,
    pub mipmap_marker: String,
    pub hdr_extension: String,
    pub mipmap_extension: String,
    pub thumbnail_extension: String,
    pub hdr_extensions: Vec<String>,
    pub texture_extensions: Vec<String>,
    pub poll_interval: Duration,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            hdr_max_width: 8192,
            blur_width: 4096,
            thumbnail_width: 270,
            tile_size: 64,
            blur_amount_x: 25.0,
            blur_amount_y: 35.0,
            blur_filter: "bspline".to_string(),
            resize_filter: "mitchell".to_string(),
            texture_filter: "lanczos3".to_string(),
            preview_quality: 80,
            tiled_marker: "-tiled".to_string(),
            blurred_marker: "-blurred".to_string(),
            mipmap_marker: "-mipmap".to_string(),
            hdr_extension: "exr".to_string(),
            mipmap_extension: "tx".to_string(),
            thumbnail_extension: "jpg".to_string(),
            hdr_extensions: vec!["exr".to_string(), "hdr".to_string()],
            texture_extensions: ["jpg", "jpeg", "exr", "tif", "hdr", "png"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hdr_max_width == 0 || self.blur_width == 0 || self.thumbnail_width == 0 {
            return Err(ConvertError::InvalidParameter(
                "Target widths must be greater than zero".to_string(),
            ));
        }

        if self.tile_size == 0 {
            return Err(ConvertError::InvalidParameter(
                "Tile size must be greater than zero".to_string(),
            ));
        }

        if self.blur_amount_x <= 0.0 || self.blur_amount_y <= 0.0 {
            return Err(ConvertError::InvalidParameter(
                "Blur amounts must be positive".to_string(),
            ));
        }

        if self.preview_quality == 0 || self.preview_quality > 100 {
            return Err(ConvertError::InvalidParameter(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        if self.hdr_extensions.is_empty() || self.texture_extensions.is_empty() {
            return Err(ConvertError::InvalidParameter(
                "Extension lists must not be empty".to_string(),
            ));
        }

        for name in [&self.resize_filter, &self.texture_filter] {
            if ResizeAlgorithm::from_name(name).is_none() {
                return Err(ConvertError::InvalidParameter(format!(
                    "Unknown resampling filter: {}",
                    name
                )));
            }
        }

        if KernelShape::from_name(&self.blur_filter).is_none() {
            return Err(ConvertError::InvalidParameter(format!(
                "Unknown blur kernel: {}",
                self.blur_filter
            )));
        }

        Ok(())
    }
}

/// Fixed directory layout of a lookdev scene.
#[derive(Debug, Clone)]
pub struct Layout {
    pub root: PathBuf,
    pub hdr_dir: PathBuf,
    pub preview_dir: PathBuf,
    pub blur_dir: PathBuf,
}

impl Layout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let hdr_dir = root.join("_ADAPTLOOKDEV_").join("lighting").join("hdr");

        Self {
            preview_dir: hdr_dir.join("previews"),
            blur_dir: hdr_dir.join("blurred"),
            hdr_dir,
            root,
        }
    }

    /// Create the preview and blur directories if they are missing.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.preview_dir, &self.blur_dir] {
            if !dir.is_dir() {
                std::fs::create_dir_all(dir).map_err(|e| ConvertError::Filesystem {
                    path: dir.clone(),
                    message: format!("Failed to create directory: {}", e),
                })?;
                log::debug!("Created directory {}", dir.display());
            }
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("EXR error: {0}")]
    Exr(#[from] exr::error::Error),

    #[error("Conversion failed for {path}: {message}")]
    Backend { path: PathBuf, message: String },

    #[error("Filesystem error at {path}: {message}")]
    Filesystem { path: PathBuf, message: String },

    #[error("Cannot read {path}: {message}")]
    ClassificationRead { path: PathBuf, message: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Io(_) | ConvertError::Filesystem { .. } => ErrorKind::Filesystem,
            ConvertError::ClassificationRead { .. } => ErrorKind::ClassificationRead,
            ConvertError::Image(_)
            | ConvertError::Exr(_)
            | ConvertError::Backend { .. }
            | ConvertError::InvalidParameter(_)
            | ConvertError::WorkerPanicked(_) => ErrorKind::Backend,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

pub fn validate_config(config: &ConvertConfig) -> Result<()> {
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ConvertConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_quality_and_filters() {
        let config = ConvertConfig {
            preview_quality: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConvertConfig {
            resize_filter: "sinc-of-doom".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConvertConfig {
            blur_filter: "lanczos3".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn filter_names_are_case_insensitive() {
        assert_eq!(ResizeAlgorithm::from_name("Mitchell"), Some(ResizeAlgorithm::Bicubic));
        assert_eq!(ResizeAlgorithm::from_name("LANCZOS3"), Some(ResizeAlgorithm::Lanczos3));
        assert_eq!(KernelShape::from_name("BSpline"), Some(KernelShape::BSpline));
    }

    #[test]
    fn layout_paths() {
        let layout = Layout::new("/scene");
        assert_eq!(layout.hdr_dir, Path::new("/scene/_ADAPTLOOKDEV_/lighting/hdr"));
        assert_eq!(layout.preview_dir, layout.hdr_dir.join("previews"));
        assert_eq!(layout.blur_dir, layout.hdr_dir.join("blurred"));
    }

    #[test]
    fn error_kinds() {
        let err = ConvertError::Backend {
            path: PathBuf::from("a.exr"),
            message: "corrupt".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Backend);

        let err = ConvertError::Filesystem {
            path: PathBuf::from("a.exr"),
            message: "missing".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Filesystem);
    }
}

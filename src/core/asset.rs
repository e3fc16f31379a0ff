// texbatch/src/core/asset.rs
use std::fmt;
use std::path::{Path, PathBuf};

/// A file on disk considered for conversion.
///
/// Identity is the path. A rename produces a new `Asset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    path: PathBuf,
    directory: PathBuf,
    stem: String,
    extension: String,
}

impl Asset {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path,
            directory,
            stem,
            extension,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Extension as found on disk, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Read-only image metadata reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    /// Zero when the format has no tiling.
    pub tile_width: u32,
    pub tile_height: u32,
    pub mip_levels: u32,
    pub format: String,
}

impl ImageDescriptor {
    /// True unless the file already is a properly tiled mip-map.
    pub fn needs_tiling(&self) -> bool {
        self.tile_width == self.width || self.tile_width == 0 || self.mip_levels == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkKind {
    Tile,
    Blur,
    Preview,
    MipmapTexture,
}

impl WorkKind {
    pub fn label(&self) -> &'static str {
        match self {
            WorkKind::Tile => "tiling",
            WorkKind::Blur => "blurring",
            WorkKind::Preview => "preview",
            WorkKind::MipmapTexture => "mipmap",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub asset: Asset,
    pub kind: WorkKind,
}

impl WorkItem {
    pub fn new(asset: Asset, kind: WorkKind) -> Self {
        Self { asset, kind }
    }
}

/// Coarse failure category carried by a `ConversionResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Backend,
    Filesystem,
    ClassificationRead,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub error_kind: Option<ErrorKind>,
    pub message: Option<String>,
}

impl ConversionResult {
    pub fn succeeded(output_path: PathBuf) -> Self {
        Self {
            success: true,
            output_path: Some(output_path),
            error_kind: None,
            message: None,
        }
    }

    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path: None,
            error_kind: Some(kind),
            message: Some(message.into()),
        }
    }
}

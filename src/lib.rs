mod cli;
mod core;
mod processors;
mod utils;

pub use cli::{parse_exclusions, Cli, Commands};
pub use core::{
    validate_config, Asset, ConversionResult, ConvertConfig, ConvertError, Converter, ErrorKind,
    ImageDescriptor, KernelShape, Layout, Phase, PhaseOutcome, ResizeAlgorithm, Result, RunReport,
    WorkItem, WorkKind,
};
pub use processors::{
    color_convert, convolve, kernel_weights, mip_level_count, replacement_path, CacheScope,
    ColorSpace, Compressor, ConversionPipeline, FileScanner, ImageBackend, ImagingBackend,
    IndicatifReporter, KernelSpec, Loader, PixelBuffer, ProducedOutput, ProgressMonitor,
    ProgressReporter, Resizer, ResultCommitter, SilentReporter, StagedOutput,
    TextureKind, WorkClassifier, WorkQueues, SLOT_FILTERING, SLOT_RESIZING, SLOT_SAVING,
};
pub use utils::{derived_path, format_file_size, has_extension, has_marker, resize_height};

pub mod prelude {
    pub use crate::{
        ConvertConfig, Converter, ImageBackend, ImagingBackend, Layout, ProgressReporter,
        RunReport, WorkKind,
    };
}

// Re-export commonly used types
pub use image::Rgba32FImage;

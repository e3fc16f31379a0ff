// texbatch/src/processors/mod.rs
mod backend;
mod classifier;
mod committer;
mod compressor;
mod filter;
mod image_backend;
mod loader;
mod monitor;
mod pipeline;
mod resizer;
mod scanner;

pub use backend::{CacheScope, ImagingBackend, KernelSpec, PixelBuffer, TextureKind};
pub use classifier::{WorkClassifier, WorkQueues};
pub use committer::{replacement_path, ProducedOutput, ResultCommitter, StagedOutput};
pub use compressor::Compressor;
pub use filter::{color_convert, convolve, kernel_weights, ColorSpace};
pub use image_backend::ImageBackend;
pub use loader::{mip_level_count, Loader};
pub use monitor::{IndicatifReporter, ProgressMonitor, ProgressReporter, SilentReporter};
pub use pipeline::{ConversionPipeline, SLOT_FILTERING, SLOT_RESIZING, SLOT_SAVING};
pub use resizer::Resizer;
pub use scanner::FileScanner;

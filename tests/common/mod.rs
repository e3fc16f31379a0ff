#![allow(dead_code)]

use image::Rgba;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use texbatch::{
    mip_level_count, ConvertError, ImageDescriptor, ImagingBackend, KernelSpec, PixelBuffer,
    ProgressReporter, Result, TextureKind,
};

/// Backend that stores images as `"<width> <height> <tile> <mips>"` text files.
///
/// Buffers are 1x1 with the logical size in the red and green channels, so
/// multi-gigapixel scenarios stay cheap. Every call is recorded.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    cached: Mutex<HashSet<PathBuf>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `operation` fail from now on.
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    pub fn cached_entries(&self) -> usize {
        self.cached.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, operation: &'static str, path: &Path) -> Result<()> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(ConvertError::Backend {
                path: path.to_path_buf(),
                message: format!("injected {} failure", operation),
            });
        }
        Ok(())
    }
}

pub fn buffer(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_pixel(1, 1, Rgba([width as f32, height as f32, 0.0, 1.0]))
}

pub fn logical_size(buffer: &PixelBuffer) -> (u32, u32) {
    let pixel = buffer.get_pixel(0, 0).0;
    (pixel[0] as u32, pixel[1] as u32)
}

pub fn write_image(path: &Path, width: u32, height: u32, tile: u32, mips: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, format!("{} {} {} {}", width, height, tile, mips)).unwrap();
}

pub fn read_image(path: &Path) -> Option<(u32, u32, u32, u32)> {
    let text = std::fs::read_to_string(path).ok()?;
    let fields: Vec<u32> = text
        .split_whitespace()
        .map(|field| field.parse().ok())
        .collect::<Option<Vec<u32>>>()?;
    match fields.as_slice() {
        [w, h, t, m] => Some((*w, *h, *t, *m)),
        _ => None,
    }
}

impl ImagingBackend for FakeBackend {
    fn describe(&self, path: &Path) -> Result<ImageDescriptor> {
        self.record(format!("describe {}", path.display()));
        let (width, height, tile, mips) =
            read_image(path).ok_or_else(|| ConvertError::ClassificationRead {
                path: path.to_path_buf(),
                message: "unreadable".to_string(),
            })?;

        Ok(ImageDescriptor {
            width,
            height,
            tile_width: tile,
            tile_height: tile,
            mip_levels: mips,
            format: "Fake".to_string(),
        })
    }

    fn read(&self, path: &Path) -> Result<Arc<PixelBuffer>> {
        self.record(format!("read {}", path.display()));
        self.check("read", path)?;
        let (width, height, _, _) = read_image(path).ok_or_else(|| ConvertError::Backend {
            path: path.to_path_buf(),
            message: "corrupt".to_string(),
        })?;
        self.cached.lock().unwrap().insert(path.to_path_buf());
        Ok(Arc::new(buffer(width, height)))
    }

    fn resize(&self, _buffer: &PixelBuffer, width: u32, height: u32, filter: &str) -> Result<PixelBuffer> {
        self.record(format!("resize {}x{} {}", width, height, filter));
        self.check("resize", Path::new(""))?;
        Ok(buffer(width, height))
    }

    fn convolve(&self, buffer: &PixelBuffer, kernel: &KernelSpec) -> Result<PixelBuffer> {
        self.record(format!("convolve {} {} {}", kernel.name, kernel.width_x, kernel.width_y));
        self.check("convolve", Path::new(""))?;
        Ok(buffer.clone())
    }

    fn color_convert(&self, buffer: &PixelBuffer, from: &str, to: &str) -> Result<PixelBuffer> {
        self.record(format!("color_convert {}->{}", from, to));
        self.check("color_convert", Path::new(""))?;
        Ok(buffer.clone())
    }

    fn encode_tiled_texture(
        &self,
        buffer: &PixelBuffer,
        out: &Path,
        tile_size: u32,
        filter: &str,
        kind: TextureKind,
    ) -> Result<()> {
        let (width, height) = logical_size(buffer);
        self.record(format!(
            "encode_tiled {}x{} {} {} {:?}",
            width, height, tile_size, filter, kind
        ));
        self.check("encode_tiled", out)?;
        write_image(out, width, height, tile_size, mip_level_count(width, height, false));
        Ok(())
    }

    fn encode_image(&self, buffer: &PixelBuffer, out: &Path, quality: u8) -> Result<()> {
        let (width, height) = logical_size(buffer);
        self.record(format!("encode_image {}x{} q{}", width, height, quality));
        self.check("encode_image", out)?;
        write_image(out, width, height, 0, 1);
        Ok(())
    }

    fn invalidate_cache(&self, path: &Path) {
        self.record(format!("invalidate {}", path.display()));
        self.cached.lock().unwrap().remove(path);
    }
}

/// Records phase and slot events.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressReporter for RecordingReporter {
    fn start(&self, slot: usize, label: &str) {
        self.push(format!("start {} {}", slot, label));
    }

    fn update(&self, _slot: usize, _percent: u64) {}

    fn finish(&self, slot: usize) {
        self.push(format!("finish {}", slot));
    }

    fn begin_phase(&self, name: &str, total: usize) {
        self.push(format!("phase {} {}", name, total));
    }

    fn advance_phase(&self) {
        self.push("advance".to_string());
    }

    fn end_phase(&self, message: &str) {
        self.push(format!("end {}", message));
    }
}

/// Leftover staging files anywhere under `dir`.
pub fn partial_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".partial"))
        .map(|entry| entry.into_path())
        .collect()
}

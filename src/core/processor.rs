// texbatch/src/core/processor.rs
use super::{Asset, ConvertConfig, Layout, Phase, Result, RunReport, WorkItem, WorkKind};
use crate::processors::{
    ConversionPipeline, FileScanner, ImagingBackend, ProgressMonitor, ProgressReporter,
    ResultCommitter, WorkClassifier, WorkQueues,
};
use std::path::{Path, PathBuf};

/// Drives one invocation: scan, classify, then run each phase in order.
pub struct Converter<'a> {
    config: ConvertConfig,
    backend: &'a dyn ImagingBackend,
    reporter: &'a dyn ProgressReporter,
    committer: ResultCommitter,
}

impl<'a> Converter<'a> {
    pub fn new(
        config: ConvertConfig,
        backend: &'a dyn ImagingBackend,
        reporter: &'a dyn ProgressReporter,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            backend,
            reporter,
            committer: ResultCommitter::new(),
        })
    }

    /// Tiling, blurring and previews for the lighting HDRs under `layout`.
    pub fn run_hdrs(&self, layout: &Layout) -> Result<RunReport> {
        if !layout.hdr_dir.is_dir() {
            log::warn!("HDR directory {} does not exist, creating it", layout.hdr_dir.display());
        }
        layout.ensure()?;

        let scanner = FileScanner::new(&layout.hdr_dir, &self.config.hdr_extensions);
        let classifier = WorkClassifier::new(self.backend, &self.config);
        let mut queues = classifier.classify_hdrs(scanner.scan(), layout);
        if !queues.unreadable().is_empty() {
            log::warn!("Skipped {} unreadable files", queues.unreadable().len());
        }

        let mut report = RunReport::new();
        for kind in [WorkKind::Tile, WorkKind::Blur, WorkKind::Preview] {
            report.register(Phase::for_kind(kind));
        }

        if queues.is_empty() {
            log::info!("{}", report.summary());
            return Ok(report);
        }

        log::info!(
            "Found {} files in scanline/No MipMap or not .{} format",
            queues.queue(WorkKind::Tile).len(),
            self.config.hdr_extension
        );
        log::info!(
            "Found {} files with no blurred partners",
            queues.queue(WorkKind::Blur).len()
        );
        log::info!("Found {} files with no preview", queues.queue(WorkKind::Preview).len());

        for kind in [WorkKind::Tile, WorkKind::Blur, WorkKind::Preview] {
            self.run_phase(kind, &mut queues, &mut report, |asset| match kind {
                WorkKind::Blur => (
                    layout.blur_dir.clone(),
                    Some(classifier.blur_path(asset, &layout.blur_dir)),
                ),
                WorkKind::Preview => (
                    layout.preview_dir.clone(),
                    Some(classifier.preview_path(asset, &layout.preview_dir)),
                ),
                _ => (asset.directory().to_path_buf(), None),
            });
        }

        log::info!("{}", report.summary());
        Ok(report)
    }

    /// Mip-mapped `.tx` siblings for every texture under `root`.
    pub fn run_textures(&self, root: &Path, excluded: &[String]) -> Result<RunReport> {
        let scanner = FileScanner::new(root, &self.config.texture_extensions)
            .recursive(true)
            .exclude(excluded.iter().cloned());
        let classifier = WorkClassifier::new(self.backend, &self.config);
        let mut queues = classifier.classify_textures(scanner.scan());
        if !queues.unreadable().is_empty() {
            log::warn!("Skipped {} unreadable files", queues.unreadable().len());
        }

        let mut report = RunReport::new();
        report.register(Phase::Mipmap);

        if queues.is_empty() {
            log::info!("{}", report.summary());
            return Ok(report);
        }

        log::info!(
            "Found {} textures without mip-maps",
            queues.queue(WorkKind::MipmapTexture).len()
        );

        self.run_phase(WorkKind::MipmapTexture, &mut queues, &mut report, |asset| {
            (
                asset.directory().to_path_buf(),
                Some(classifier.mipmap_path(asset)),
            )
        });

        log::info!("{}", report.summary());
        Ok(report)
    }

    /// Process one queue in order. `target` gives the staging directory and, for
    /// new artifacts, the final path. `None` means the output replaces the source.
    fn run_phase<F>(&self, kind: WorkKind, queues: &mut WorkQueues, report: &mut RunReport, target: F)
    where
        F: Fn(&Asset) -> (PathBuf, Option<PathBuf>),
    {
        let phase = Phase::for_kind(kind);
        let items = queues.queue(kind).to_vec();
        if items.is_empty() {
            return;
        }

        let monitor = ProgressMonitor::new(self.reporter, self.config.poll_interval);
        let pipeline = ConversionPipeline::new(self.backend, &self.config, monitor);
        self.reporter.begin_phase(phase.name(), items.len());

        for asset in items {
            let (staging_dir, destination) = target(&asset);
            let output = pipeline.run(&WorkItem::new(asset.clone(), kind), &staging_dir);

            let committed = match destination {
                Some(destination) => self
                    .committer
                    .commit_new(output, &destination)
                    .map(Asset::new),
                None => self
                    .committer
                    .commit_replacement(&asset, output, &self.config.hdr_extension),
            };

            match committed {
                Ok(result) => {
                    if kind == WorkKind::Tile && result != asset {
                        let moved = queues.repoint(&asset, &result);
                        log::debug!("Re-pointed {} pending items to {}", moved, result);
                    }
                    log::info!("{}: done {}", phase.name(), result);
                    report.record(phase, true);
                }
                Err(e) => {
                    log::warn!("{}: failed {}: {}", phase.name(), asset, e);
                    report.record(phase, false);
                }
            }

            self.reporter.advance_phase();
        }

        let outcome = report.phase(phase).cloned();
        let message = match outcome {
            Some(outcome) if outcome.failed() > 0 => {
                log::error!(
                    "{} finished with {} of {} failed",
                    phase.name(),
                    outcome.failed(),
                    outcome.attempted
                );
                format!("{} done, {} failed", phase.name(), outcome.failed())
            }
            _ => format!("{} done", phase.name()),
        };
        log::info!("{}", message);
        self.reporter.end_phase(&message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{ImageBackend, SilentReporter};
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn invalid_config_is_rejected() {
        let backend = ImageBackend::new();
        let config = ConvertConfig {
            tile_size: 0,
            ..Default::default()
        };
        assert!(Converter::new(config, &backend, &SilentReporter).is_err());
    }

    #[test]
    fn empty_scene_is_nothing_to_do() {
        let temp = TempDir::new().unwrap();
        temp.child("_ADAPTLOOKDEV_/lighting/hdr").create_dir_all().unwrap();
        let layout = Layout::new(temp.path());

        let backend = ImageBackend::new();
        let converter = Converter::new(ConvertConfig::default(), &backend, &SilentReporter).unwrap();
        let report = converter.run_hdrs(&layout).unwrap();

        assert!(report.nothing_to_do());
        assert!(layout.preview_dir.is_dir());
        assert!(layout.blur_dir.is_dir());
    }

    #[test]
    fn missing_hdr_dir_is_created() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::new(temp.path());
        assert!(!layout.hdr_dir.exists());

        let backend = ImageBackend::new();
        let converter = Converter::new(ConvertConfig::default(), &backend, &SilentReporter).unwrap();
        let report = converter.run_hdrs(&layout).unwrap();

        assert!(report.nothing_to_do());
        assert!(layout.hdr_dir.is_dir());
        assert!(layout.blur_dir.is_dir());
    }

    #[test]
    fn textures_get_mipmap_siblings() {
        let temp = TempDir::new().unwrap();
        temp.child("wood").create_dir_all().unwrap();
        temp.child("_SRC").create_dir_all().unwrap();
        image::RgbImage::from_pixel(32, 16, image::Rgb([10, 20, 30]))
            .save(temp.child("wood/oak.png").path())
            .unwrap();
        image::RgbImage::from_pixel(32, 16, image::Rgb([10, 20, 30]))
            .save(temp.child("_SRC/raw.png").path())
            .unwrap();

        let backend = ImageBackend::new();
        let config = ConvertConfig {
            tile_size: 16,
            ..Default::default()
        };
        let converter = Converter::new(config, &backend, &SilentReporter).unwrap();
        let report = converter
            .run_textures(temp.path(), &["_SRC".to_string()])
            .unwrap();

        let outcome = report.phase(Phase::Mipmap).unwrap();
        assert_eq!((outcome.attempted, outcome.succeeded), (1, 1));
        assert!(temp.child("wood/oak-mipmap.tx").path().is_file());
        assert!(temp.child("wood/oak.png").path().is_file());
        assert!(!temp.child("_SRC/raw-mipmap.tx").path().exists());

        let again = converter
            .run_textures(temp.path(), &["_SRC".to_string()])
            .unwrap();
        assert!(again.nothing_to_do());
    }
}

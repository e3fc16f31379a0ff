// texbatch/src/processors/committer.rs
use crate::core::{Asset, ConversionResult, ConvertError, ErrorKind, Result};
use crate::utils::format_file_size;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Temporary output file beside its final destination. Deleted on drop unless committed.
#[derive(Debug)]
pub struct StagedOutput {
    temp: TempPath,
}

impl StagedOutput {
    pub fn path(&self) -> &Path {
        &self.temp
    }
}

/// What one pipeline run left behind: the result and, on success, the staged file.
#[derive(Debug)]
pub struct ProducedOutput {
    pub result: ConversionResult,
    staged: Option<StagedOutput>,
}

impl ProducedOutput {
    pub fn produced(staged: StagedOutput) -> Self {
        Self {
            result: ConversionResult::succeeded(staged.path().to_path_buf()),
            staged: Some(staged),
        }
    }

    /// Failed run. Any staged file was already dropped and deleted.
    pub fn failed(error: &ConvertError) -> Self {
        Self {
            result: ConversionResult::failed(error.kind(), error.to_string()),
            staged: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result.success && self.staged.is_some()
    }

    fn into_staged(self, path: &Path) -> Result<StagedOutput> {
        match self.staged {
            Some(staged) if self.result.success => Ok(staged),
            _ => {
                let message = self
                    .result
                    .message
                    .unwrap_or_else(|| "conversion failed".to_string());
                Err(match self.result.error_kind {
                    Some(ErrorKind::Filesystem) => ConvertError::Filesystem {
                        path: path.to_path_buf(),
                        message,
                    },
                    Some(ErrorKind::ClassificationRead) => ConvertError::ClassificationRead {
                        path: path.to_path_buf(),
                        message,
                    },
                    _ => ConvertError::Backend {
                        path: path.to_path_buf(),
                        message,
                    },
                })
            }
        }
    }
}

/// Moves finished outputs into place with a single rename.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultCommitter;

impl ResultCommitter {
    pub fn new() -> Self {
        Self
    }

    /// Reserve `<dir>/<stem><marker>.XXXXXX.partial`.
    pub fn stage(&self, dir: &Path, stem: &str, marker: &str) -> Result<StagedOutput> {
        let temp = tempfile::Builder::new()
            .prefix(&format!("{}{}.", stem, marker))
            .suffix(".partial")
            .tempfile_in(dir)
            .map_err(|e| ConvertError::Filesystem {
                path: dir.to_path_buf(),
                message: format!("Failed to create temporary output: {}", e),
            })?
            .into_temp_path();

        Ok(StagedOutput { temp })
    }

    /// Replace `original` with the staged output, normalizing the extension.
    ///
    /// On failure the original is left untouched and the staged file is discarded.
    pub fn commit_replacement(
        &self,
        original: &Asset,
        output: ProducedOutput,
        canonical_extension: &str,
    ) -> Result<Asset> {
        let staged = output.into_staged(original.path())?;

        if !original.path().is_file() {
            return Err(ConvertError::Filesystem {
                path: original.path().to_path_buf(),
                message: "Original not found, nothing replaced".to_string(),
            });
        }

        let destination = replacement_path(original, canonical_extension);
        if destination != original.path() && destination.exists() {
            return Err(ConvertError::Filesystem {
                path: destination,
                message: "Another file already occupies the converted name".to_string(),
            });
        }

        self.persist(staged, &destination)?;

        if destination != original.path() {
            remove_replaced(original.path(), &destination)?;
        }

        log::info!("Replaced {} with {}", original, destination.display());
        Ok(Asset::new(destination))
    }

    /// Move a staged output to `destination`, replacing whatever is there.
    pub fn commit_new(&self, output: ProducedOutput, destination: &Path) -> Result<PathBuf> {
        let staged = output.into_staged(destination)?;
        self.persist(staged, destination)?;
        Ok(destination.to_path_buf())
    }

    fn persist(&self, staged: StagedOutput, destination: &Path) -> Result<()> {
        let size = verify_written(staged.path())?;

        staged
            .temp
            .persist(destination)
            .map_err(|e| ConvertError::Filesystem {
                path: destination.to_path_buf(),
                message: format!("Failed to move output into place: {}", e.error),
            })?;

        log::debug!("Committed {} ({})", destination.display(), format_file_size(size));
        Ok(())
    }
}

/// Original path with the canonical extension. A case-only difference keeps the original name.
///
/// `sky.EXR` stays `sky.EXR`: renaming it to `sky.exr` and then removing the old
/// name would delete the new file on a case-insensitive filesystem.
pub fn replacement_path(original: &Asset, canonical_extension: &str) -> PathBuf {
    if original.extension().eq_ignore_ascii_case(canonical_extension) {
        original.path().to_path_buf()
    } else {
        original.path().with_extension(canonical_extension)
    }
}

/// Delete the source once its converted copy is in place.
fn remove_replaced(original: &Path, destination: &Path) -> Result<()> {
    std::fs::remove_file(original).map_err(|e| ConvertError::Filesystem {
        path: original.to_path_buf(),
        message: format!("Converted to {} but could not remove the original: {}", destination.display(), e),
    })
}

/// Flush the file to disk and make sure it holds data.
fn verify_written(path: &Path) -> Result<u64> {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| ConvertError::Filesystem {
            path: path.to_path_buf(),
            message: format!("Output missing: {}", e),
        })?;
    file.sync_all()?;

    let size = file.metadata()?.len();
    if size == 0 {
        return Err(ConvertError::Filesystem {
            path: path.to_path_buf(),
            message: "Output is empty".to_string(),
        });
    }

    Ok(size)
}

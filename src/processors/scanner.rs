// texbatch/src/processors/scanner.rs
use crate::core::Asset;
use crate::utils::has_extension;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Filesystem listing of candidate assets. Never opens file contents.
#[derive(Debug, Clone)]
pub struct FileScanner {
    root: PathBuf,
    excluded_dirs: Vec<String>,
    extensions: Vec<String>,
    recursive: bool,
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P, extensions: &[String]) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            excluded_dirs: Vec::new(),
            extensions: extensions.to_vec(),
            recursive: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_dirs.extend(
            names
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.trim().is_empty()),
        );
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree. Each call starts a fresh walk.
    pub fn scan(&self) -> impl Iterator<Item = Asset> + '_ {
        let walker = if self.recursive {
            WalkDir::new(&self.root)
        } else {
            WalkDir::new(&self.root).max_depth(1)
        };

        walker
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(move |entry| has_extension(entry.path(), &self.extensions))
            .map(|entry| Asset::new(entry.into_path()))
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map(|name| self.excluded_dirs.iter().any(|ex| ex == name))
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn names(scanner: &FileScanner) -> Vec<String> {
        scanner
            .scan()
            .map(|asset| {
                asset
                    .path()
                    .strip_prefix(scanner.root())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn flat_scan_filters_extensions_case_insensitively() {
        let temp = TempDir::new().unwrap();
        temp.child("a.exr").touch().unwrap();
        temp.child("b.HDR").touch().unwrap();
        temp.child("c.jpg").touch().unwrap();
        temp.child("sub/d.exr").touch().unwrap();

        let scanner = FileScanner::new(temp.path(), &exts(&["exr", "hdr"]));
        assert_eq!(names(&scanner), vec!["a.exr", "b.HDR"]);
    }

    #[test]
    fn recursive_scan_prunes_excluded_dirs_at_every_level() {
        let temp = TempDir::new().unwrap();
        temp.child("wood.png").touch().unwrap();
        temp.child("assets/metal.jpg").touch().unwrap();
        temp.child("assets/_SRC/raw.png").touch().unwrap();
        temp.child("assets/deep/_SRC/raw2.png").touch().unwrap();
        temp.child("_ADAPTLOOKDEV_/lighting/hdr/sky.exr").touch().unwrap();
        temp.child("assets/notes.txt").touch().unwrap();

        let scanner = FileScanner::new(temp.path(), &exts(&["png", "jpg", "exr"]))
            .recursive(true)
            .exclude(vec!["_ADAPTLOOKDEV_", "_SRC", ""]);

        assert_eq!(names(&scanner), vec!["assets/metal.jpg", "wood.png"]);
    }

    #[test]
    fn scan_is_restartable() {
        let temp = TempDir::new().unwrap();
        temp.child("a.png").touch().unwrap();
        temp.child("b.png").touch().unwrap();

        let scanner = FileScanner::new(temp.path(), &exts(&["png"]));
        let first: Vec<Asset> = scanner.scan().collect();
        let second: Vec<Asset> = scanner.scan().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn missing_root_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let scanner = FileScanner::new(temp.path().join("nope"), &exts(&["png"]));
        assert_eq!(scanner.scan().count(), 0);
    }
}

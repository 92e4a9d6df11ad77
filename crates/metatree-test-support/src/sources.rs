//! On-disk bencode sources in disposable directories.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use metatree_document::{Document, bencode};
use tempfile::TempDir;

/// Temporary directory holding encoded source files; removed on drop.
pub struct SourceDir {
    dir: TempDir,
}

impl SourceDir {
    /// Create an empty source directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create source directory")?;
        Ok(Self { dir })
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Encode `document` into `name` and return the file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, name: &str, document: &Document) -> Result<PathBuf> {
        self.write_bytes(name, &bencode::encode(document))
    }

    /// Write raw bytes into `name`, e.g. a deliberately corrupt source.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

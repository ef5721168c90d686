//! Filesystem helpers for the output directory.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

/// Create `dir` and its parents. Succeeds if it already exists.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create output dir {}", dir.display()))
}

/// Write the document source as UTF-8, replacing any previous content.
pub fn write_source(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents.as_bytes()).with_context(|| format!("write {}", path.display()))
}

/// Last-modified time of `path`, or `UNIX_EPOCH` when it does not exist.
pub fn modified_or_epoch(path: &Path) -> Result<SystemTime> {
    match fs::metadata(path) {
        Ok(meta) => meta
            .modified()
            .with_context(|| format!("read mtime of {}", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(UNIX_EPOCH),
        Err(err) => Err(err).with_context(|| format!("stat {}", path.display())),
    }
}

/// Size of the file at `path`, or `None` when it is absent or not a regular file.
pub fn artifact_size(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
}

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("source has no file name: {0:?}")]
    MissingFileName(PathBuf),
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Temporary file in `dir` that a transfer writes into before relocation.
pub fn partial_file_in(dir: &Path) -> Result<NamedTempFile, PersistError> {
    ensure_output_dir(dir)?;
    Ok(Builder::new().prefix(".partial-").tempfile_in(dir)?)
}

/// Atomically moves `partial` to `{dir}/{filename}`.
///
/// A previous artifact with the same name is removed first: last write wins.
pub fn relocate(
    mut partial: NamedTempFile,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf, PersistError> {
    partial.flush()?;
    partial.as_file_mut().sync_all()?;

    let target = dir.join(filename);
    if target.exists() {
        fs::remove_file(&target)?;
    }
    partial
        .persist(&target)
        .map_err(|e| PersistError::Io(e.error))?;
    Ok(target)
}

/// Copies a short-lived provider file into a fresh subdirectory of `dir`.
///
/// The file keeps its name; items that share a name never collide.
pub fn stage_copy(source: &Path, dir: &Path) -> Result<PathBuf, PersistError> {
    let name = source
        .file_name()
        .ok_or_else(|| PersistError::MissingFileName(source.to_path_buf()))?;
    ensure_output_dir(dir)?;

    let item_dir = Builder::new().prefix("item-").tempdir_in(dir)?.keep();
    let target = item_dir.join(name);
    fs::copy(source, &target)?;
    Ok(target)
}

/// Writes a new, uniquely named file in `dir` and keeps it.
pub fn write_unique<F>(
    dir: &Path,
    prefix: &str,
    suffix: &str,
    write: F,
) -> Result<PathBuf, PersistError>
where
    F: FnOnce(&mut File) -> Result<(), PersistError>,
{
    ensure_output_dir(dir)?;
    let mut tmp = Builder::new().prefix(prefix).suffix(suffix).tempfile_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file_mut().sync_all()?;
    let (_, path) = tmp.keep().map_err(|e| PersistError::Io(e.error))?;
    Ok(path)
}

//! Filesystem utilities for atomic state writes.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{CirculationError, Result};

/// Nanoseconds since the Unix epoch, used to make sibling file names unique.
pub(crate) fn unix_nanos() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| CirculationError::Persistence(format!("System time error: {}", e)))?
        .as_nanos())
}

/// Build `<dir>/<file_name>.<suffix>` next to `path`.
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> Result<PathBuf> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CirculationError::Persistence("Invalid data filename".to_string()))?;
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!("{}.{}", filename, suffix)))
}

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
///
/// # Errors
///
/// Returns an error if the rename fails even after the fallback attempt.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Write `data` to a temp file beside `path`, fsync it, then rename it over `path`.
///
/// A reader never observes a half-written file: it sees either the previous
/// contents or the new ones.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CirculationError::Persistence(format!(
                "Failed to create data directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = sibling_path(path, &format!("{}.tmp", unix_nanos()?))?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| CirculationError::Persistence(format!("Temp file create failed: {}", e)))?;
    let written = file.write_all(data).and_then(|_| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(CirculationError::Persistence(format!(
            "Temp file write failed: {}",
            e
        )));
    }
    drop(file);

    rename_with_fallback(&temp_path, path)
        .map_err(|e| CirculationError::Persistence(format!("Atomic rename failed: {}", e)))?;

    Ok(())
}

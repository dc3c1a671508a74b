//! File I/O utilities for generated artifacts
//!
//! Atomic JSON writes for the persisted config, and the `.bak`-preserving
//! write used for the launcher script and scheduler descriptor.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ClawError;

/// Write JSON to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), ClawError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    ensure_parent(path)?;

    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| ClawError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| ClawError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| ClawError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| ClawError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ClawError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Write `content` to `path`, first moving any existing file to `<path>.bak`
///
/// Returns the backup path when a previous file was preserved.
pub fn write_with_backup(path: &Path, content: &str) -> Result<Option<PathBuf>, ClawError> {
    ensure_parent(path)?;

    let backup = if path.exists() {
        let bak = backup_path(path);
        fs::rename(path, &bak).map_err(|e| {
            ClawError::Storage(format!(
                "Failed to back up {} to {}: {}",
                path.display(),
                bak.display(),
                e
            ))
        })?;
        Some(bak)
    } else {
        None
    };

    fs::write(path, content)
        .map_err(|e| ClawError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

    Ok(backup)
}

/// `<path>.bak` next to `path`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Mark a generated script as executable (0755)
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<(), ClawError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| {
        ClawError::Storage(format!("Failed to chmod {}: {}", path.display(), e))
    })
}

/// Mark a generated script as executable (no-op off Unix)
#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<(), ClawError> {
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), ClawError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ClawError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

//! Archive creation and checksum sidecars
//!
//! Compression and hashing are delegated to `tar` and `shasum`/`sha256sum`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ClawError, ClawResult};
use crate::process;

/// Every archive file name starts with this
pub const ARCHIVE_PREFIX: &str = "clawd_memory_backup_";
/// Archive extension
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";
/// Checksum sidecar extension (appended to the archive name)
pub const CHECKSUM_EXTENSION: &str = ".sha256";
/// Staging directory name prefix inside the temp root
pub const STAGING_PREFIX: &str = "clawd_backup_";

/// The archiver every run depends on
pub const ARCHIVER: &str = "tar";

/// `clawd_memory_backup_<stamp>.tar.gz`
pub fn archive_name(stamp: &str) -> String {
    format!("{}{}{}", ARCHIVE_PREFIX, stamp, ARCHIVE_SUFFIX)
}

/// `clawd_backup_<stamp>`
pub fn staging_name(stamp: &str) -> String {
    format!("{}{}", STAGING_PREFIX, stamp)
}

/// `<archive>.sha256`
pub fn checksum_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(CHECKSUM_EXTENSION);
    PathBuf::from(name)
}

/// Compress `temp_root/staging_name` into `archive_path`
///
/// The archive contains the single top-level folder `staging_name`.
pub fn create_archive(archive_path: &Path, temp_root: &Path, staging_name: &str) -> ClawResult<()> {
    let args: [OsString; 5] = [
        "-czf".into(),
        archive_path.as_os_str().to_os_string(),
        "-C".into(),
        temp_root.as_os_str().to_os_string(),
        staging_name.into(),
    ];

    process::run_checked(ARCHIVER, &args).map_err(|e| match e {
        ClawError::CommandMissing { .. } => e,
        other => ClawError::Archive(format!(
            "Failed to create {}: {}",
            archive_path.display(),
            other
        )),
    })?;

    Ok(())
}

/// The two interchangeable SHA-256 tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumTool {
    /// `shasum -a 256` (macOS, Perl)
    Shasum,
    /// `sha256sum` (GNU coreutils)
    Sha256sum,
}

impl ChecksumTool {
    /// Prefer `shasum`, then `sha256sum`; `None` if neither is installed
    pub fn detect() -> Option<Self> {
        if process::command_exists("shasum") {
            Some(Self::Shasum)
        } else if process::command_exists("sha256sum") {
            Some(Self::Sha256sum)
        } else {
            None
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            Self::Shasum => "shasum",
            Self::Sha256sum => "sha256sum",
        }
    }

    fn args(&self, archive: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = match self {
            Self::Shasum => vec!["-a".into(), "256".into()],
            Self::Sha256sum => Vec::new(),
        };
        args.push(archive.as_os_str().to_os_string());
        args
    }
}

/// Hash `archive` with `tool` and write its output to `<archive>.sha256`
pub fn write_checksum(archive: &Path, tool: ChecksumTool) -> ClawResult<PathBuf> {
    let output = process::run_checked(tool.program(), &tool.args(archive))?;
    let sidecar = checksum_path(archive);
    fs::write(&sidecar, &output.stdout).map_err(|e| {
        ClawError::Io(format!("Failed to write checksum {}: {}", sidecar.display(), e))
    })?;
    Ok(sidecar)
}

//! rclone transfer and remote retention

use std::io::IsTerminal;
use std::path::Path;

use super::retention::{ARCHIVE_GLOB, CHECKSUM_GLOB};
use crate::config::{BackupConfig, UploadMode};
use crate::error::{ClawError, ClawResult};
use crate::process;

/// The remote sync tool
pub const RCLONE: &str = "rclone";

/// How rclone reports transfer progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// Live progress bar
    Interactive,
    /// One stats line every ten seconds, suited to log files
    Periodic,
}

impl ProgressStyle {
    /// Interactive when stdout is a terminal
    pub fn detect() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Interactive
        } else {
            Self::Periodic
        }
    }

    fn flags(&self) -> &'static [&'static str] {
        match self {
            Self::Interactive => &["--progress"],
            Self::Periodic => &["--stats-one-line", "--stats", "10s"],
        }
    }
}

/// `rclone copy <file> <remote><dest> <progress flags>`
pub fn copy_args(file: &Path, target: &str, style: ProgressStyle) -> Vec<String> {
    let mut args = vec![
        "copy".to_string(),
        file.to_string_lossy().to_string(),
        target.to_string(),
    ];
    args.extend(style.flags().iter().map(|flag| flag.to_string()));
    args
}

/// Copy the archive to the remote; any failure is fatal
pub fn upload_archive(archive: &Path, config: &BackupConfig, style: ProgressStyle) -> ClawResult<()> {
    let target = config.remote_target();
    process::run_inherited(RCLONE, &copy_args(archive, &target, style)).map_err(|e| match e {
        ClawError::CommandMissing { .. } => e,
        other => ClawError::Upload(format!("Failed to copy archive to {}: {}", target, other)),
    })
}

/// Copy the checksum sidecar; failures are logged and discarded
pub fn upload_checksum(checksum: &Path, config: &BackupConfig) -> bool {
    let target = config.remote_target();
    let args = copy_args(checksum, &target, ProgressStyle::Periodic);
    match process::run_checked(RCLONE, &args) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(checksum = %checksum.display(), remote = %target, error = %e, "checksum upload failed");
            false
        }
    }
}

/// Arguments for deleting expired remote artifacts, or `None` when remote
/// cleanup must be skipped
///
/// Cleanup only runs in rclone mode with a non-empty remote and a destination
/// that is neither empty nor `/`.
pub fn remote_retention_args(config: &BackupConfig) -> Option<Vec<String>> {
    let dest = config.rclone_dest.trim();
    if config.upload_mode != UploadMode::Rclone
        || config.rclone_remote.trim().is_empty()
        || dest.is_empty()
        || dest == "/"
    {
        return None;
    }

    Some(vec![
        "delete".to_string(),
        config.remote_target(),
        "--min-age".to_string(),
        format!("{}d", config.retention_days),
        "--include".to_string(),
        ARCHIVE_GLOB.to_string(),
        "--include".to_string(),
        CHECKSUM_GLOB.to_string(),
    ])
}

/// Outcome of the remote retention step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemotePrune {
    Pruned,
    Failed(String),
    Skipped,
}

/// Delete expired remote artifacts; failures are reported, never raised
pub fn prune_remote(config: &BackupConfig) -> RemotePrune {
    let Some(args) = remote_retention_args(config) else {
        return RemotePrune::Skipped;
    };

    match process::run_checked(RCLONE, &args) {
        Ok(_) => RemotePrune::Pruned,
        Err(e) => {
            tracing::warn!(remote = %config.remote_target(), error = %e, "remote cleanup failed");
            RemotePrune::Failed(e.to_string())
        }
    }
}

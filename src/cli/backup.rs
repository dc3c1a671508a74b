//! Backup CLI commands
//!
//! Implements `run`, `list` and `prune`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use clap::Args;

use crate::backup::retention::{expired_artifacts, list_archives, sweep_local, ArtifactKind};
use crate::backup::{
    BackupEngine, CleanupRegistry, LockAttempt, RetentionPolicy, RunLock, RunLog, RunOutcome,
};
use crate::config::{BackupConfig, ClawPaths, UploadMode};
use crate::error::{ClawError, ClawResult};

/// Overrides for a single run; each one replaces the saved value
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Read the configuration from this file instead of the saved one
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project directory (its memory/ folder is backed up)
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// OpenClaw configuration directory
    #[arg(long, value_name = "DIR")]
    pub openclaw_dir: Option<PathBuf>,

    /// Mirror of the project to include
    #[arg(long, value_name = "DIR")]
    pub mirror_dir: Option<PathBuf>,

    /// Where archives, checksums and backup.log are kept
    #[arg(long, value_name = "DIR")]
    pub local_backup_dir: Option<PathBuf>,

    /// Delete archives older than this many days
    #[arg(long, value_name = "DAYS")]
    pub retention_days: Option<u32>,

    /// Upload archives with rclone or keep them local
    #[arg(long, value_enum)]
    pub upload_mode: Option<UploadMode>,

    /// rclone remote name, including the trailing colon
    #[arg(long)]
    pub remote: Option<String>,

    /// Destination path on the remote
    #[arg(long)]
    pub remote_dest: Option<String>,
}

impl RunArgs {
    /// Apply the overrides to `base`
    pub fn apply(&self, mut base: BackupConfig) -> BackupConfig {
        if let Some(dir) = &self.project_dir {
            base.project_dir = dir.clone();
        }
        if let Some(dir) = &self.openclaw_dir {
            base.openclaw_dir = dir.clone();
        }
        if let Some(dir) = &self.mirror_dir {
            base.mirror_dir = dir.clone();
        }
        if let Some(dir) = &self.local_backup_dir {
            base.local_backup_dir = dir.clone();
        }
        if let Some(days) = self.retention_days {
            base.retention_days = days;
        }
        if let Some(mode) = self.upload_mode {
            base.upload_mode = mode;
        }
        if let Some(remote) = &self.remote {
            base.rclone_remote = remote.clone();
        }
        if let Some(dest) = &self.remote_dest {
            base.rclone_dest = dest.clone();
        }
        base
    }
}

/// Saved (or explicit) configuration plus overrides, with absolute paths
pub fn resolve_run_config(paths: &ClawPaths, home: &Path, args: &RunArgs) -> ClawResult<BackupConfig> {
    let base = match &args.config {
        Some(file) => BackupConfig::load(file)?,
        None => BackupConfig::load_or_default(paths, home)?,
    };
    args.apply(base).resolved(home)
}

/// Run one backup cycle
pub fn handle_run(config: BackupConfig, registry: Arc<CleanupRegistry>) -> ClawResult<RunOutcome> {
    let log_dir = config.local_backup_dir.clone();
    let log = RunLog::new(config.log_file());
    let engine = BackupEngine::new(config, registry);
    let outcome = engine.run().map_err(|e| {
        record_failure(&log, &log_dir, &e);
        e
    })?;
    if let RunOutcome::Completed(summary) = &outcome {
        tracing::info!(
            archive = %summary.archive.display(),
            deleted = summary.deleted_local.len(),
            "run complete"
        );
    }
    Ok(outcome)
}

/// Leave the failure reason as the last line of the run log
fn record_failure(log: &RunLog, log_dir: &Path, error: &ClawError) {
    if !log_dir.is_dir() {
        return;
    }
    if let Err(e) = log.log(format!("Backup failed: {}", error)) {
        tracing::warn!(error = %e, "could not record failure in run log");
    }
}

/// List local archives
pub fn handle_list(config: &BackupConfig, verbose: bool) -> ClawResult<()> {
    let archives = list_archives(&config.local_backup_dir)?;

    if archives.is_empty() {
        println!("No backups found in {}.", config.local_backup_dir.display());
        println!("Create one with: clawbackup run");
        return Ok(());
    }

    println!("Available Backups");
    println!("=================");
    println!();

    let now = chrono::Local::now();
    for (i, archive) in archives.iter().enumerate() {
        let age_str = format_duration(archive.age(now));
        let checksum_marker = if archive.has_checksum { "" } else { " [no checksum]" };

        if verbose {
            println!(
                "{}. {}{}\n   Modified: {}\n   Size: {}\n   Age: {}\n   Path: {}\n",
                i + 1,
                archive.filename,
                checksum_marker,
                archive.modified.format("%Y-%m-%d %H:%M:%S"),
                format_size(archive.size_bytes),
                age_str,
                archive.path.display(),
            );
        } else {
            println!(
                "  {}. {} ({} ago, {}){}",
                i + 1,
                archive.filename,
                age_str,
                format_size(archive.size_bytes),
                checksum_marker,
            );
        }
    }

    println!();
    println!("Total: {} backup(s)", archives.len());
    Ok(())
}

/// Preview, or with `force` apply, the local retention sweep
pub fn handle_prune(
    config: &BackupConfig,
    registry: &Arc<CleanupRegistry>,
    force: bool,
) -> ClawResult<()> {
    let backup_dir = &config.local_backup_dir;
    if !backup_dir.is_dir() {
        println!("No backups to prune ({} does not exist).", backup_dir.display());
        return Ok(());
    }

    let policy = RetentionPolicy::new(config.retention_days);
    let expired = expired_artifacts(backup_dir, policy, SystemTime::now())?;

    if expired.is_empty() {
        println!("No backups to prune.");
        println!("Retention policy: {} days", policy.days());
        return Ok(());
    }

    let archives = expired
        .iter()
        .filter(|a| a.kind == ArtifactKind::Archive)
        .count();

    println!("Prune Summary");
    println!("=============");
    println!("Retention policy: {} days", policy.days());
    println!(
        "To be deleted: {} archive(s), {} checksum(s)",
        archives,
        expired.len() - archives
    );
    for artifact in &expired {
        println!("  {}", artifact.path.display());
    }
    println!();

    if !force {
        println!("To delete old backups, run again with --force flag:");
        println!("  clawbackup prune --force");
        return Ok(());
    }

    let _lock = match RunLock::try_acquire(backup_dir, registry)? {
        LockAttempt::Acquired(lock) => lock,
        LockAttempt::Contended => {
            println!("Another backup is already running (lock exists). Try again later.");
            return Ok(());
        }
    };

    let log = RunLog::new(config.log_file());
    let deleted = sweep_local(backup_dir, policy, &log)?;
    println!("Deleted {} file(s).", deleted.len());
    Ok(())
}

/// Format a duration in human-readable form
fn format_duration(duration: std::time::Duration) -> String {
    let total_seconds = duration.as_secs();

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    let months = days / 30;
    format!("{}mo", months)
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

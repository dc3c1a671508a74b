//! One backup cycle, start to finish
//!
//! [`BackupEngine::run`] walks the fixed sequence of steps: dependency check,
//! backup directory, lock, staging, manifest, archive, checksum, upload, local
//! retention, remote retention. Any step outside the best-effort ones aborts
//! the run with an error; the lock and the staging root are released on every
//! exit path by their guards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use super::archive::{self, ChecksumTool, ARCHIVER};
use super::cleanup::{CleanupRegistry, TempRoot};
use super::lock::{LockAttempt, RunLock};
use super::manifest::Manifest;
use super::retention::{sweep_local, RetentionPolicy};
use super::run_log::RunLog;
use super::staging::{Stager, StagingReport};
use super::upload::{self, ProgressStyle, RemotePrune, RCLONE};
use crate::config::{BackupConfig, UploadMode};
use crate::error::{ClawError, ClawResult};
use crate::process;

/// Run identifier format (local time)
pub const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Identity of one engine execution
#[derive(Debug, Clone)]
pub struct BackupRun {
    stamp: String,
    created_at: DateTime<Utc>,
}

impl BackupRun {
    /// A run stamped with the current time
    pub fn start() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(created_at: DateTime<Utc>) -> Self {
        Self {
            stamp: created_at.with_timezone(&Local).format(STAMP_FORMAT).to_string(),
            created_at,
        }
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn archive_name(&self) -> String {
        archive::archive_name(&self.stamp)
    }

    pub fn staging_name(&self) -> String {
        archive::staging_name(&self.stamp)
    }
}

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub archive: PathBuf,
    pub checksum: Option<PathBuf>,
    pub staged: StagingReport,
    pub uploaded: bool,
    pub deleted_local: Vec<PathBuf>,
    pub remote_prune: RemotePrune,
}

/// How a run ended without error
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// Another run held the lock; nothing was done
    AlreadyRunning,
}

/// Executes backup runs for one configuration
pub struct BackupEngine {
    config: BackupConfig,
    registry: Arc<CleanupRegistry>,
    progress: ProgressStyle,
}

impl BackupEngine {
    /// `config` must already be resolved to absolute paths
    pub fn new(config: BackupConfig, registry: Arc<CleanupRegistry>) -> Self {
        Self {
            config,
            registry,
            progress: ProgressStyle::detect(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressStyle) -> Self {
        self.progress = progress;
        self
    }

    /// External tools this configuration needs on PATH
    pub fn required_tools(&self) -> Vec<&'static str> {
        let mut tools = vec![ARCHIVER];
        if self.config.upload_mode == UploadMode::Rclone {
            tools.push(RCLONE);
        }
        tools
    }

    /// Fail with the first missing tool
    pub fn check_dependencies(&self) -> ClawResult<()> {
        self.required_tools()
            .into_iter()
            .try_for_each(process::require)
    }

    /// Perform one complete backup cycle
    pub fn run(&self) -> ClawResult<RunOutcome> {
        self.check_dependencies()?;

        let config = &self.config;
        let backup_dir = &config.local_backup_dir;
        let created_dir = !backup_dir.is_dir();
        if created_dir {
            fs::create_dir_all(backup_dir).map_err(|e| {
                ClawError::Io(format!(
                    "Failed to create backup directory {}: {}",
                    backup_dir.display(),
                    e
                ))
            })?;
        }

        let log = RunLog::new(config.log_file());
        if created_dir {
            log.log(format!(
                "Created local backup directory '{}'.",
                backup_dir.display()
            ))?;
        }

        let lock = match RunLock::try_acquire(backup_dir, &self.registry)? {
            LockAttempt::Acquired(lock) => lock,
            LockAttempt::Contended => {
                log.log("Another backup is already running (lock exists). Exiting.")?;
                return Ok(RunOutcome::AlreadyRunning);
            }
        };
        tracing::debug!(lock = %lock.path().display(), "lock acquired");

        let run = BackupRun::start();
        let temp_root = TempRoot::create(&self.registry)?;
        let staging_dir = temp_root.path().join(run.staging_name());

        let staged = Stager::new(config, staging_dir.clone(), &log).stage_all()?;

        log.log("Writing manifest...")?;
        Manifest::new(config, &run.archive_name(), run.created_at())?.write_to(&staging_dir)?;

        let archive_path = backup_dir.join(run.archive_name());
        log.log(format!(
            "Creating backup archive '{}'...",
            archive_path.display()
        ))?;
        archive::create_archive(&archive_path, temp_root.path(), &run.staging_name())?;
        log.log("Backup archive created successfully.")?;

        // Staging is no longer needed once the archive exists.
        drop(temp_root);

        let checksum = match ChecksumTool::detect() {
            Some(tool) => {
                log.log("Writing checksum...")?;
                Some(archive::write_checksum(&archive_path, tool)?)
            }
            None => {
                log.log("No sha256 tool found (shasum/sha256sum). Skipping checksum.")?;
                None
            }
        };

        let uploaded = self.upload(&log, &archive_path, checksum.as_deref())?;

        log.log(format!(
            "Applying retention policy ({} days)...",
            config.retention_days
        ))?;
        let deleted_local =
            sweep_local(backup_dir, RetentionPolicy::new(config.retention_days), &log)?;

        log.log(format!(
            "Cleaning up remote backups older than {} days...",
            config.retention_days
        ))?;
        let remote_prune = upload::prune_remote(config);
        match &remote_prune {
            RemotePrune::Pruned => {}
            RemotePrune::Failed(reason) => {
                log.log(format!("Remote cleanup failed ({}). Continuing.", reason))?;
            }
            RemotePrune::Skipped => {
                log.log("Skipping remote cleanup: upload mode local-only or remote/dest invalid.")?;
            }
        }

        log.log("Backup process completed successfully.")?;
        lock.release();

        Ok(RunOutcome::Completed(RunSummary {
            archive: archive_path,
            checksum,
            staged,
            uploaded,
            deleted_local,
            remote_prune,
        }))
    }

    fn upload(
        &self,
        log: &RunLog,
        archive_path: &Path,
        checksum: Option<&Path>,
    ) -> ClawResult<bool> {
        let config = &self.config;
        if config.upload_mode == UploadMode::LocalOnly {
            log.log("Upload disabled (local-only). Skipping rclone transfer.")?;
            return Ok(false);
        }

        log.log("Starting rclone transfer...")?;
        upload::upload_archive(archive_path, config, self.progress)?;
        if let Some(checksum) = checksum {
            upload::upload_checksum(checksum, config);
        }
        log.log(format!(
            "Backup successfully transferred to {}.",
            config.remote_target()
        ))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::lock::LOCK_DIR_NAME;
    use crate::backup::staging::OPENCLAW_STAGE;
    use std::process::Command;
    use tempfile::TempDir;

    fn local_only_config(home: &Path) -> BackupConfig {
        let mut config = BackupConfig::defaults_for(home);
        config.upload_mode = UploadMode::LocalOnly;
        fs::create_dir_all(config.source_dir()).unwrap();
        fs::write(config.source_dir().join("today.md"), "remember this").unwrap();
        fs::write(config.project_dir.join("SOUL.md"), "soul").unwrap();
        config
    }

    fn archive_listing(archive: &Path) -> String {
        let output = Command::new("tar").arg("-tzf").arg(archive).output().unwrap();
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    #[test]
    fn run_stamp_matches_format() {
        let run = BackupRun::start();
        assert_eq!(run.stamp().len(), "2026-01-31_11-00-00".len());
        assert!(chrono::NaiveDateTime::parse_from_str(run.stamp(), STAMP_FORMAT).is_ok());
        assert!(run.archive_name().starts_with("clawd_memory_backup_"));
        assert!(run.staging_name().starts_with("clawd_backup_"));
    }

    #[test]
    fn rclone_mode_requires_rclone() {
        let temp = TempDir::new().unwrap();
        let mut config = BackupConfig::defaults_for(temp.path());
        let registry = CleanupRegistry::new();

        let engine = BackupEngine::new(config.clone(), Arc::clone(&registry));
        assert_eq!(engine.required_tools(), vec!["tar", "rclone"]);

        config.upload_mode = UploadMode::LocalOnly;
        let engine = BackupEngine::new(config, registry);
        assert_eq!(engine.required_tools(), vec!["tar"]);
    }

    #[test]
    fn local_only_run_produces_archive_and_cleans_up() {
        if !process::command_exists(ARCHIVER) {
            return;
        }
        let temp = TempDir::new().unwrap();
        let config = local_only_config(temp.path());
        let registry = CleanupRegistry::new();
        let engine = BackupEngine::new(config.clone(), Arc::clone(&registry))
            .with_progress(ProgressStyle::Periodic);

        let summary = match engine.run().unwrap() {
            RunOutcome::Completed(summary) => summary,
            RunOutcome::AlreadyRunning => panic!("lock should have been free"),
        };

        assert!(summary.archive.is_file());
        assert!(summary.archive.starts_with(&config.local_backup_dir));
        assert!(!summary.uploaded);
        assert_eq!(summary.remote_prune, RemotePrune::Skipped);
        assert!(summary.staged.memory);
        assert_eq!(summary.staged.markdown_files, 1);
        if let Some(checksum) = &summary.checksum {
            assert!(checksum.is_file());
        }

        assert!(!config.local_backup_dir.join(LOCK_DIR_NAME).exists());
        assert!(registry.pending().is_empty());

        let listing = archive_listing(&summary.archive);
        assert!(listing.contains("/manifest.json"));
        assert!(listing.contains("/RESTORE_NOTES.txt"));
        assert!(listing.contains("/memory/today.md"));
        assert!(listing.contains("/root_md_files/SOUL.md"));
        assert!(listing.contains(&format!("/{}/", OPENCLAW_STAGE)));

        let log = RunLog::new(config.log_file()).read_lines().unwrap();
        assert!(log[0].ends_with(&format!(
            "Created local backup directory '{}'.",
            config.local_backup_dir.display()
        )));
        assert!(log
            .iter()
            .any(|l| l.ends_with("Upload disabled (local-only). Skipping rclone transfer.")));
        assert!(log.iter().any(|l| l.ends_with(
            "Skipping remote cleanup: upload mode local-only or remote/dest invalid."
        )));
        assert!(log
            .last()
            .unwrap()
            .ends_with("Backup process completed successfully."));
    }

    #[test]
    fn held_lock_exits_without_staging() {
        if !process::command_exists(ARCHIVER) {
            return;
        }
        let temp = TempDir::new().unwrap();
        let config = local_only_config(temp.path());
        let lock_dir = config.local_backup_dir.join(LOCK_DIR_NAME);
        fs::create_dir_all(&lock_dir).unwrap();

        let registry = CleanupRegistry::new();
        let engine = BackupEngine::new(config.clone(), Arc::clone(&registry));

        assert!(matches!(engine.run().unwrap(), RunOutcome::AlreadyRunning));

        // The other run's lock is left alone.
        assert!(lock_dir.is_dir());
        assert!(registry.pending().is_empty());

        let archives: Vec<_> = fs::read_dir(&config.local_backup_dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tar.gz"))
            .collect();
        assert!(archives.is_empty());

        let log = RunLog::new(config.log_file()).read_lines().unwrap();
        assert_eq!(log.len(), 1);
        assert!(log[0].ends_with("Another backup is already running (lock exists). Exiting."));
    }

    #[test]
    fn failure_after_lock_still_releases_it() {
        if !process::command_exists(ARCHIVER) {
            return;
        }
        let temp = TempDir::new().unwrap();
        let config = local_only_config(temp.path());
        fs::create_dir_all(&config.local_backup_dir).unwrap();
        // A directory in place of the log file makes the first log line fail.
        fs::create_dir(config.log_file()).unwrap();

        let registry = CleanupRegistry::new();
        let engine = BackupEngine::new(config.clone(), Arc::clone(&registry));

        assert!(engine.run().is_err());
        assert!(!config.local_backup_dir.join(LOCK_DIR_NAME).exists());
        assert!(registry.pending().is_empty());
    }
}

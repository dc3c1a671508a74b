//! Backup engine for ClawBackup
//!
//! Performs one backup cycle per invocation and keeps the backup directory
//! within its retention period.
//!
//! # Architecture
//!
//! - `BackupEngine`: runs the cycle (lock, stage, archive, upload, prune)
//! - `RunLock` / `TempRoot`: guards released on every exit path, backed by a
//!   `CleanupRegistry` for termination signals
//! - `Stager`: collects the configured sources into the staging directory
//! - `RunLog`: the timestamped `backup.log` every step writes to
//!
//! # Artifacts
//!
//! Each run leaves two files in the local backup directory:
//! - `clawd_memory_backup_<stamp>.tar.gz`: the staged folder, with a
//!   `manifest.json` and `RESTORE_NOTES.txt`
//! - `clawd_memory_backup_<stamp>.tar.gz.sha256`: its checksum, when a
//!   SHA-256 tool is installed
//!
//! # Retention Policy
//!
//! Archives and checksums whose modification time is more than
//! `retention_days` whole days old are deleted locally, and through
//! `rclone delete --min-age` on the remote.
//!
//! # Example
//!
//! ```rust,ignore
//! use clawbackup::backup::{BackupEngine, CleanupRegistry, RunOutcome};
//! use clawbackup::config::{paths, BackupConfig};
//!
//! let home = paths::home_dir()?;
//! let config = BackupConfig::defaults_for(&home);
//! let engine = BackupEngine::new(config, CleanupRegistry::new());
//!
//! match engine.run()? {
//!     RunOutcome::Completed(summary) => println!("{}", summary.archive.display()),
//!     RunOutcome::AlreadyRunning => {}
//! }
//! ```

pub mod archive;
pub mod cleanup;
pub mod engine;
pub mod lock;
pub mod manifest;
pub mod retention;
pub mod run_log;
pub mod staging;
pub mod upload;

pub use cleanup::{install_signal_handler, CleanupRegistry, TempRoot, SIGNAL_EXIT_CODE};
pub use engine::{BackupEngine, BackupRun, RunOutcome, RunSummary};
pub use lock::{LockAttempt, RunLock};
pub use manifest::Manifest;
pub use retention::{ArchiveInfo, RetentionPolicy};
pub use run_log::RunLog;
pub use staging::{Stager, StagingReport};
pub use upload::RemotePrune;

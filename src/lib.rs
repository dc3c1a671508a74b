//! ClawBackup - scheduled backups of an OpenClaw project
//!
//! This library provides a setup wizard that generates a launcher script and
//! scheduler descriptor, and the backup engine the launcher runs. Each run
//! stages the project's memory, notes, scripts, OpenClaw configuration and
//! project mirror, archives them with `tar`, records a SHA-256 checksum,
//! uploads with `rclone`, and prunes archives past the retention period.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration record, path resolution and input normalizers
//! - `error`: Custom error types
//! - `backup`: The backup engine (lock, staging, archive, upload, retention)
//! - `generate`: Launcher script, launchd plist and cron line
//! - `setup`: Interactive and default setup wizard
//! - `storage`: Atomic and `.bak`-preserving file writes
//! - `process`: External tool invocation
//! - `cli`: Command handlers for the `clawbackup` binary
//! - `logging`: Diagnostic tracing setup
//!
//! # Example
//!
//! ```rust,ignore
//! use clawbackup::config::{paths, ClawPaths, BackupConfig};
//!
//! let paths = ClawPaths::new()?;
//! let home = paths::home_dir()?;
//! let config = BackupConfig::load_or_default(&paths, &home)?.resolved(&home)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod generate;
pub mod logging;
pub mod process;
pub mod setup;
pub mod storage;

pub use error::{ClawError, ClawResult};

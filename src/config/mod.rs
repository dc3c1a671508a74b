//! Configuration module for ClawBackup
//!
//! This module provides configuration management including:
//! - XDG-compliant config directory resolution
//! - Home-directory expansion for user-supplied paths
//! - The backup configuration record and its input normalizers

pub mod paths;
pub mod settings;

pub use paths::ClawPaths;
pub use settings::{BackupConfig, ScheduleKind, ScheduleSettings, UploadMode};

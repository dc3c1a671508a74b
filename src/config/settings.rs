//! Backup configuration for ClawBackup
//!
//! Holds the configuration record consumed by every engine run, the schedule
//! preferences, and the normalizers that turn raw user input into them.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::paths::{path_str, resolve_dir, ClawPaths};
use crate::error::ClawError;

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u32 = 7;
/// Default schedule hour (0-23)
pub const DEFAULT_SCHEDULE_HOUR: u8 = 11;
/// Default schedule minute (0-59)
pub const DEFAULT_SCHEDULE_MINUTE: u8 = 0;
/// Default rclone remote name
pub const DEFAULT_RCLONE_REMOTE: &str = "googleDrive:";
/// Default destination path on the remote
pub const DEFAULT_RCLONE_DEST: &str = "MoltBackups/Memory/";

/// Whether archives are pushed to a remote after being written locally
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
pub enum UploadMode {
    /// Copy archives to an rclone remote (default)
    #[default]
    #[serde(rename = "rclone")]
    #[value(name = "rclone")]
    Rclone,
    /// Keep archives on this machine only
    #[serde(rename = "local-only")]
    #[value(name = "local-only")]
    LocalOnly,
}

impl UploadMode {
    /// The canonical spelling used in config files and the launcher
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rclone => "rclone",
            Self::LocalOnly => "local-only",
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which OS scheduler should trigger the launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    /// macOS launchd agent
    Launchd,
    /// crontab entry
    Cron,
    /// No scheduler; run manually
    None,
}

impl ScheduleKind {
    /// launchd on macOS, cron everywhere else
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Launchd
        } else {
            Self::Cron
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Launchd => "launchd",
            Self::Cron => "cron",
            Self::None => "none",
        }
    }
}

impl Default for ScheduleKind {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When and how the launcher is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default)]
    pub kind: ScheduleKind,
    #[serde(default = "default_hour")]
    pub hour: u8,
    #[serde(default = "default_minute")]
    pub minute: u8,
}

fn default_hour() -> u8 {
    DEFAULT_SCHEDULE_HOUR
}

fn default_minute() -> u8 {
    DEFAULT_SCHEDULE_MINUTE
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            kind: ScheduleKind::default(),
            hour: DEFAULT_SCHEDULE_HOUR,
            minute: DEFAULT_SCHEDULE_MINUTE,
        }
    }
}

/// The configuration record baked into the launcher and read by every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Project directory (its `memory/` subfolder is the primary source)
    pub project_dir: PathBuf,
    /// OpenClaw configuration directory
    pub openclaw_dir: PathBuf,
    /// Secondary mirror of the project (Dev/CursorApps/clawd)
    pub mirror_dir: PathBuf,
    /// Where archives, checksums, the run log and the lock live
    pub local_backup_dir: PathBuf,

    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default)]
    pub upload_mode: UploadMode,

    #[serde(default = "default_remote")]
    pub rclone_remote: String,

    #[serde(default = "default_dest")]
    pub rclone_dest: String,

    #[serde(default)]
    pub schedule: ScheduleSettings,
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_remote() -> String {
    DEFAULT_RCLONE_REMOTE.to_string()
}

fn default_dest() -> String {
    DEFAULT_RCLONE_DEST.to_string()
}

impl BackupConfig {
    /// The stock configuration rooted at `home`
    pub fn defaults_for(home: &Path) -> Self {
        Self {
            project_dir: home.join("clawd"),
            openclaw_dir: home.join(".openclaw"),
            mirror_dir: home.join("Dev").join("CursorApps").join("clawd"),
            local_backup_dir: home.join("clawd").join("MoltBackups").join("Memory"),
            retention_days: DEFAULT_RETENTION_DAYS,
            upload_mode: UploadMode::default(),
            rclone_remote: default_remote(),
            rclone_dest: default_dest(),
            schedule: ScheduleSettings::default(),
        }
    }

    /// The memory directory inside the project
    pub fn source_dir(&self) -> PathBuf {
        self.project_dir.join("memory")
    }

    /// The log file every run appends to
    pub fn log_file(&self) -> PathBuf {
        self.local_backup_dir.join("backup.log")
    }

    /// Remote target as rclone expects it (`remote:dest`)
    pub fn remote_target(&self) -> String {
        format!("{}{}", self.rclone_remote, self.rclone_dest)
    }

    /// Return a copy with every directory made absolute and normalized
    pub fn resolved(mut self, home: &Path) -> Result<Self, ClawError> {
        for dir in [
            &mut self.project_dir,
            &mut self.openclaw_dir,
            &mut self.mirror_dir,
            &mut self.local_backup_dir,
        ] {
            let resolved = resolve_dir(path_str(dir)?, home)?;
            *dir = resolved;
        }
        Ok(self)
    }

    /// Load the persisted configuration, or the defaults if none was saved yet
    pub fn load_or_default(paths: &ClawPaths, home: &Path) -> Result<Self, ClawError> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::defaults_for(home))
        }
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ClawError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClawError::Io(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            ClawError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    /// Save the configuration to disk
    pub fn save(&self, paths: &ClawPaths) -> Result<(), ClawError> {
        paths.ensure_directories()?;
        crate::storage::write_json_atomic(paths.config_file(), self)
    }
}

/// A normalized value plus the warning to show when the input was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<T> {
    pub value: T,
    pub warning: Option<String>,
}

impl<T> Normalized<T> {
    fn accepted(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    fn fallback(value: T, warning: String) -> Self {
        Self {
            value,
            warning: Some(warning),
        }
    }
}

/// Case-insensitive schedule parsing with a platform fallback
pub fn normalize_schedule(input: &str) -> Normalized<ScheduleKind> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "launchd" => Normalized::accepted(ScheduleKind::Launchd),
        "cron" => Normalized::accepted(ScheduleKind::Cron),
        "none" => Normalized::accepted(ScheduleKind::None),
        "" => Normalized::accepted(ScheduleKind::platform_default()),
        _ => {
            let fallback = ScheduleKind::platform_default();
            Normalized::fallback(
                fallback,
                format!("Unknown schedule \"{}\"; using \"{}\".", input, fallback),
            )
        }
    }
}

/// Case-insensitive upload mode parsing, falling back to rclone
pub fn normalize_upload_mode(input: &str) -> Normalized<UploadMode> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "rclone" => Normalized::accepted(UploadMode::Rclone),
        "local-only" => Normalized::accepted(UploadMode::LocalOnly),
        "" => Normalized::accepted(UploadMode::default()),
        _ => {
            let fallback = UploadMode::default();
            Normalized::fallback(
                fallback,
                format!("Unknown upload mode \"{}\"; using \"{}\".", input, fallback),
            )
        }
    }
}

/// Extract the digits of `input` and accept them if within `min..=max`
///
/// Empty input silently yields `fallback`; anything out of range yields
/// `fallback` with a warning.
pub fn normalize_range(input: &str, fallback: u8, min: u8, max: u8, label: &str) -> Normalized<u8> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Normalized::accepted(fallback);
    }

    match digits.parse::<u32>() {
        Ok(n) if n >= u32::from(min) && n <= u32::from(max) => Normalized::accepted(n as u8),
        _ => Normalized::fallback(
            fallback,
            format!("Invalid {} \"{}\"; using \"{}\".", label, input, fallback),
        ),
    }
}

/// Schedule hour, 0-23
pub fn normalize_hour(input: &str) -> Normalized<u8> {
    normalize_range(input, DEFAULT_SCHEDULE_HOUR, 0, 23, "schedule hour")
}

/// Schedule minute, 0-59
pub fn normalize_minute(input: &str) -> Normalized<u8> {
    normalize_range(input, DEFAULT_SCHEDULE_MINUTE, 0, 59, "schedule minute")
}

/// Retention days: digits only, 7 when nothing usable remains
pub fn normalize_retention(input: &str) -> Normalized<u32> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Normalized::accepted(DEFAULT_RETENTION_DAYS);
    }
    match digits.parse::<u32>() {
        Ok(days) => Normalized::accepted(days),
        Err(_) => Normalized::fallback(
            DEFAULT_RETENTION_DAYS,
            format!(
                "Invalid retention days \"{}\"; using \"{}\".",
                input, DEFAULT_RETENTION_DAYS
            ),
        ),
    }
}

//! The `manifest.json` record written into every archive

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::paths::to_posix;
use crate::config::BackupConfig;
use crate::error::{ClawError, ClawResult};
use crate::process;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Placeholder for host details that could not be determined
pub const UNKNOWN: &str = "unknown";

/// `createdAt` format (UTC, second precision)
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Describes where a backup came from and how it was configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub created_at: String,
    pub hostname: String,
    pub os: String,
    pub project_dir: String,
    pub source_dir: String,
    pub openclaw_dir: String,
    #[serde(rename = "cursorappsClawd")]
    pub mirror_dir: String,
    pub local_backup_dir: String,
    pub archive_name: String,
    pub retention_days: u32,
    pub upload_mode: String,
}

/// Host identity captured for the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub hostname: String,
    pub os: String,
}

impl HostIdentity {
    /// `hostname` and `uname -a`, each `"unknown"` on failure
    pub fn detect() -> Self {
        let empty: [&str; 0] = [];
        Self {
            hostname: process::capture_stdout("hostname", &empty)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            os: process::capture_stdout("uname", &["-a"]).unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

impl Manifest {
    /// Build a manifest for this host
    pub fn new(
        config: &BackupConfig,
        archive_name: &str,
        created_at: DateTime<Utc>,
    ) -> ClawResult<Self> {
        Self::with_identity(config, archive_name, created_at, HostIdentity::detect())
    }

    pub fn with_identity(
        config: &BackupConfig,
        archive_name: &str,
        created_at: DateTime<Utc>,
        identity: HostIdentity,
    ) -> ClawResult<Self> {
        Ok(Self {
            created_at: created_at.format(CREATED_AT_FORMAT).to_string(),
            hostname: identity.hostname,
            os: identity.os,
            project_dir: to_posix(&config.project_dir)?,
            source_dir: to_posix(&config.source_dir())?,
            openclaw_dir: to_posix(&config.openclaw_dir)?,
            mirror_dir: to_posix(&config.mirror_dir)?,
            local_backup_dir: to_posix(&config.local_backup_dir)?,
            archive_name: archive_name.to_string(),
            retention_days: config.retention_days,
            upload_mode: config.upload_mode.to_string(),
        })
    }

    /// Write `manifest.json` into `staging_dir`
    pub fn write_to(&self, staging_dir: &Path) -> ClawResult<PathBuf> {
        let path = staging_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json + "\n")
            .map_err(|e| ClawError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadMode;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn identity() -> HostIdentity {
        HostIdentity {
            hostname: "studio.local".into(),
            os: "Darwin studio.local 23.1.0".into(),
        }
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut config = BackupConfig::defaults_for(Path::new("/Users/me"));
        config.upload_mode = UploadMode::LocalOnly;
        config.retention_days = 14;
        let created = Utc.with_ymd_and_hms(2026, 1, 31, 10, 5, 9).unwrap();

        let manifest = Manifest::with_identity(
            &config,
            "clawd_memory_backup_2026-01-31_11-05-09.tar.gz",
            created,
            identity(),
        )
        .unwrap();
        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(value["createdAt"], "2026-01-31T10:05:09Z");
        assert_eq!(value["hostname"], "studio.local");
        assert_eq!(value["projectDir"], "/Users/me/clawd");
        assert_eq!(value["sourceDir"], "/Users/me/clawd/memory");
        assert_eq!(value["openclawDir"], "/Users/me/.openclaw");
        assert_eq!(value["cursorappsClawd"], "/Users/me/Dev/CursorApps/clawd");
        assert_eq!(value["localBackupDir"], "/Users/me/clawd/MoltBackups/Memory");
        assert_eq!(value["retentionDays"], 14);
        assert_eq!(value["uploadMode"], "local-only");
        assert!(value.get("mirrorDir").is_none());
    }

    #[test]
    fn write_to_staging_dir() {
        let temp = TempDir::new().unwrap();
        let config = BackupConfig::defaults_for(temp.path());
        let manifest = Manifest::with_identity(&config, "a.tar.gz", Utc::now(), identity()).unwrap();

        let path = manifest.write_to(temp.path()).unwrap();
        let parsed: Manifest = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn detect_never_returns_empty() {
        let detected = HostIdentity::detect();
        assert!(!detected.hostname.is_empty());
        assert!(!detected.os.is_empty());
    }
}

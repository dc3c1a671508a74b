//! Local archive listing and retention
//!
//! Retention is decided by file modification time, counted in whole days the
//! way `find -mtime +N` does: a file is expired once its age, rounded down to
//! days, exceeds the retention period. The timestamp embedded in the file name
//! is not consulted.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};

use super::archive::{ARCHIVE_PREFIX, ARCHIVE_SUFFIX, CHECKSUM_EXTENSION};
use super::run_log::RunLog;
use crate::error::{ClawError, ClawResult};

/// Glob matching archives, as passed to `rclone --include`
pub const ARCHIVE_GLOB: &str = "clawd_memory_backup_*.tar.gz";
/// Glob matching checksum sidecars, as passed to `rclone --include`
pub const CHECKSUM_GLOB: &str = "clawd_memory_backup_*.tar.gz.sha256";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Which kind of backup artifact a file name denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Archive,
    Checksum,
}

/// Classify a file name against the fixed archive/checksum patterns
pub fn classify(filename: &str) -> Option<ArtifactKind> {
    let rest = filename.strip_prefix(ARCHIVE_PREFIX)?;
    if let Some(stem) = rest.strip_suffix(CHECKSUM_EXTENSION) {
        if stem.ends_with(ARCHIVE_SUFFIX) {
            return Some(ArtifactKind::Checksum);
        }
    }
    if rest.ends_with(ARCHIVE_SUFFIX) {
        return Some(ArtifactKind::Archive);
    }
    None
}

/// Age threshold, in days, for local and remote artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    days: u32,
}

impl RetentionPolicy {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Whether a file last modified at `modified` is past retention at `now`
    ///
    /// Files with a modification time in the future are never expired.
    pub fn is_expired(&self, modified: SystemTime, now: SystemTime) -> bool {
        match now.duration_since(modified) {
            Ok(age) => age.as_secs() / SECONDS_PER_DAY > u64::from(self.days),
            Err(_) => false,
        }
    }
}

/// An artifact selected for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// Find expired artifacts directly inside `backup_dir` (non-recursive)
///
/// Archives come first, then checksums; each group is sorted by name.
pub fn expired_artifacts(
    backup_dir: &Path,
    policy: RetentionPolicy,
    now: SystemTime,
) -> ClawResult<Vec<ExpiredArtifact>> {
    let mut archives = Vec::new();
    let mut checksums = Vec::new();

    for entry in read_backup_dir(backup_dir)? {
        let entry = entry.map_err(|e| {
            ClawError::Io(format!("Failed to read directory entry: {}", e))
        })?;

        let file_type = entry.file_type()?;
        if !file_type.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let Some(kind) = classify(&name) else {
            continue;
        };

        let modified = entry.metadata()?.modified()?;
        if !policy.is_expired(modified, now) {
            continue;
        }

        let artifact = ExpiredArtifact {
            kind,
            path: entry.path(),
        };
        match kind {
            ArtifactKind::Archive => archives.push(artifact),
            ArtifactKind::Checksum => checksums.push(artifact),
        }
    }

    archives.sort_by(|a, b| a.path.cmp(&b.path));
    checksums.sort_by(|a, b| a.path.cmp(&b.path));
    archives.extend(checksums);
    Ok(archives)
}

/// Delete expired local artifacts, logging each deletion
///
/// A file that disappears before it can be deleted is skipped silently.
pub fn sweep_local(
    backup_dir: &Path,
    policy: RetentionPolicy,
    log: &RunLog,
) -> ClawResult<Vec<PathBuf>> {
    let mut deleted = Vec::new();

    for artifact in expired_artifacts(backup_dir, policy, SystemTime::now())? {
        match fs::remove_file(&artifact.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(ClawError::Io(format!(
                    "Failed to delete old backup {}: {}",
                    artifact.path.display(),
                    e
                )))
            }
        }

        let what = match artifact.kind {
            ArtifactKind::Archive => "backup",
            ArtifactKind::Checksum => "checksum",
        };
        log.log(format!(
            "Deleted old local {}: '{}'.",
            what,
            artifact.path.display()
        ))?;
        deleted.push(artifact.path);
    }

    Ok(deleted)
}

/// Metadata about a local archive
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    /// Archive filename
    pub filename: String,
    /// Full path to the archive
    pub path: PathBuf,
    /// Last modification time
    pub modified: DateTime<Local>,
    /// Size in bytes
    pub size_bytes: u64,
    /// Whether a `.sha256` sidecar sits next to it
    pub has_checksum: bool,
}

impl ArchiveInfo {
    /// Age relative to `now`, zero for future timestamps
    pub fn age(&self, now: DateTime<Local>) -> Duration {
        now.signed_duration_since(self.modified)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// List local archives, newest first
pub fn list_archives(backup_dir: &Path) -> ClawResult<Vec<ArchiveInfo>> {
    if !backup_dir.exists() {
        return Ok(Vec::new());
    }

    let mut archives = Vec::new();
    for entry in read_backup_dir(backup_dir)? {
        let entry = entry.map_err(|e| {
            ClawError::Io(format!("Failed to read directory entry: {}", e))
        })?;

        let filename = entry.file_name().to_string_lossy().to_string();
        if classify(&filename) != Some(ArtifactKind::Archive) || !entry.file_type()?.is_file() {
            continue;
        }

        let metadata = entry.metadata()?;
        let path = entry.path();
        archives.push(ArchiveInfo {
            has_checksum: super::archive::checksum_path(&path).is_file(),
            filename,
            path,
            modified: DateTime::<Local>::from(metadata.modified()?),
            size_bytes: metadata.len(),
        });
    }

    archives.sort_by(|a, b| b.modified.cmp(&a.modified).then(b.filename.cmp(&a.filename)));
    Ok(archives)
}

fn read_backup_dir(backup_dir: &Path) -> ClawResult<fs::ReadDir> {
    fs::read_dir(backup_dir).map_err(|e| {
        ClawError::Io(format!(
            "Failed to read backup directory {}: {}",
            backup_dir.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(SECONDS_PER_DAY);

    fn write_aged(dir: &Path, name: &str, days_old: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, name).unwrap();
        let mtime = SystemTime::now() - DAY * days_old as u32 - Duration::from_secs(60);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        path
    }

    #[test]
    fn classify_matches_fixed_patterns() {
        assert_eq!(
            classify("clawd_memory_backup_2026-01-01_11-00-00.tar.gz"),
            Some(ArtifactKind::Archive)
        );
        assert_eq!(
            classify("clawd_memory_backup_2026-01-01_11-00-00.tar.gz.sha256"),
            Some(ArtifactKind::Checksum)
        );
        assert_eq!(classify("clawd_memory_backup_.tar.gz"), Some(ArtifactKind::Archive));
        assert_eq!(classify("backup.log"), None);
        assert_eq!(classify("other_backup_2026.tar.gz"), None);
        assert_eq!(classify("clawd_memory_backup_2026.zip"), None);
        assert_eq!(classify("clawd_memory_backup_2026.sha256"), None);
    }

    #[test]
    fn expiry_uses_whole_days() {
        let policy = RetentionPolicy::new(7);
        let now = SystemTime::now();

        assert!(!policy.is_expired(now - DAY, now));
        assert!(!policy.is_expired(now - DAY * 7, now));
        assert!(!policy.is_expired(now - DAY * 7 - Duration::from_secs(3600), now));
        assert!(policy.is_expired(now - DAY * 8, now));
        assert!(policy.is_expired(now - DAY * 10, now));
        assert!(!policy.is_expired(now + DAY, now));
    }

    #[test]
    fn zero_retention_keeps_todays_files() {
        let policy = RetentionPolicy::new(0);
        let now = SystemTime::now();
        assert!(!policy.is_expired(now - Duration::from_secs(3600), now));
        assert!(policy.is_expired(now - DAY - Duration::from_secs(1), now));
    }

    #[test]
    fn sweep_deletes_only_old_matching_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        let log = RunLog::new(dir.join("backup.log"));

        let recent = write_aged(dir, "clawd_memory_backup_2026-10-15_11-00-00.tar.gz", 1);
        let recent_sum = write_aged(dir, "clawd_memory_backup_2026-10-15_11-00-00.tar.gz.sha256", 1);
        let old = write_aged(dir, "clawd_memory_backup_2026-10-06_11-00-00.tar.gz", 10);
        let old_sum = write_aged(dir, "clawd_memory_backup_2026-10-06_11-00-00.tar.gz.sha256", 10);
        let unrelated = write_aged(dir, "notes_2026.tar.gz", 30);

        let nested_dir = dir.join("nested");
        fs::create_dir(&nested_dir).unwrap();
        let nested = write_aged(&nested_dir, "clawd_memory_backup_old.tar.gz", 30);

        let deleted = sweep_local(dir, RetentionPolicy::new(7), &log).unwrap();

        assert_eq!(deleted, vec![old.clone(), old_sum.clone()]);
        assert!(recent.exists());
        assert!(recent_sum.exists());
        assert!(!old.exists());
        assert!(!old_sum.exists());
        assert!(unrelated.exists());
        assert!(nested.exists());

        let lines = log.read_lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Deleted old local backup:"));
        assert!(lines[1].contains("Deleted old local checksum:"));
    }

    #[test]
    fn sweep_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let log = RunLog::new(temp.path().join("backup.log"));
        write_aged(temp.path(), "clawd_memory_backup_a.tar.gz", 20);

        assert_eq!(sweep_local(temp.path(), RetentionPolicy::new(7), &log).unwrap().len(), 1);
        assert!(sweep_local(temp.path(), RetentionPolicy::new(7), &log).unwrap().is_empty());
    }

    #[test]
    fn directories_matching_pattern_are_ignored() {
        let temp = TempDir::new().unwrap();
        let odd = temp.path().join("clawd_memory_backup_dir.tar.gz");
        fs::create_dir(&odd).unwrap();

        let expired =
            expired_artifacts(temp.path(), RetentionPolicy::new(0), SystemTime::now() + DAY * 5)
                .unwrap();
        assert!(expired.is_empty());
        assert!(odd.is_dir());
    }

    #[test]
    fn list_archives_newest_first_with_checksum_flag() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write_aged(dir, "clawd_memory_backup_old.tar.gz", 5);
        write_aged(dir, "clawd_memory_backup_new.tar.gz", 0);
        write_aged(dir, "clawd_memory_backup_new.tar.gz.sha256", 0);
        write_aged(dir, "backup.log", 0);

        let archives = list_archives(dir).unwrap();
        assert_eq!(archives.len(), 2);
        assert_eq!(archives[0].filename, "clawd_memory_backup_new.tar.gz");
        assert!(archives[0].has_checksum);
        assert!(!archives[1].has_checksum);
        assert!(archives[1].age(Local::now()) >= DAY * 5);
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(list_archives(&temp.path().join("missing")).unwrap().is_empty());
    }
}

//! Launcher script rendering
//!
//! The launcher is a two-line POSIX shell script that execs `clawbackup run`
//! with the whole configuration passed as flags, so a scheduler can trigger a
//! run without reading any config file.

use std::path::{Path, PathBuf};

use crate::config::paths::to_posix;
use crate::config::BackupConfig;
use crate::error::ClawResult;
use crate::storage::{make_executable, write_with_backup};

pub const LAUNCHER_FILE: &str = "backup_enhanced.sh";

/// `<project>/scripts`, where generated artifacts are written
pub fn scripts_dir(config: &BackupConfig) -> PathBuf {
    config.project_dir.join("scripts")
}

/// `<project>/scripts/backup_enhanced.sh`
pub fn launcher_path(config: &BackupConfig) -> PathBuf {
    scripts_dir(config).join(LAUNCHER_FILE)
}

/// Single-quote `value` for a POSIX shell (`'` becomes `'\''`)
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Flag/value pairs for `clawbackup run`, in a fixed order
pub fn run_flags(config: &BackupConfig) -> ClawResult<Vec<(&'static str, String)>> {
    Ok(vec![
        ("--project-dir", to_posix(&config.project_dir)?),
        ("--openclaw-dir", to_posix(&config.openclaw_dir)?),
        ("--mirror-dir", to_posix(&config.mirror_dir)?),
        ("--local-backup-dir", to_posix(&config.local_backup_dir)?),
        ("--retention-days", config.retention_days.to_string()),
        ("--upload-mode", config.upload_mode.to_string()),
        ("--remote", config.rclone_remote.clone()),
        ("--remote-dest", config.rclone_dest.clone()),
    ])
}

/// Render the launcher for `engine` (the clawbackup binary)
pub fn render_launcher(config: &BackupConfig, engine: &Path) -> ClawResult<String> {
    let mut script = String::from("#!/bin/sh\n");
    script.push_str("# Generated by `clawbackup setup`; re-run it to change these settings.\n");
    script.push_str(&format!("exec {} run", shell_quote(&to_posix(engine)?)));
    for (flag, value) in run_flags(config)? {
        script.push_str(&format!(" \\\n  {} {}", flag, shell_quote(&value)));
    }
    script.push('\n');
    Ok(script)
}

/// Where the launcher was written, and the preserved previous version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenLauncher {
    pub path: PathBuf,
    pub previous: Option<PathBuf>,
}

/// Write the launcher, keeping any existing one as `.bak`, and make it executable
pub fn write_launcher(config: &BackupConfig, engine: &Path) -> ClawResult<WrittenLauncher> {
    let path = launcher_path(config);
    let content = render_launcher(config, engine)?;
    let previous = write_with_backup(&path, &content)?;
    make_executable(&path)?;
    Ok(WrittenLauncher { path, previous })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadMode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$HOME `x` \"y\""), "'$HOME `x` \"y\"'");
    }

    #[test]
    fn launcher_carries_every_field_quoted() {
        let mut config = BackupConfig::defaults_for(Path::new("/Users/o'neil"));
        config.retention_days = 21;
        config.upload_mode = UploadMode::LocalOnly;

        let script = render_launcher(&config, Path::new("/usr/local/bin/clawbackup")).unwrap();

        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("exec '/usr/local/bin/clawbackup' run"));
        assert!(script.contains("--retention-days '21'"));
        assert!(script.contains("--upload-mode 'local-only'"));
        assert!(script.contains(r"--project-dir '/Users/o'\''neil/clawd'"));
        assert!(script.contains("--remote 'googleDrive:'"));
        assert!(script.contains("--remote-dest 'MoltBackups/Memory/'"));
        assert!(script.ends_with("'MoltBackups/Memory/'\n"));
    }

    #[test]
    fn every_mode_and_retention_appears_verbatim() {
        for mode in [UploadMode::Rclone, UploadMode::LocalOnly] {
            for days in [0, 1, 7, 365] {
                let mut config = BackupConfig::defaults_for(Path::new("/home/u"));
                config.upload_mode = mode;
                config.retention_days = days;
                let script = render_launcher(&config, Path::new("/bin/clawbackup")).unwrap();
                assert!(script.contains(&format!("--upload-mode '{}'", mode)));
                assert!(script.contains(&format!("--retention-days '{}'", days)));
            }
        }
    }

    #[test]
    fn second_write_preserves_first_as_bak() {
        let temp = TempDir::new().unwrap();
        let mut config = BackupConfig::defaults_for(temp.path());
        let engine = Path::new("/bin/clawbackup");

        let first = write_launcher(&config, engine).unwrap();
        assert!(first.previous.is_none());
        let first_contents = fs::read_to_string(&first.path).unwrap();

        config.retention_days = 30;
        let second = write_launcher(&config, engine).unwrap();
        let bak = second.previous.unwrap();

        assert_eq!(bak, first.path.with_file_name("backup_enhanced.sh.bak"));
        assert_eq!(fs::read_to_string(&bak).unwrap(), first_contents);
        assert!(fs::read_to_string(&second.path)
            .unwrap()
            .contains("--retention-days '30'"));
    }

    #[cfg(unix)]
    #[test]
    fn launcher_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let config = BackupConfig::defaults_for(temp.path());
        let written = write_launcher(&config, Path::new("/bin/clawbackup")).unwrap();

        let mode = fs::metadata(&written.path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_dir_is_not_written() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let mut config = BackupConfig::defaults_for(temp.path());
        config.mirror_dir = temp.path().join(OsStr::from_bytes(b"mirr\xf6r"));

        let err = write_launcher(&config, Path::new("/bin/clawbackup")).unwrap_err();
        assert!(matches!(err, crate::error::ClawError::Validation(_)));
        assert!(!launcher_path(&config).exists());
    }

    #[cfg(unix)]
    #[test]
    fn launcher_round_trips_through_sh() {
        // Replace exec target with printf to observe the argument vector.
        let mut config = BackupConfig::defaults_for(Path::new("/tmp/we'ird $dir"));
        config.rclone_remote = "remote with space:".into();
        let script = render_launcher(&config, Path::new("printf"))
            .unwrap()
            .replace("exec 'printf' run", "exec printf '%s\\n' run");

        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(&script)
            .output()
            .unwrap();
        let args: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();

        assert_eq!(args[0], "run");
        assert_eq!(args[1], "--project-dir");
        assert_eq!(args[2], "/tmp/we'ird $dir/clawd");
        let remote = args.iter().position(|a| a == "--remote").unwrap();
        assert_eq!(args[remote + 1], "remote with space:");
    }
}

//! Directory setup step
//!
//! Asks for the four directories a backup reads from and writes to. Missing
//! directories only produce a warning; they may be created later.

use std::path::{Path, PathBuf};

use crate::config::paths::{path_str, resolve_dir};
use crate::config::BackupConfig;
use crate::error::ClawResult;
use crate::setup::Prompter;

/// Directories chosen by the user, absolute and normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsSetupResult {
    pub project_dir: PathBuf,
    pub openclaw_dir: PathBuf,
    pub mirror_dir: PathBuf,
    pub local_backup_dir: PathBuf,
}

/// Paths setup step
pub struct PathsSetupStep;

impl PathsSetupStep {
    /// Run the paths setup step
    pub fn run<P: Prompter>(
        prompter: &mut P,
        defaults: &BackupConfig,
        home: &Path,
    ) -> ClawResult<PathsSetupResult> {
        prompter.say("")?;
        prompter.say("Step 1: Directories")?;
        prompter.say("===================")?;
        prompter.say("")?;

        let project_dir = ask_dir(prompter, "Project dir", &defaults.project_dir, home)?;
        let openclaw_dir = ask_dir(prompter, "~/.openclaw dir", &defaults.openclaw_dir, home)?;
        let mirror_dir = ask_dir(
            prompter,
            "Dev/CursorApps/clawd dir",
            &defaults.mirror_dir,
            home,
        )?;
        let local_backup_dir =
            ask_dir(prompter, "Local backup dir", &defaults.local_backup_dir, home)?;

        for (label, dir) in [
            ("Project dir", &project_dir),
            ("~/.openclaw dir", &openclaw_dir),
            ("Dev/CursorApps/clawd dir", &mirror_dir),
            ("Local backup dir", &local_backup_dir),
        ] {
            if let Some(warning) = missing_dir_warning(label, dir) {
                prompter.warn(&warning)?;
            }
        }

        Ok(PathsSetupResult {
            project_dir,
            openclaw_dir,
            mirror_dir,
            local_backup_dir,
        })
    }
}

fn ask_dir<P: Prompter>(
    prompter: &mut P,
    label: &str,
    default: &Path,
    home: &Path,
) -> ClawResult<PathBuf> {
    let answer = prompter.ask(&format!("{} [{}]: ", label, default.display()))?;
    if answer.is_empty() {
        resolve_dir(path_str(default)?, home)
    } else {
        resolve_dir(&answer, home)
    }
}

/// `Warning: "<label>" does not exist: <path>` when `dir` is missing
pub fn missing_dir_warning(label: &str, dir: &Path) -> Option<String> {
    if dir.exists() {
        None
    } else {
        Some(format!(
            "Warning: \"{}\" does not exist: {}",
            label,
            dir.display()
        ))
    }
}

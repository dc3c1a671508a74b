//! Upload and retention setup step

use crate::config::settings::{normalize_retention, normalize_upload_mode};
use crate::config::{BackupConfig, UploadMode};
use crate::error::ClawResult;
use crate::setup::Prompter;

/// Upload step result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSetupResult {
    pub upload_mode: UploadMode,
    pub rclone_remote: String,
    pub rclone_dest: String,
    pub retention_days: u32,
}

/// Upload setup step
pub struct UploadSetupStep;

impl UploadSetupStep {
    /// Run the upload setup step
    ///
    /// The remote questions are skipped in local-only mode; the defaults are
    /// kept so switching back to rclone later needs no re-entry.
    pub fn run<P: Prompter>(prompter: &mut P, defaults: &BackupConfig) -> ClawResult<UploadSetupResult> {
        prompter.say("")?;
        prompter.say("Step 2: Upload & Retention")?;
        prompter.say("==========================")?;
        prompter.say("")?;

        let answer = prompter.ask(&format!(
            "Upload mode (rclone|local-only) [{}]: ",
            defaults.upload_mode
        ))?;
        let mode = if answer.is_empty() {
            defaults.upload_mode
        } else {
            let normalized = normalize_upload_mode(&answer);
            if let Some(warning) = normalized.warning {
                prompter.warn(&warning)?;
            }
            normalized.value
        };

        let (rclone_remote, rclone_dest) = match mode {
            UploadMode::Rclone => (
                ask_or(prompter, "rclone remote", &defaults.rclone_remote)?,
                ask_or(prompter, "Remote dest path", &defaults.rclone_dest)?,
            ),
            UploadMode::LocalOnly => (defaults.rclone_remote.clone(), defaults.rclone_dest.clone()),
        };

        let answer = prompter.ask(&format!("Retention days [{}]: ", defaults.retention_days))?;
        let retention_days = if answer.is_empty() {
            defaults.retention_days
        } else {
            let normalized = normalize_retention(&answer);
            if let Some(warning) = normalized.warning {
                prompter.warn(&warning)?;
            }
            normalized.value
        };

        Ok(UploadSetupResult {
            upload_mode: mode,
            rclone_remote,
            rclone_dest,
            retention_days,
        })
    }
}

fn ask_or<P: Prompter>(prompter: &mut P, label: &str, default: &str) -> ClawResult<String> {
    let answer = prompter.ask(&format!("{} [{}]: ", label, default))?;
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer
    })
}

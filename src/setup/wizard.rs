//! Setup wizard orchestration
//!
//! Collects a configuration (interactively or from defaults), persists it,
//! writes the launcher script and, on macOS, the launchd agent, then prints
//! how to install the schedule.

use std::path::{Path, PathBuf};

use crate::config::{BackupConfig, ClawPaths, ScheduleKind, UploadMode};
use crate::error::ClawResult;
use crate::generate::scheduler::{cron_line, launch_agent_path, write_launchd_plist};
use crate::generate::{write_launcher, WrittenLauncher};

use super::steps::{
    paths::PathsSetupStep, schedule::ScheduleSetupStep, upload::UploadSetupStep,
};
use super::Prompter;

/// Result of running the setup wizard
#[derive(Debug, Clone)]
pub struct SetupResult {
    /// The configuration that was saved
    pub config: BackupConfig,
    /// Where the configuration was persisted
    pub config_file: PathBuf,
    /// The generated launcher
    pub launcher: WrittenLauncher,
    /// The launchd agent, when one was written
    pub plist: Option<PathBuf>,
}

/// The setup wizard
pub struct SetupWizard {
    paths: ClawPaths,
    home: PathBuf,
    engine: PathBuf,
}

impl SetupWizard {
    /// `engine` is the clawbackup binary the launcher will exec
    pub fn new(paths: ClawPaths, home: PathBuf, engine: PathBuf) -> Self {
        Self {
            paths,
            home,
            engine,
        }
    }

    /// Run the interactive setup wizard
    pub fn run<P: Prompter>(&self, prompter: &mut P) -> ClawResult<SetupResult> {
        prompter.say("ClawBackup Setup (interactive)")?;
        prompter.say("Press Enter to accept the value in brackets.")?;

        let defaults = BackupConfig::defaults_for(&self.home);
        let dirs = PathsSetupStep::run(prompter, &defaults, &self.home)?;
        let upload = UploadSetupStep::run(prompter, &defaults)?;
        let schedule = ScheduleSetupStep::run(prompter, &defaults.schedule)?;

        let config = BackupConfig {
            project_dir: dirs.project_dir,
            openclaw_dir: dirs.openclaw_dir,
            mirror_dir: dirs.mirror_dir,
            local_backup_dir: dirs.local_backup_dir,
            retention_days: upload.retention_days,
            upload_mode: upload.upload_mode,
            rclone_remote: upload.rclone_remote,
            rclone_dest: upload.rclone_dest,
            schedule,
        };

        let write_plist = cfg!(target_os = "macos") && schedule.kind == ScheduleKind::Launchd;
        let result = self.apply(config, write_plist, prompter)?;
        self.print_instructions(&result, prompter)?;
        Ok(result)
    }

    /// Accept every default without asking
    pub fn run_defaults<P: Prompter>(&self, prompter: &mut P) -> ClawResult<SetupResult> {
        let config = BackupConfig::defaults_for(&self.home).resolved(&self.home)?;
        let result = self.apply(config, cfg!(target_os = "macos"), prompter)?;
        self.print_instructions(&result, prompter)?;
        Ok(result)
    }

    fn apply<P: Prompter>(
        &self,
        config: BackupConfig,
        write_plist: bool,
        prompter: &mut P,
    ) -> ClawResult<SetupResult> {
        config.save(&self.paths)?;
        let config_file = self.paths.config_file();
        prompter.say("")?;
        prompter.say(&format!("Configuration saved to: {}", config_file.display()))?;

        let launcher = write_launcher(&config, &self.engine)?;
        if let Some(previous) = &launcher.previous {
            prompter.warn(&format!(
                "Existing script backed up to: {}",
                previous.display()
            ))?;
        }
        prompter.say(&format!(
            "Backup script written to: {}",
            launcher.path.display()
        ))?;

        let plist = if write_plist {
            let path = write_launchd_plist(&config, &launcher.path, &config.schedule)?;
            prompter.say(&format!("Launchd plist written to: {}", path.display()))?;
            Some(path)
        } else {
            None
        };

        Ok(SetupResult {
            config,
            config_file,
            launcher,
            plist,
        })
    }

    fn print_instructions<P: Prompter>(
        &self,
        result: &SetupResult,
        prompter: &mut P,
    ) -> ClawResult<()> {
        let script = &result.launcher.path;
        let schedule = &result.config.schedule;

        prompter.say("")?;
        match (&result.plist, schedule.kind) {
            (Some(plist), _) => {
                for line in launchd_instructions(plist, &self.home) {
                    prompter.say(&line)?;
                }
            }
            (None, ScheduleKind::Cron) => {
                prompter.say("Add this line to crontab (crontab -e):")?;
                prompter.say(&format!(
                    "  {}",
                    cron_line(script, schedule.hour, schedule.minute)?
                ))?;
            }
            _ => {
                prompter.say(
                    "Scheduler not configured. Run the backup script manually or set up cron/launchd.",
                )?;
            }
        }

        prompter.say("")?;
        prompter.say("Next steps:")?;
        let mut step = 1;
        if result.config.upload_mode == UploadMode::Rclone {
            prompter.say(&format!("  {}. Ensure rclone is configured: rclone config", step))?;
            step += 1;
        }
        prompter.say(&format!("  {}. Test run: {}", step, script.display()))?;
        Ok(())
    }
}

/// Commands that install the agent into `~/Library/LaunchAgents`
fn launchd_instructions(plist: &Path, home: &Path) -> Vec<String> {
    let agent = launch_agent_path(home);
    let agents_dir = agent.parent().unwrap_or(home);
    vec![
        "Install the scheduler (run as your user, do not use sudo):".to_string(),
        format!("  mkdir -p \"{}\"", agents_dir.display()),
        format!("  cp \"{}\" \"{}\"", plist.display(), agent.display()),
        format!("  launchctl load \"{}\"", agent.display()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::ConsolePrompter;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn wizard(temp: &TempDir) -> SetupWizard {
        SetupWizard::new(
            ClawPaths::with_base_dir(temp.path().join("config")),
            temp.path().join("home"),
            PathBuf::from("/usr/local/bin/clawbackup"),
        )
    }

    #[test]
    fn defaults_mode_writes_config_and_launcher() {
        let temp = TempDir::new().unwrap();
        let wizard = wizard(&temp);
        let mut prompter = ConsolePrompter::new(Cursor::new(""), Vec::new());

        let result = wizard.run_defaults(&mut prompter).unwrap();

        let home = temp.path().join("home");
        assert_eq!(result.launcher.path, home.join("clawd/scripts/backup_enhanced.sh"));
        assert!(result.launcher.path.is_file());
        assert_eq!(result.plist.is_some(), cfg!(target_os = "macos"));

        let saved = BackupConfig::load(&result.config_file).unwrap();
        assert_eq!(saved, result.config);

        let output = String::from_utf8(prompter.into_output()).unwrap();
        assert!(output.contains("Backup script written to:"));
        assert!(output.contains("Ensure rclone is configured"));
    }

    #[test]
    fn interactive_run_uses_answers() {
        let temp = TempDir::new().unwrap();
        let wizard = wizard(&temp);
        // Four directories, upload mode, retention, schedule, hour, minute.
        let input = "\n\n\n~/bk\nlocal-only\n14\ncron\n25\n15\n";
        let mut prompter = ConsolePrompter::new(Cursor::new(input), Vec::new());

        let result = wizard.run(&mut prompter).unwrap();

        let home = temp.path().join("home");
        assert_eq!(result.config.local_backup_dir, home.join("bk"));
        assert_eq!(result.config.upload_mode, UploadMode::LocalOnly);
        assert_eq!(result.config.retention_days, 14);
        assert_eq!(result.config.schedule.kind, ScheduleKind::Cron);
        assert_eq!(result.config.schedule.hour, 11);
        assert_eq!(result.config.schedule.minute, 15);
        assert!(result.plist.is_none());

        let script = fs::read_to_string(&result.launcher.path).unwrap();
        assert!(script.contains("--upload-mode 'local-only'"));
        assert!(script.contains("--retention-days '14'"));

        let output = String::from_utf8(prompter.into_output()).unwrap();
        assert!(output.contains("Add this line to crontab"));
        assert!(output.contains(&format!(
            "15 11 * * * {}",
            result.launcher.path.display()
        )));
        assert!(!output.contains("Ensure rclone is configured"));
        assert!(output.contains("1. Test run:"));
    }

    #[test]
    fn rerun_preserves_previous_launcher() {
        let temp = TempDir::new().unwrap();
        let wizard = wizard(&temp);

        let mut first = ConsolePrompter::new(Cursor::new(""), Vec::new());
        wizard.run_defaults(&mut first).unwrap();
        let mut second = ConsolePrompter::new(Cursor::new(""), Vec::new());
        let result = wizard.run_defaults(&mut second).unwrap();

        assert!(result.launcher.previous.unwrap().is_file());
        let output = String::from_utf8(second.into_output()).unwrap();
        assert!(output.contains("Existing script backed up to:"));
    }

    #[test]
    fn launchd_instructions_target_user_agents() {
        let lines = launchd_instructions(
            Path::new("/Users/me/clawd/scripts/com.openclaw.backup.plist"),
            Path::new("/Users/me"),
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("/Users/me/Library/LaunchAgents"));
        assert!(lines[3].starts_with("  launchctl load"));
    }
}

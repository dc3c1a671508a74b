//! Setup and config CLI commands

use std::path::{Path, PathBuf};

use crate::backup::RunLock;
use crate::config::{BackupConfig, ClawPaths};
use crate::error::{ClawError, ClawResult};
use crate::generate::launcher_path;
use crate::setup::{ConsolePrompter, SetupResult, SetupWizard};

/// Run the setup wizard on stdin/stdout
///
/// The launcher execs `engine_path`, or this binary when none is given.
pub fn handle_setup(
    paths: ClawPaths,
    home: PathBuf,
    defaults: bool,
    engine_path: Option<PathBuf>,
) -> ClawResult<SetupResult> {
    let engine = match engine_path {
        Some(path) => path,
        None => std::env::current_exe().map_err(|e| {
            ClawError::Config(format!("Could not locate the clawbackup binary: {}", e))
        })?,
    };

    let wizard = SetupWizard::new(paths, home, engine);
    let mut prompter = ConsolePrompter::stdio();
    if defaults {
        wizard.run_defaults(&mut prompter)
    } else {
        wizard.run(&mut prompter)
    }
}

/// Show where configuration lives and what a run would use
pub fn handle_config(paths: &ClawPaths, home: &Path) -> ClawResult<()> {
    let config_file = paths.config_file();
    let saved = config_file.exists();
    let config = BackupConfig::load_or_default(paths, home)?.resolved(home)?;

    println!("ClawBackup Configuration");
    println!("========================");
    println!("Config directory: {}", paths.base_dir().display());
    println!(
        "Config file:      {}{}",
        config_file.display(),
        if saved { "" } else { " (not saved; showing defaults)" }
    );
    println!("Launcher script:  {}", launcher_path(&config).display());
    println!();
    println!("Paths:");
    println!("  Project dir:      {}", config.project_dir.display());
    println!("  Memory dir:       {}", config.source_dir().display());
    println!("  OpenClaw dir:     {}", config.openclaw_dir.display());
    println!("  Mirror dir:       {}", config.mirror_dir.display());
    println!("  Local backup dir: {}", config.local_backup_dir.display());
    println!("  Run log:          {}", config.log_file().display());
    println!();
    println!("Settings:");
    println!("  Upload mode:      {}", config.upload_mode);
    println!("  Remote target:    {}", config.remote_target());
    println!("  Retention:        {} days", config.retention_days);
    println!(
        "  Schedule:         {} at {:02}:{:02}",
        config.schedule.kind, config.schedule.hour, config.schedule.minute
    );
    if RunLock::is_held(&config.local_backup_dir) {
        println!();
        println!("A backup is currently running (lock present).");
    }
    Ok(())
}

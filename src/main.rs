use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use clawbackup::backup::{install_signal_handler, CleanupRegistry};
use clawbackup::cli::{
    handle_config, handle_list, handle_prune, handle_run, handle_setup, resolve_run_config,
    RunArgs,
};
use clawbackup::config::{paths, ClawPaths};

#[derive(Parser)]
#[command(
    name = "clawbackup",
    version,
    about = "Scheduled backups of an OpenClaw project",
    long_about = "ClawBackup generates a launcher script and scheduler entry that \
                  periodically archive an OpenClaw project's memory and \
                  configuration, upload the archive with rclone, and prune \
                  copies older than the retention period."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure backups and generate the launcher script
    Setup {
        /// Accept every default without prompting
        #[arg(long)]
        defaults: bool,

        /// Binary the launcher should exec (defaults to this one)
        #[arg(long, value_name = "PATH")]
        engine_path: Option<PathBuf>,
    },

    /// Run one backup now
    Run(RunArgs),

    /// List local backups
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,

        #[command(flatten)]
        overrides: RunArgs,
    },

    /// Delete local backups older than the retention period
    Prune {
        /// Delete instead of only previewing
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        overrides: RunArgs,
    },

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    clawbackup::logging::init();
    let cli = Cli::parse();

    let paths = ClawPaths::new()?;
    let home = paths::home_dir()?;

    match cli.command {
        Some(Commands::Setup {
            defaults,
            engine_path,
        }) => {
            handle_setup(paths, home, defaults, engine_path)?;
        }
        Some(Commands::Run(args)) => {
            let config = resolve_run_config(&paths, &home, &args)?;
            let registry = CleanupRegistry::new();
            install_signal_handler(registry.clone())?;

            // Lock contention is a normal outcome and exits 0.
            handle_run(config, registry)?;
        }
        Some(Commands::List { verbose, overrides }) => {
            let config = resolve_run_config(&paths, &home, &overrides)?;
            handle_list(&config, verbose)?;
        }
        Some(Commands::Prune { force, overrides }) => {
            let config = resolve_run_config(&paths, &home, &overrides)?;
            let registry = CleanupRegistry::new();
            install_signal_handler(registry.clone())?;
            handle_prune(&config, &registry, force)?;
        }
        Some(Commands::Config) => {
            handle_config(&paths, &home)?;
        }
        None => {
            println!("ClawBackup - scheduled OpenClaw project backups");
            println!();
            println!("Run 'clawbackup setup' to configure backups.");
            println!("Run 'clawbackup --help' for usage information.");
        }
    }

    Ok(())
}

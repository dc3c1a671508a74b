//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup engine and wizard.

pub mod backup;
pub mod setup;

pub use backup::{handle_list, handle_prune, handle_run, resolve_run_config, RunArgs};
pub use setup::{handle_config, handle_setup};

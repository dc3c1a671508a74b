//! Storage layer for ClawBackup
//!
//! Atomic JSON writes for persisted settings and `.bak`-preserving writes for
//! generated artifacts.

pub mod file_io;

pub use file_io::{make_executable, write_json_atomic, write_with_backup};

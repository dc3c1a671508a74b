//! Generated artifacts: the launcher script and scheduler descriptors

pub mod scheduler;
pub mod script;

pub use scheduler::{cron_line, render_launchd_plist, write_launchd_plist};
pub use script::{launcher_path, render_launcher, shell_quote, write_launcher, WrittenLauncher};

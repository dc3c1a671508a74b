//! Setup wizard
//!
//! Collects backup settings and generates the launcher script and scheduler
//! descriptor that trigger `clawbackup run`.

pub mod prompter;
pub mod steps;
pub mod wizard;

pub use prompter::{ConsolePrompter, Prompter};
pub use wizard::{SetupResult, SetupWizard};

//! Setup wizard steps
//!
//! Individual steps in the setup wizard flow.

pub mod paths;
pub mod schedule;
pub mod upload;

pub use paths::PathsSetupStep;
pub use schedule::ScheduleSetupStep;
pub use upload::UploadSetupStep;

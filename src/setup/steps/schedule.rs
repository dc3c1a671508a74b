//! Schedule setup step
//!
//! Picks the scheduler and the daily time the launcher runs at.

use crate::config::settings::{normalize_hour, normalize_minute, normalize_schedule, Normalized};
use crate::config::{ScheduleKind, ScheduleSettings};
use crate::error::ClawResult;
use crate::setup::Prompter;

/// Schedule setup step
pub struct ScheduleSetupStep;

impl ScheduleSetupStep {
    /// Run the schedule setup step
    pub fn run<P: Prompter>(prompter: &mut P, defaults: &ScheduleSettings) -> ClawResult<ScheduleSettings> {
        prompter.say("")?;
        prompter.say("Step 3: Schedule")?;
        prompter.say("================")?;
        prompter.say("")?;

        let answer = prompter.ask(&format!(
            "Schedule (launchd|cron|none) [{}]: ",
            defaults.kind
        ))?;
        let kind = if answer.is_empty() {
            defaults.kind
        } else {
            accept(prompter, normalize_schedule(&answer))?
        };

        if kind == ScheduleKind::None {
            return Ok(ScheduleSettings { kind, ..*defaults });
        }

        let answer = prompter.ask(&format!("Hour (0-23) [{}]: ", defaults.hour))?;
        let hour = accept(prompter, normalize_hour(&answer))?;
        let answer = prompter.ask(&format!("Minute (0-59) [{}]: ", defaults.minute))?;
        let minute = accept(prompter, normalize_minute(&answer))?;

        Ok(ScheduleSettings { kind, hour, minute })
    }
}

fn accept<P: Prompter, T>(prompter: &mut P, normalized: Normalized<T>) -> ClawResult<T> {
    if let Some(warning) = &normalized.warning {
        prompter.warn(warning)?;
    }
    Ok(normalized.value)
}

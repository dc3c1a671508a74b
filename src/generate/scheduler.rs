//! launchd and cron descriptors for the launcher

use std::path::{Path, PathBuf};

use crate::config::paths::to_posix;
use crate::config::{BackupConfig, ScheduleSettings};
use crate::error::ClawResult;
use crate::storage::write_with_backup;

/// launchd job label
pub const LAUNCHD_LABEL: &str = "com.openclaw.backup";
/// PATH given to the launchd job so Homebrew tools resolve
pub const LAUNCHD_PATH: &str = "/opt/homebrew/bin:/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin";

/// `com.openclaw.backup.plist`
pub fn plist_file_name() -> String {
    format!("{}.plist", LAUNCHD_LABEL)
}

/// Escape text for XML character data and attribute values
pub fn escape_plist(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render the launchd agent that runs `script` daily at `hour:minute`
pub fn render_launchd_plist(
    script: &Path,
    backup_dir: &Path,
    hour: u8,
    minute: u8,
) -> ClawResult<String> {
    let script = escape_plist(&to_posix(script)?);
    let stdout = escape_plist(&to_posix(&backup_dir.join("launchd.log"))?);
    let stderr = escape_plist(&to_posix(&backup_dir.join("launchd.err"))?);

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
  <dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
      <string>{script}</string>
    </array>
    <key>EnvironmentVariables</key>
    <dict>
      <key>PATH</key>
      <string>{path}</string>
    </dict>
    <key>StartCalendarInterval</key>
    <dict>
      <key>Hour</key>
      <integer>{hour}</integer>
      <key>Minute</key>
      <integer>{minute}</integer>
    </dict>
    <key>StandardOutPath</key>
    <string>{stdout}</string>
    <key>StandardErrorPath</key>
    <string>{stderr}</string>
  </dict>
</plist>
"#,
        label = escape_plist(LAUNCHD_LABEL),
        path = escape_plist(LAUNCHD_PATH),
    ))
}

/// Write the plist next to the launcher, keeping any previous one as `.bak`
pub fn write_launchd_plist(
    config: &BackupConfig,
    script: &Path,
    schedule: &ScheduleSettings,
) -> ClawResult<PathBuf> {
    let path = super::script::scripts_dir(config).join(plist_file_name());
    let content = render_launchd_plist(
        script,
        &config.local_backup_dir,
        schedule.hour,
        schedule.minute,
    )?;
    write_with_backup(&path, &content)?;
    Ok(path)
}

/// `<minute> <hour> * * * <script>`
pub fn cron_line(script: &Path, hour: u8, minute: u8) -> ClawResult<String> {
    Ok(format!("{} {} * * * {}", minute, hour, to_posix(script)?))
}

/// `~/Library/LaunchAgents/com.openclaw.backup.plist`
pub fn launch_agent_path(home: &Path) -> PathBuf {
    home.join("Library")
        .join("LaunchAgents")
        .join(plist_file_name())
}

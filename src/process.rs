//! External tool invocation
//!
//! Every tool the engine drives (`tar`, `shasum`, `rclone`, `rsync`, ...) is
//! run through these helpers with an explicit argument vector; nothing is
//! ever interpreted by a shell.

use std::ffi::OsStr;
use std::process::{Command, Output, Stdio};

use crate::error::{ClawError, ClawResult};

#[must_use]
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Fail with `Missing dependency: <program>` unless it is on PATH
pub fn require(program: &str) -> ClawResult<()> {
    if command_exists(program) {
        Ok(())
    } else {
        Err(ClawError::missing(program))
    }
}

/// Run a tool with captured output; non-zero exit is an error
pub fn run_checked<S: AsRef<OsStr>>(program: &str, args: &[S]) -> ClawResult<Output> {
    require(program)?;
    let rendered = render(program, args);
    tracing::debug!(command = %rendered, "running");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ClawError::Io(format!("Failed to spawn `{}`: {}", rendered, e)))?;

    validate(&rendered, output)
}

/// Run a tool whose output streams straight to our stdout/stderr
pub fn run_inherited<S: AsRef<OsStr>>(program: &str, args: &[S]) -> ClawResult<()> {
    require(program)?;
    let rendered = render(program, args);
    tracing::debug!(command = %rendered, "running (inherited stdio)");

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .status()
        .map_err(|e| ClawError::Io(format!("Failed to spawn `{}`: {}", rendered, e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(ClawError::command_failed(
            rendered,
            status.code().unwrap_or(-1),
            "",
        ))
    }
}

/// Trimmed stdout of a tool, or `None` if it is missing or fails
pub fn capture_stdout<S: AsRef<OsStr>>(program: &str, args: &[S]) -> Option<String> {
    match run_checked(program, args) {
        Ok(output) => {
            let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        }
        Err(err) => {
            tracing::debug!(program, error = %err, "best-effort command failed");
            None
        }
    }
}

fn validate(rendered: &str, output: Output) -> ClawResult<Output> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(ClawError::command_failed(
        rendered,
        output.status.code().unwrap_or(-1),
        &stderr,
    ))
}

fn render<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.as_ref().to_string_lossy());
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_reported_by_name() {
        let err = run_checked("clawbackup-definitely-not-a-tool", &["--version"]).unwrap_err();
        assert!(err.is_missing_dependency());
        assert_eq!(
            err.to_string(),
            "Missing dependency: clawbackup-definitely-not-a-tool"
        );
    }

    #[test]
    fn capture_of_missing_program_is_none() {
        let empty: [&str; 0] = [];
        assert!(capture_stdout("clawbackup-definitely-not-a-tool", &empty).is_none());
    }

    #[test]
    fn render_joins_arguments() {
        assert_eq!(render("tar", &["-czf", "a.tar.gz"]), "tar -czf a.tar.gz");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_command_failed() {
        let err = run_checked("sh", &["-c", "echo nope >&2; exit 3"]).unwrap_err();
        match err {
            ClawError::CommandFailed {
                status,
                stderr_suffix,
                ..
            } => {
                assert_eq!(status, 3);
                assert!(stderr_suffix.contains("nope"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn capture_stdout_trims() {
        assert_eq!(
            capture_stdout("sh", &["-c", "echo '  hello  '"]).as_deref(),
            Some("hello")
        );
    }
}

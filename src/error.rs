//! Custom error types for ClawBackup
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for ClawBackup operations
#[derive(Error, Debug)]
pub enum ClawError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required external tool is not on PATH
    #[error("Missing dependency: {command}")]
    CommandMissing { command: String },

    /// An external tool exited unsuccessfully
    #[error("Command failed: `{command}` (status: {status}){stderr_suffix}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr_suffix: String,
    },

    /// Archive creation errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Remote transfer errors
    #[error("Upload error: {0}")]
    Upload(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClawError {
    /// Create a "missing dependency" error
    pub fn missing(command: impl Into<String>) -> Self {
        Self::CommandMissing {
            command: command.into(),
        }
    }

    /// Create a "command failed" error, keeping the trimmed stderr if any
    pub fn command_failed(command: impl Into<String>, status: i32, stderr: &str) -> Self {
        let trimmed = stderr.trim();
        let stderr_suffix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("; stderr: {}", trimmed)
        };
        Self::CommandFailed {
            command: command.into(),
            status,
            stderr_suffix,
        }
    }

    /// Check if this is a missing dependency error
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::CommandMissing { .. })
    }
}

impl From<std::io::Error> for ClawError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ClawError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ClawBackup operations
pub type ClawResult<T> = Result<T, ClawError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ClawError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn missing_dependency_message() {
        let err = ClawError::missing("rclone");
        assert_eq!(err.to_string(), "Missing dependency: rclone");
        assert!(err.is_missing_dependency());
    }

    #[test]
    fn command_failed_keeps_stderr() {
        let err = ClawError::command_failed("tar -czf out.tar.gz", 2, "  tar: boom\n");
        assert_eq!(
            err.to_string(),
            "Command failed: `tar -czf out.tar.gz` (status: 2); stderr: tar: boom"
        );

        let quiet = ClawError::command_failed("tar", 1, "");
        assert_eq!(quiet.to_string(), "Command failed: `tar` (status: 1)");
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let claw_err: ClawError = io_err.into();
        assert!(matches!(claw_err, ClawError::Io(_)));
    }
}

//! Append-only run log
//!
//! Every progress line of a backup run is printed to stdout and appended to
//! `backup.log` in the local backup directory, prefixed with a local
//! timestamp. Each write is flushed immediately.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{ClawError, ClawResult};

/// Timestamp format at the start of every log line
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes run progress to the console and the on-disk log
#[derive(Debug, Clone)]
pub struct RunLog {
    /// Path to the log file
    log_path: PathBuf,
}

impl RunLog {
    /// Create a RunLog that appends to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Log one line
    pub fn log(&self, message: impl AsRef<str>) -> ClawResult<()> {
        let line = format!(
            "{} - {}",
            Local::now().format(LINE_TIMESTAMP_FORMAT),
            message.as_ref()
        );
        // A closed stdout must not abort the run; the file copy is authoritative.
        let _ = writeln!(io::stdout().lock(), "{}", line);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| ClawError::Io(format!("Failed to open run log: {}", e)))?;

        writeln!(file, "{}", line)
            .map_err(|e| ClawError::Io(format!("Failed to write run log: {}", e)))?;

        file.flush()
            .map_err(|e| ClawError::Io(format!("Failed to flush run log: {}", e)))?;

        Ok(())
    }

    /// Read every line of the log file, oldest first
    pub fn read_lines(&self) -> ClawResult<Vec<String>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| ClawError::Io(format!("Failed to open run log: {}", e)))?;

        BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ClawError::Io(format!("Failed to read run log: {}", e)))
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

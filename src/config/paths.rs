//! Path management for ClawBackup
//!
//! Provides XDG-compliant resolution of the config directory, plus the
//! helpers used to turn user-typed directories into absolute paths.
//!
//! ## Path Resolution Order
//!
//! 1. `CLAWBACKUP_CONFIG_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/clawbackup` or `~/.config/clawbackup`
//! 3. Windows: `%APPDATA%\clawbackup`

use std::path::{Component, Path, PathBuf};

use directories::BaseDirs;

use crate::error::ClawError;

/// Manages the paths owned by ClawBackup itself
#[derive(Debug, Clone)]
pub struct ClawPaths {
    /// Base directory for ClawBackup configuration
    base_dir: PathBuf,
}

impl ClawPaths {
    /// Create a new ClawPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, ClawError> {
        let base_dir = match std::env::var("CLAWBACKUP_CONFIG_DIR") {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create ClawPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/clawbackup/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the persisted backup configuration
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), ClawError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ClawError::Io(format!("Failed to create config directory: {}", e)))
    }
}

/// The invoking user's home directory
pub fn home_dir() -> Result<PathBuf, ClawError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| ClawError::Config("Could not determine home directory".into()))
}

/// Resolve a user-typed directory to an absolute, normalized path
///
/// A leading `~` (alone or followed by a separator) expands to `home`;
/// relative paths are resolved against the current working directory.
pub fn resolve_dir(input: &str, home: &Path) -> Result<PathBuf, ClawError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ClawError::Validation("Empty path".into()));
    }

    let expanded = expand_home(trimmed, home);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map_err(|e| ClawError::Io(format!("Failed to read current directory: {}", e)))?
            .join(expanded)
    };

    Ok(normalize(&absolute))
}

/// Expand a leading `~` to the home directory
fn expand_home(input: &str, home: &Path) -> PathBuf {
    if input == "~" {
        return home.to_path_buf();
    }
    match input.strip_prefix("~/").or_else(|| input.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(input),
    }
}

/// Lexically remove `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Borrow a path as UTF-8 text, rejecting paths that would not round-trip
pub fn path_str(path: &Path) -> Result<&str, ClawError> {
    path.to_str().ok_or_else(|| {
        ClawError::Validation(format!("Path is not valid UTF-8: {}", path.display()))
    })
}

/// Render a path with forward slashes for embedding in generated files
pub fn to_posix(path: &Path) -> Result<String, ClawError> {
    let rendered = path_str(path)?;
    if std::path::MAIN_SEPARATOR == '/' {
        Ok(rendered.to_string())
    } else {
        Ok(rendered.replace(std::path::MAIN_SEPARATOR, "/"))
    }
}

/// Resolve the default config directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, ClawError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.trim().is_empty() => PathBuf::from(xdg),
        _ => home_dir()?.join(".config"),
    };
    Ok(config_base.join("clawbackup"))
}

/// Resolve the default config directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, ClawError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| ClawError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("clawbackup"))
}

//! Guaranteed cleanup of the run lock and staging root
//!
//! Normal returns, errors and panics release resources through `Drop`.
//! Termination signals cannot unwind the main thread, so every guard also
//! records its path in a shared [`CleanupRegistry`] that the signal handler
//! drains before the process exits.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tempfile::TempDir;

use crate::error::{ClawError, ClawResult};

/// Exit status used after a termination signal (128 + SIGINT)
pub const SIGNAL_EXIT_CODE: i32 = 130;

/// A filesystem resource that must not outlive the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupTarget {
    /// The lock marker directory; removed with `rmdir`
    LockDir(PathBuf),
    /// The temp staging root; removed recursively
    TempTree(PathBuf),
}

impl CleanupTarget {
    fn path(&self) -> &Path {
        match self {
            Self::LockDir(path) | Self::TempTree(path) => path,
        }
    }

    fn remove(&self) {
        let result = match self {
            Self::LockDir(path) => fs::remove_dir(path),
            Self::TempTree(path) => fs::remove_dir_all(path),
        };
        if let Err(err) = result {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %self.path().display(), error = %err, "cleanup failed");
            }
        }
    }
}

/// Paths that must be removed if the process is interrupted
#[derive(Debug, Default)]
pub struct CleanupRegistry {
    targets: Mutex<Vec<CleanupTarget>>,
}

impl CleanupRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn targets(&self) -> MutexGuard<'_, Vec<CleanupTarget>> {
        self.targets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, target: CleanupTarget) {
        self.targets().push(target);
    }

    /// Forget a target whose guard already cleaned it up
    pub fn unregister(&self, path: &Path) {
        self.targets().retain(|t| t.path() != path);
    }

    /// Targets still awaiting cleanup, in registration order
    pub fn pending(&self) -> Vec<CleanupTarget> {
        self.targets().clone()
    }

    /// Remove every registered target, newest first
    ///
    /// Idempotent: targets are dropped from the registry as they are removed.
    pub fn release_all(&self) {
        let drained: Vec<CleanupTarget> = self.targets().drain(..).collect();
        for target in drained.iter().rev() {
            target.remove();
        }
    }
}

/// Route SIGINT/SIGTERM through the registry, then exit with status 130
///
/// May only be installed once per process.
pub fn install_signal_handler(registry: Arc<CleanupRegistry>) -> ClawResult<()> {
    ctrlc::set_handler(move || {
        tracing::warn!("termination signal received; releasing lock and staging area");
        registry.release_all();
        std::process::exit(SIGNAL_EXIT_CODE);
    })
    .map_err(|e| ClawError::Config(format!("Failed to install signal handler: {}", e)))
}

/// Process-private temporary root holding the staging directory
pub struct TempRoot {
    registry: Arc<CleanupRegistry>,
    dir: TempDir,
}

impl TempRoot {
    pub fn create(registry: &Arc<CleanupRegistry>) -> ClawResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("clawbackup-")
            .tempdir()
            .map_err(|e| ClawError::Io(format!("Failed to create temp directory: {}", e)))?;

        registry.register(CleanupTarget::TempTree(dir.path().to_path_buf()));

        Ok(Self {
            registry: Arc::clone(registry),
            dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        // `dir` is removed by TempDir's own Drop right after this.
        self.registry.unregister(self.dir.path());
    }
}

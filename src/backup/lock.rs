//! Directory-based run lock
//!
//! The lock is the directory `<local_backup_dir>/.lock`. Directory creation is
//! atomic, so whichever run creates it first owns the backup directory until
//! the guard is dropped. Its contents are never inspected.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::cleanup::{CleanupRegistry, CleanupTarget};
use crate::error::{ClawError, ClawResult};

/// Name of the lock directory inside the local backup directory
pub const LOCK_DIR_NAME: &str = ".lock";

/// Result of trying to take the lock
#[derive(Debug)]
pub enum LockAttempt {
    /// This run owns the backup directory
    Acquired(RunLock),
    /// Another run holds the lock
    Contended,
}

/// Guard for an acquired lock; removes the lock directory on drop
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    registry: Arc<CleanupRegistry>,
    released: bool,
}

impl RunLock {
    /// Attempt to create the lock directory in `backup_dir`
    ///
    /// An existing lock is reported as [`LockAttempt::Contended`], not as an
    /// error.
    pub fn try_acquire(
        backup_dir: &Path,
        registry: &Arc<CleanupRegistry>,
    ) -> ClawResult<LockAttempt> {
        let path = backup_dir.join(LOCK_DIR_NAME);

        match fs::create_dir(&path) {
            Ok(()) => {
                registry.register(CleanupTarget::LockDir(path.clone()));
                Ok(LockAttempt::Acquired(Self {
                    path,
                    registry: Arc::clone(registry),
                    released: false,
                }))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(LockAttempt::Contended),
            Err(e) => Err(ClawError::Io(format!(
                "Failed to create lock {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Check whether a lock directory is currently present
    pub fn is_held(backup_dir: &Path) -> bool {
        backup_dir.join(LOCK_DIR_NAME).is_dir()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock now instead of at end of scope
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.registry.unregister(&self.path);
        if let Err(e) = fs::remove_dir(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove lock");
            }
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        self.release_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn lock_prevents_second_acquire() {
        let temp = TempDir::new().unwrap();
        let registry = CleanupRegistry::new();

        let first = RunLock::try_acquire(temp.path(), &registry).unwrap();
        assert!(matches!(first, LockAttempt::Acquired(_)));
        assert!(RunLock::is_held(temp.path()));

        let second = RunLock::try_acquire(temp.path(), &registry).unwrap();
        assert!(matches!(second, LockAttempt::Contended));

        drop(first);
        assert!(!RunLock::is_held(temp.path()));

        let third = RunLock::try_acquire(temp.path(), &registry).unwrap();
        assert!(matches!(third, LockAttempt::Acquired(_)));
    }

    #[test]
    fn contended_attempt_leaves_foreign_lock_alone() {
        let temp = TempDir::new().unwrap();
        let registry = CleanupRegistry::new();
        fs::create_dir(temp.path().join(LOCK_DIR_NAME)).unwrap();

        let attempt = RunLock::try_acquire(temp.path(), &registry).unwrap();
        assert!(matches!(attempt, LockAttempt::Contended));
        drop(attempt);

        assert!(RunLock::is_held(temp.path()));
        assert!(registry.pending().is_empty());
    }

    #[test]
    fn acquired_lock_is_registered_until_released() {
        let temp = TempDir::new().unwrap();
        let registry = CleanupRegistry::new();

        let lock = match RunLock::try_acquire(temp.path(), &registry).unwrap() {
            LockAttempt::Acquired(lock) => lock,
            LockAttempt::Contended => panic!("expected to acquire"),
        };
        assert_eq!(
            registry.pending(),
            vec![CleanupTarget::LockDir(lock.path().to_path_buf())]
        );

        lock.release();
        assert!(registry.pending().is_empty());
        assert!(!RunLock::is_held(temp.path()));
    }

    #[test]
    fn concurrent_acquire_has_exactly_one_winner() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();
        let registry = CleanupRegistry::new();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dir = dir.clone();
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    // Keep the guard alive until every thread has tried.
                    RunLock::try_acquire(&dir, &registry).unwrap()
                })
            })
            .collect();

        let attempts: Vec<LockAttempt> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = attempts
            .iter()
            .filter(|a| matches!(a, LockAttempt::Acquired(_)))
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn missing_backup_dir_is_an_error() {
        let temp = TempDir::new().unwrap();
        let registry = CleanupRegistry::new();
        let result = RunLock::try_acquire(&temp.path().join("missing"), &registry);
        assert!(result.is_err());
    }
}

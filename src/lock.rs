//! Advisory lock serializing read-modify-write cycles on the persisted state
//!
//! Every analysis loads the whole state, merges one directory into it, and
//! writes the whole state back. Holding this lock across that cycle keeps two
//! concurrent analyses from silently overwriting each other's snapshots.
//! Locks are released when dropped.

use crate::storage::StoreError;
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Name of the lock file inside the state directory.
pub const LOCK_FILE: &str = "state.lock";

/// How long to wait for the lock and how often to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSettings {
    /// Give up after this long
    pub timeout: Duration,
    /// Pause between attempts
    pub retry_interval: Duration,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_interval: Duration::from_millis(100),
        }
    }
}

impl From<&crate::config::LockConfig> for LockSettings {
    fn from(config: &crate::config::LockConfig) -> Self {
        Self {
            timeout: config.timeout(),
            retry_interval: config.retry_interval(),
        }
    }
}

/// Holds the exclusive state lock
///
/// The lock file itself is left in place on release: unlinking a file that
/// another process is blocked on would let a third process lock a fresh inode
/// while the second still believes it holds the lock.
#[derive(Debug)]
pub struct StateLock {
    /// Lock file handle
    lock_file: File,
    /// Path to the lock file (for error messages)
    lock_path: PathBuf,
}

impl StateLock {
    /// Acquire the exclusive state lock in `state_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create the state directory or lock file
    /// - Another holder keeps the lock for longer than `settings.timeout`
    pub fn acquire(state_dir: &Path, settings: LockSettings) -> Result<Self, StoreError> {
        fs::create_dir_all(state_dir).map_err(|e| StoreError::io(state_dir, e))?;

        let lock_path = state_dir.join(LOCK_FILE);
        let lock_file = Self::try_acquire_lock(&lock_path, settings)?;

        tracing::debug!(lock = %lock_path.display(), "acquired state lock");
        Ok(Self {
            lock_file,
            lock_path,
        })
    }

    /// Try to acquire the lock file, retrying until the timeout elapses
    fn try_acquire_lock(lock_path: &Path, settings: LockSettings) -> Result<File, StoreError> {
        let start = Instant::now();

        loop {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(lock_path)
                .map_err(|e| StoreError::io(lock_path, e))?;

            let acquired =
                acquired(file.try_lock_exclusive()).map_err(|e| StoreError::io(lock_path, e))?;

            if acquired {
                Self::write_holder_info(&file);
                return Ok(file);
            }
            if start.elapsed() >= settings.timeout {
                return Err(StoreError::LockTimeout {
                    path: lock_path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }
            std::thread::sleep(settings.retry_interval);
        }
    }

    /// Record who holds the lock, for debugging a stuck analysis
    fn write_holder_info(file: &File) {
        let mut file_ref = file;
        let written = file.set_len(0).and_then(|()| {
            writeln!(
                file_ref,
                "pid={}\ntime={}",
                std::process::id(),
                humantime::format_rfc3339(SystemTime::now())
            )
        });
        if let Err(e) = written {
            tracing::debug!(error = %e, "failed to record lock holder");
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// Release the lock explicitly (normally handled by Drop)
    ///
    /// # Errors
    ///
    /// Returns an error if the unlock operation fails
    pub fn release(self) -> Result<(), StoreError> {
        self.lock_file
            .unlock()
            .map_err(|e| StoreError::io(&self.lock_path, e))
    }
}

/// `Ok(false)` while another holder has the lock. Contention reported as
/// `WouldBlock` counts the same; any other error is a real locking failure.
fn acquired(attempt: io::Result<bool>) -> io::Result<bool> {
    match attempt {
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
        other => other,
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

//! Portable advisory file locking (spec §5 "Shared-resource policy", §9
//! "a portable file-lock primitive").
//!
//! Guards the three shared disk regions named in the spec: the git mirror
//! cache, the binary artifact cache, and a project's `Checkouts`/`Build`
//! directories. The lock file records the holder's PID so a crashed
//! process's lock can be recognized as stale. Acquisition polls
//! `try_lock_exclusive` from a `spawn_blocking` task with exponential
//! backoff, mirroring the teacher's `installer::project_lock::ProjectLock`.

use crate::constants::{default_lock_timeout, MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};
use crate::core::DrydockError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_retry::strategy::ExponentialBackoff;

/// An exclusive advisory lock on a single path, released when dropped.
#[derive(Debug)]
pub struct FileLock {
    file: Arc<File>,
    path: PathBuf,
}

impl FileLock {
    /// Acquire an exclusive lock on `path`, waiting up to `timeout`
    /// (spec §5 "optional caller-provided timeout"; `None` waits forever).
    pub async fn acquire(path: &Path, timeout: Option<Duration>) -> Result<Self, DrydockError> {
        let path = path.to_path_buf();
        let lock_err = |reason: String| DrydockError::LockError {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| lock_err(e.to_string()))?;
        }

        let file = Arc::new(
            OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&path)
                .map_err(|e| lock_err(e.to_string()))?,
        );

        let start = Instant::now();
        let backoff = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS).max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS));

        let mut acquired = false;
        for delay in backoff {
            let probe = Arc::clone(&file);
            let got = tokio::task::spawn_blocking(move || FileExt::try_lock_exclusive(probe.as_ref()))
                .await
                .map_err(|e| lock_err(e.to_string()))?
                .unwrap_or(false);

            if got {
                acquired = true;
                break;
            }

            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    break;
                }
            }
            tokio::time::sleep(delay).await;
        }

        if !acquired {
            let holder = read_holder_pid(&file).unwrap_or(0);
            return Err(lock_err(format!("timed out waiting for lock (held by pid {holder})")));
        }

        {
            let mut handle = file.as_ref();
            handle.set_len(0).ok();
            handle.seek(SeekFrom::Start(0)).ok();
            let _ = write!(handle, "{}", std::process::id());
            handle.flush().ok();
        }

        Ok(Self { file, path })
    }

    /// Acquire with the spec's default lock timeout.
    pub async fn acquire_default(path: &Path) -> Result<Self, DrydockError> {
        Self::acquire(path, Some(default_lock_timeout())).await
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(self.file.as_ref());
    }
}

fn read_holder_pid(file: &File) -> Option<u32> {
    let mut file = file.try_clone().ok()?;
    file.seek(SeekFrom::Start(0)).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_acquire_creates_lock_file_with_pid() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("region.lock");
        let lock = FileLock::acquire(&lock_path, Some(Duration::from_secs(1))).await.unwrap();
        assert!(lock_path.exists());
        drop(lock);
    }

    #[tokio::test]
    async fn test_second_acquire_after_drop_succeeds() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("region.lock");
        {
            let _lock = FileLock::acquire(&lock_path, Some(Duration::from_secs(1))).await.unwrap();
        }
        let _lock2 = FileLock::acquire(&lock_path, Some(Duration::from_secs(1))).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_acquire_times_out() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("region.lock");
        let _held = FileLock::acquire(&lock_path, Some(Duration::from_secs(5))).await.unwrap();
        let err = FileLock::acquire(&lock_path, Some(Duration::from_millis(200))).await.unwrap_err();
        assert!(matches!(err, DrydockError::LockError { .. }));
    }
}

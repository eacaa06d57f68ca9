//! Inter-process exclusive file lock

use crate::error::{RewindError, RewindResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An exclusive advisory lock on a lock file, released on drop
///
/// Acquisition blocks until every other holder has released the lock. The
/// lock file itself is left in place.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Acquire the lock, creating the lock file if needed
    pub fn acquire(path: impl AsRef<Path>) -> RewindResult<Self> {
        let path = path.as_ref();

        #[cfg(unix)]
        let file = {
            use std::os::unix::fs::OpenOptionsExt;
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .mode(0o644)
                .open(path)
                .map_err(|e| RewindError::lock(path, e))?
        };

        #[cfg(not(unix))]
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| RewindError::lock(path, e))?;

        file.lock_exclusive()
            .map_err(|e| RewindError::lock(path, e))?;
        debug!("Acquired lock {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

/// Delete a lock file if present
///
/// Only meant for cleanup between test runs; never call it while another
/// process may hold the lock.
pub fn remove_lock_file(path: &Path) -> RewindResult<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path)
        .map_err(|e| RewindError::io(format!("removing lock file {}", path.display()), e))?;
    debug!("Removed lock file {}", path.display());
    Ok(true)
}

//! File-backed usage counter
//!
//! Tallies the units consumed by recorded calls (drained stream items, or
//! `usage.total_tokens` on scalar outputs) into `{"count": N}` files, one per
//! caller-chosen path. Each update is a read-modify-write under the file's
//! own `<path>.lock`.

use crate::config::Config;
use crate::error::{RewindError, RewindResult};
use crate::record::Output;
use crate::store::FileLock;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Contents of a counter file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCount {
    pub count: u64,
}

/// Accumulates usage into counter files
#[derive(Debug, Clone, Default)]
pub struct UsageCounter {
    default_path: Option<PathBuf>,
}

impl UsageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter whose default file comes from `counter.path`
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_path: config.counter.path.clone(),
        }
    }

    /// Add the units carried by `output` to the counter at `path`
    ///
    /// The output is handed back with the same shape it came in, streams
    /// replaced by fresh streams over the drained items.
    pub fn increment(&self, path: &Path, output: Output) -> RewindResult<Output> {
        let stored = output.drain();
        let units = stored.usage_units();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                RewindError::io(format!("creating counter directory {}", parent.display()), e)
            })?;
        }

        let total = {
            let _lock = FileLock::acquire(lock_path(path))?;
            let mut current = Self::read_unlocked(path)?;
            current.count += units;
            write_count(path, current)?;
            current.count
        };

        info!("Counted {} unit(s) in {} (total {})", units, path.display(), total);
        Ok(stored.materialize())
    }

    /// Increment the configured default counter file
    pub fn increment_default(&self, output: Output) -> RewindResult<Output> {
        let path = self.default_path.as_deref().ok_or_else(|| {
            RewindError::RecordFileMissing("no counter file configured".to_string())
        })?;
        self.increment(path, output)
    }

    /// Read the counter at `path`; absent or empty files count zero
    pub fn read(path: &Path) -> RewindResult<UsageCount> {
        if !path.exists() {
            return Ok(UsageCount::default());
        }
        let _lock = FileLock::acquire(lock_path(path))?;
        Self::read_unlocked(path)
    }

    /// Reset the counter at `path` to zero
    pub fn reset(path: &Path) -> RewindResult<()> {
        if !path.exists() {
            return Ok(());
        }
        let _lock = FileLock::acquire(lock_path(path))?;
        write_count(path, UsageCount::default())?;
        debug!("Reset counter {}", path.display());
        Ok(())
    }

    fn read_unlocked(path: &Path) -> RewindResult<UsageCount> {
        if !path.is_file() {
            return Ok(UsageCount::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| RewindError::io(format!("reading counter {}", path.display()), e))?;
        if content.trim().is_empty() {
            return Ok(UsageCount::default());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

fn write_count(path: &Path, count: UsageCount) -> RewindResult<()> {
    let content = serde_json::to_string(&count)?;
    fs::write(path, content)
        .map_err(|e| RewindError::io(format!("writing counter {}", path.display()), e))
}

/// `<path>.lock`
fn lock_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

//! Lock-guarded store handle
//!
//! Binds one cache location at a time and guards every read and write of its
//! record file with the location's exclusive lock file.

use crate::error::{RewindError, RewindResult};
use crate::record::Record;
use crate::store::lock::{remove_lock_file, FileLock};
use crate::store::location::CacheLocation;
use crate::store::sqlite::{RecordBackend, SqliteBackend};
use crate::store::{Mirrors, RecordSlot};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Handle to the currently bound record file
#[derive(Debug)]
pub struct StoreHandle {
    location: Option<CacheLocation>,
    backend: Box<dyn RecordBackend>,
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreHandle {
    /// Create an unbound handle using the SQLite backend
    pub fn new() -> Self {
        Self::with_backend(SqliteBackend)
    }

    /// Create an unbound handle over a custom backend
    pub fn with_backend(backend: impl RecordBackend + 'static) -> Self {
        Self {
            location: None,
            backend: Box::new(backend),
        }
    }

    /// Currently bound location, if any
    pub fn location(&self) -> Option<&CacheLocation> {
        self.location.as_ref()
    }

    /// Bind `path` and load its records into the matching mirror slot
    ///
    /// Returns `false` without touching disk when `path` resolves to the
    /// location already bound.
    pub fn bind(&mut self, path: &Path, mirrors: &mut Mirrors) -> RewindResult<bool> {
        let location = CacheLocation::resolve(path)?;
        if self.location.as_ref() == Some(&location) {
            return Ok(false);
        }

        fs::create_dir_all(location.dir()).map_err(|e| {
            RewindError::io(format!("creating cache directory {}", location.dir().display()), e)
        })?;
        debug!("Binding record file {}", location);

        let slot = mirrors.entry(location.file().to_path_buf()).or_default();
        self.load_from(&location, slot)?;
        self.location = Some(location);
        Ok(true)
    }

    /// Replace `slot` with the records on disk
    ///
    /// Returns `false` and leaves `slot` empty when the record file has not
    /// been created yet.
    pub fn load(&self, slot: &mut RecordSlot) -> RewindResult<bool> {
        self.load_from(self.bound()?, slot)
    }

    fn load_from(&self, location: &CacheLocation, slot: &mut RecordSlot) -> RewindResult<bool> {
        slot.clear();

        if !location.exists() {
            debug!("Record file {} not found, starting empty", location);
            return Ok(false);
        }

        let records = {
            let _lock = FileLock::acquire(location.lock_file())?;
            self.backend.read_all(location.file())?
        };

        let Some(records) = records else {
            return Ok(false);
        };
        for record in records {
            slot.insert(record.hash.clone(), record);
        }
        debug!("Loaded {} record(s) from {}", slot.len(), location);
        Ok(true)
    }

    /// Write `entries[key]` to the record file under the lock
    pub fn persist(&self, entries: Option<&RecordSlot>, key: &str) -> RewindResult<()> {
        let location = self.bound()?;
        let entries = entries.ok_or_else(|| {
            RewindError::RecordFileMissing(format!(
                "no in-memory records for {}",
                location.file().display()
            ))
        })?;
        let record = entries
            .get(key)
            .ok_or_else(|| RewindError::RecordItemMissing {
                hash: key.to_string(),
                input: "<not present in memory>".to_string(),
                file: location.to_string(),
            })?;

        let _lock = FileLock::acquire(location.lock_file())?;
        self.backend.write(location.file(), record)?;
        info!("Recorded {} ({}) to {}", key, record.output_kind(), location);
        Ok(())
    }

    /// Delete the bound location's lock file if present
    pub fn release_lock(&self) -> RewindResult<bool> {
        match &self.location {
            Some(location) => remove_lock_file(&location.lock_file()),
            None => Ok(false),
        }
    }

    /// Read every record at `location` under its lock, without binding it
    pub fn read_location(&self, location: &CacheLocation) -> RewindResult<Vec<Record>> {
        if !location.exists() {
            return Ok(Vec::new());
        }
        let _lock = FileLock::acquire(location.lock_file())?;
        Ok(self.backend.read_all(location.file())?.unwrap_or_default())
    }

    fn bound(&self) -> RewindResult<&CacheLocation> {
        self.location.as_ref().ok_or_else(|| {
            RewindError::RecordFileMissing("no cache location has been bound".to_string())
        })
    }
}

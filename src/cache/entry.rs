//! In-memory entry cache with write-through persistence

use crate::error::{RewindError, RewindResult};
use crate::record::{CallInput, Normalizer, Output, Record};
use crate::store::{CacheLocation, Mirrors, RecordSlot, StoreHandle};
use std::path::Path;
use tracing::debug;

/// Records of the bound location, mirrored in memory and written through to
/// the record file on change
#[derive(Debug, Default)]
pub struct EntryCache {
    handle: StoreHandle,
    mirrors: Mirrors,
    normalizer: Normalizer,
}

impl EntryCache {
    pub fn new(normalizer: Normalizer) -> Self {
        Self::with_handle(StoreHandle::new(), normalizer)
    }

    /// Build a cache over a pre-configured store handle
    pub fn with_handle(handle: StoreHandle, normalizer: Normalizer) -> Self {
        Self {
            handle,
            mirrors: Mirrors::new(),
            normalizer,
        }
    }

    /// Bind a cache location, loading its records on first bind
    pub fn bind_location(&mut self, path: &Path) -> RewindResult<()> {
        self.handle.bind(path, &mut self.mirrors)?;
        Ok(())
    }

    pub fn location(&self) -> Option<&CacheLocation> {
        self.handle.location()
    }

    /// Look up the recorded output for `input`
    pub fn get(&self, input: &CallInput) -> RewindResult<Output> {
        let (location, slot) = self.bound_slot()?;
        let normalized = self.normalizer.normalize(input);
        let hash = normalized.hash()?;

        match slot.get(&hash) {
            Some(record) => {
                debug!("Replaying {} ({})", hash, record.output_kind());
                Ok(record.output.materialize())
            }
            None => Err(RewindError::RecordItemMissing {
                hash,
                input: normalized.dump(),
                file: location.to_string(),
            }),
        }
    }

    /// Record `output` for `input` and hand back a fresh copy of it
    ///
    /// The record file is only written when the stored output changes.
    pub fn set(&mut self, input: &CallInput, output: Output) -> RewindResult<Output> {
        let file = self
            .location()
            .ok_or_else(|| RewindError::RecordFileMissing("no cache location bound".into()))?
            .file()
            .to_path_buf();
        let normalized = self.normalizer.normalize(input);
        let hash = normalized.hash()?;
        let stored = output.drain();

        let slot = self.mirrors.entry(file).or_default();
        let changed = slot
            .get(&hash)
            .is_none_or(|existing| existing.differs_from(&stored));

        if changed {
            let record = Record::new(hash.clone(), &normalized, stored);
            let previous = slot.insert(hash.clone(), record);
            if let Err(e) = self.handle.persist(Some(slot), &hash) {
                // Mirror must not hold what never reached disk
                match previous {
                    Some(record) => slot.insert(hash, record),
                    None => slot.remove(&hash),
                };
                return Err(e);
            }
        } else {
            debug!("Record {} unchanged, skipping write", hash);
        }

        slot.get(&hash)
            .map(|record| record.output.materialize())
            .ok_or_else(|| RewindError::RecordFileMissing(format!("record {} vanished", hash)))
    }

    /// Number of records mirrored for the bound location
    pub fn len(&self) -> usize {
        self.bound_slot().map(|(_, slot)| slot.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete the bound location's lock file
    pub fn release_lock(&self) -> RewindResult<bool> {
        self.handle.release_lock()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    fn bound_slot(&self) -> RewindResult<(&CacheLocation, &RecordSlot)> {
        let location = self
            .location()
            .ok_or_else(|| RewindError::RecordFileMissing("no cache location bound".into()))?;
        let slot = self.mirrors.get(location.file()).ok_or_else(|| {
            RewindError::RecordFileMissing(format!("no records loaded for {}", location))
        })?;
        Ok((location, slot))
    }
}

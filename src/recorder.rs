//! Record/replay facade
//!
//! One `Recorder` is built per test process (or harness) and shared by
//! reference with every call site. It owns the single active entry cache and
//! applies the mode contract:
//!
//! | Mode | Lookup | On miss |
//! |------|--------|---------|
//! | live | never consults the cache | call the real service |
//! | record | replays on hit | call the real service and record its output |
//! | replay | replays on hit | fail with `RecordItemMissing` |

use crate::cache::EntryCache;
use crate::config::Config;
use crate::error::{RewindError, RewindResult};
use crate::mode::RecordMode;
use crate::record::{CallInput, Normalizer, Output};
use crate::store::CacheLocation;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Process-wide access point to the record cache
#[derive(Debug)]
pub struct Recorder {
    mode: RecordMode,
    normalizer: Normalizer,
    default_location: Option<PathBuf>,
    cache: Mutex<Option<EntryCache>>,
}

impl Recorder {
    /// Create a recorder with the default sensitive keys
    pub fn new(mode: RecordMode) -> Self {
        Self::with_normalizer(mode, Normalizer::default())
    }

    pub fn with_normalizer(mode: RecordMode, normalizer: Normalizer) -> Self {
        Self {
            mode,
            normalizer,
            default_location: None,
            cache: Mutex::new(None),
        }
    }

    /// Build from configuration; `REWIND_TEST_MODE` takes precedence over
    /// `recording.mode`
    pub fn from_config(config: &Config) -> RewindResult<Self> {
        let mode = RecordMode::from_env()?
            .or(config.recording.mode)
            .unwrap_or_default();
        let normalizer = Normalizer::new(config.recording.sensitive_keys.iter().cloned());
        debug!("Recorder running in {} mode", mode);

        Ok(Self {
            default_location: config.recording.location.clone(),
            ..Self::with_normalizer(mode, normalizer)
        })
    }

    /// Build from `REWIND_TEST_MODE` alone, defaulting to live
    pub fn from_env() -> RewindResult<Self> {
        Ok(Self::new(RecordMode::from_env()?.unwrap_or_default()))
    }

    pub fn mode(&self) -> RecordMode {
        self.mode
    }

    /// Bind a cache location
    ///
    /// In record and replay modes the first bind needs a path (explicit or
    /// from configuration); later binds to a different path switch location.
    /// In live mode the path is ignored.
    pub fn bind(&self, path: Option<&Path>) -> RewindResult<()> {
        let mut guard = self.lock();

        if !self.mode.uses_cache() {
            guard.get_or_insert_with(|| EntryCache::new(self.normalizer.clone()));
            return Ok(());
        }

        let path = match guard.as_ref() {
            Some(_) => path,
            None => path.or(self.default_location.as_deref()),
        };
        if guard.is_none() {
            if path.is_none() {
                return Err(RewindError::RecordFileMissing(
                    "record file path is not set".to_string(),
                ));
            }
            *guard = Some(EntryCache::new(self.normalizer.clone()));
        }

        if let (Some(cache), Some(path)) = (guard.as_mut(), path) {
            cache.bind_location(path)?;
        }
        Ok(())
    }

    /// Look up the recorded output for `input`
    ///
    /// Returns `Ok(None)` in live mode, where the caller always performs the
    /// real call.
    pub fn get(&self, input: &CallInput) -> RewindResult<Option<Output>> {
        if !self.mode.uses_cache() {
            return Ok(None);
        }
        self.lookup(input).map(Some)
    }

    /// Record `output` for `input`, returning a fresh copy to consume
    ///
    /// In live mode the output is handed back untouched.
    pub fn set(&self, input: &CallInput, output: Output) -> RewindResult<Output> {
        if !self.mode.uses_cache() {
            return Ok(output);
        }
        let mut guard = self.lock();
        let cache = guard.as_mut().ok_or_else(Self::unbound)?;
        cache.set(input, output)
    }

    /// Run one call under the mode contract
    ///
    /// `real` performs the call against the actual service. It is never
    /// invoked in replay mode, and in record mode only on a cache miss.
    pub fn call<F, E>(&self, input: &CallInput, real: F) -> Result<Output, E>
    where
        F: FnOnce() -> Result<Output, E>,
        E: From<RewindError>,
    {
        match self.mode {
            RecordMode::Live => real(),
            RecordMode::Replay => Ok(self.lookup(input)?),
            RecordMode::Record => match self.lookup(input) {
                Ok(output) => Ok(output),
                Err(e) if e.is_missing_record() => {
                    debug!("Cache miss, calling real service");
                    let output = real()?;
                    Ok(self.set(input, output)?)
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Currently bound location
    pub fn location(&self) -> Option<CacheLocation> {
        self.lock()
            .as_ref()
            .and_then(|cache| cache.location().cloned())
    }

    /// Delete the bound location's lock file; for cleanup between test runs
    pub fn delete_lock_file(&self) -> RewindResult<bool> {
        match self.lock().as_ref() {
            Some(cache) => cache.release_lock(),
            None => Ok(false),
        }
    }

    /// Drop the active cache so the next bind starts from scratch
    pub fn reset(&self) {
        *self.lock() = None;
    }

    /// Cache lookup regardless of mode
    fn lookup(&self, input: &CallInput) -> RewindResult<Output> {
        let guard = self.lock();
        let cache = guard.as_ref().ok_or_else(Self::unbound)?;
        cache.get(input)
    }

    fn lock(&self) -> MutexGuard<'_, Option<EntryCache>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unbound() -> RewindError {
        RewindError::RecordFileMissing("no cache location bound".to_string())
    }
}

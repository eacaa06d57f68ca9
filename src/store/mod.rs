//! On-disk record storage
//!
//! Each cache location holds a single record file plus a sibling lock file:
//!
//! ```text
//! <location>/.rewind/
//!   node_cache.db        SQLite key-value table: hash -> record JSON
//!   record_file.lock     exclusive lock, never holds content
//! ```
//!
//! Writes from different processes are serialized by the lock. In-memory
//! mirrors are loaded at bind time and are not refreshed by other processes'
//! writes until the location is bound again.

pub mod handle;
pub mod location;
pub mod lock;
pub mod sqlite;

pub use handle::StoreHandle;
pub use location::{CacheLocation, LOCK_FILE_NAME, STANDARD_RECORD_FOLDER, STANDARD_RECORD_NAME};
pub use lock::FileLock;
pub use sqlite::{RecordBackend, SqliteBackend};

use crate::record::Record;
use std::collections::HashMap;
use std::path::PathBuf;

/// Records of one location, keyed by hash
pub type RecordSlot = HashMap<String, Record>;

/// In-memory mirror: record file path to its records
pub type Mirrors = HashMap<PathBuf, RecordSlot>;

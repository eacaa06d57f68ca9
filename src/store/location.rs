//! Cache location resolution
//!
//! A caller-supplied path is normalized to the canonical record file: unless
//! it already names `node_cache.db`, the standard `.rewind/node_cache.db`
//! suffix is appended. Normalization is idempotent.

use crate::error::{RewindError, RewindResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Standard directory holding the record file
pub const STANDARD_RECORD_FOLDER: &str = ".rewind";

/// Standard record file name
pub const STANDARD_RECORD_NAME: &str = "node_cache.db";

/// Lock file guarding the record file, next to it
pub const LOCK_FILE_NAME: &str = "record_file.lock";

/// A resolved cache location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheLocation {
    file: PathBuf,
}

impl CacheLocation {
    /// Resolve `path` to the canonical record file
    pub fn resolve(path: impl AsRef<Path>) -> RewindResult<Self> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path)
            .map_err(|e| RewindError::io(format!("resolving {}", path.display()), e))?;

        let names_record_file = absolute
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(STANDARD_RECORD_NAME));

        let file = if names_record_file {
            absolute
        } else {
            absolute
                .join(STANDARD_RECORD_FOLDER)
                .join(STANDARD_RECORD_NAME)
        };

        Ok(Self { file })
    }

    /// Path of the record file
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Directory containing the record file
    pub fn dir(&self) -> &Path {
        self.file.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Path of the sibling lock file
    pub fn lock_file(&self) -> PathBuf {
        self.dir().join(LOCK_FILE_NAME)
    }

    /// Whether the record file has been created
    pub fn exists(&self) -> bool {
        self.file.is_file()
    }
}

impl fmt::Display for CacheLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())
    }
}

//! Error types for Rewind
//!
//! All modules use `RewindResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Rewind operations
pub type RewindResult<T> = Result<T, RewindError>;

/// All errors that can occur in Rewind
#[derive(Error, Debug)]
pub enum RewindError {
    // Record errors
    #[error("Record file missing: {0}")]
    RecordFileMissing(String),

    #[error("Record item not found in file {file}.\nhash: {hash}\nvalues: {input}")]
    RecordItemMissing {
        /// Content hash computed for the input
        hash: String,
        /// Serialized normalized input that produced the hash
        input: String,
        /// Record file that was searched
        file: String,
    },

    // Mode and input errors
    #[error("Invalid test mode '{0}': expected one of live, record, replay")]
    InvalidMode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Storage errors
    #[error("Failed to lock {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record store error: {0}")]
    Storage(#[from] rusqlite::Error),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl RewindError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a lock acquisition error
    pub fn lock(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Lock {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a cache miss for a specific input
    pub fn is_missing_record(&self) -> bool {
        matches!(self, Self::RecordItemMissing { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RecordItemMissing { .. } => {
                Some("Re-run with REWIND_TEST_MODE=record against the live service to capture it")
            }
            Self::RecordFileMissing(_) => Some("Pass a cache location before the first lookup"),
            Self::InvalidMode(_) => Some("Set REWIND_TEST_MODE to live, record or replay"),
            Self::Lock { .. } => Some("Check permissions on the cache directory"),
            _ => None,
        }
    }
}

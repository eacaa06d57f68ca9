//! Configuration schema for Rewind
//!
//! Configuration is stored at `~/.config/rewind/config.toml`, optionally
//! overridden per project by a `.rewind.toml`.

use crate::mode::RecordMode;
use crate::record::DEFAULT_SENSITIVE_KEYS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Record/replay settings
    pub recording: RecordingConfig,

    /// Usage counter settings
    pub counter: CounterConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Record/replay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Test mode used when REWIND_TEST_MODE is unset
    pub mode: Option<RecordMode>,

    /// Cache location bound when none is passed explicitly
    pub location: Option<PathBuf>,

    /// Input keys that never reach the hash or the record file
    pub sensitive_keys: Vec<String>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            mode: None,
            location: None,
            sensitive_keys: DEFAULT_SENSITIVE_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Usage counter settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Counter file used when none is passed explicitly
    pub path: Option<PathBuf>,
}

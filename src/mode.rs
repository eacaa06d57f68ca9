//! Test mode selection
//!
//! The mode is read once when a [`Recorder`](crate::Recorder) is built and
//! stays fixed for its lifetime.

use crate::error::{RewindError, RewindResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable selecting the test mode
pub const ENV_TEST_MODE: &str = "REWIND_TEST_MODE";

/// How calls to the external service are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordMode {
    /// Always call the real service; the cache is inert
    #[default]
    Live,
    /// Replay on hit, call the real service and capture its output on miss
    Record,
    /// Serve captured outputs only; a miss fails the call
    Replay,
}

impl RecordMode {
    /// Read the mode from `REWIND_TEST_MODE`
    ///
    /// Returns `Ok(None)` when the variable is unset or empty so callers can
    /// fall back to configuration.
    pub fn from_env() -> RewindResult<Option<Self>> {
        match std::env::var(ENV_TEST_MODE) {
            Ok(value) if !value.trim().is_empty() => value.parse().map(Some),
            _ => Ok(None),
        }
    }

    /// Whether outputs are served from the cache in this mode
    pub fn uses_cache(&self) -> bool {
        matches!(self, Self::Record | Self::Replay)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Record => "record",
            Self::Replay => "replay",
        }
    }
}

impl FromStr for RecordMode {
    type Err = RewindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "record" => Ok(Self::Record),
            "replay" => Ok(Self::Replay),
            other => Err(RewindError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for RecordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Rewind - record/replay cache for nondeterministic service calls
//!
//! Captures the outputs of external calls (model inference and the like)
//! keyed by a content hash of their inputs, so test runs can replay them
//! byte-for-byte without the real service.
//!
//! ```rust,no_run
//! use rewind::{CallInput, Output, RecordMode, Recorder, RewindError};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let recorder = Recorder::new(RecordMode::Record);
//! recorder.bind(Some(Path::new("tests/fixtures")))?;
//!
//! let input = CallInput::new().arg("prompt", "hi").opaque("connection", "client");
//! let _output = recorder.call(&input, || {
//!     Ok::<_, RewindError>(Output::scalar(json!("hello")))
//! })?;
//! # Ok::<(), RewindError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod counter;
pub mod error;
pub mod mode;
pub mod record;
pub mod recorder;
pub mod store;

pub use cache::EntryCache;
pub use counter::{UsageCount, UsageCounter};
pub use error::{RewindError, RewindResult};
pub use mode::{RecordMode, ENV_TEST_MODE};
pub use record::{Arg, CallInput, Output, OutputField, OutputKind, Record, StoredOutput};
pub use recorder::Recorder;
pub use store::{CacheLocation, StoreHandle};

//! Records: one stored input-hash to output mapping
//!
//! ```text
//! {
//!   "hash": "<sha256 of normalized input>",
//!   "input": { "prompt": "hi" },
//!   "output": { "kind": "stream", "value": ["a", "b", "c"] }
//! }
//! ```

pub mod input;
pub mod output;

pub use input::{Arg, CallInput, NormalizedInput, Normalizer, DEFAULT_SENSITIVE_KEYS};
pub use output::{Output, OutputField, OutputKind, OutputStream, StoredField, StoredOutput};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A recorded call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Content hash of `input`
    pub hash: String,

    /// Normalized call input
    pub input: Value,

    /// Stored output, tagged with its kind
    pub output: StoredOutput,
}

impl Record {
    pub fn new(hash: String, input: &NormalizedInput, output: StoredOutput) -> Self {
        Self {
            hash,
            input: input.to_value(),
            output,
        }
    }

    pub fn output_kind(&self) -> OutputKind {
        self.output.kind()
    }

    /// Whether re-recording `output` would change this record
    pub fn differs_from(&self, output: &StoredOutput) -> bool {
        &self.output != output
    }
}

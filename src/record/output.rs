//! Output normalization and replay reconstruction
//!
//! Streams cannot be persisted as-is, so they are drained into concrete
//! sequences for storage. Every replay builds a fresh one-shot stream over
//! the stored sequence; iterator state is never shared between calls.
//!
//! Outputs are assumed to be a scalar, a mapping of scalars and streams, or a
//! single top-level stream. Streams nested deeper than one mapping level are
//! not drained.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A lazily produced, one-directional sequence of output items
pub type OutputStream = Box<dyn Iterator<Item = Value> + Send>;

/// Raw output of one call, as produced by the real service or by replay
pub enum Output {
    /// A plain value
    Scalar(Value),
    /// A mapping whose fields are values or streams
    Map(BTreeMap<String, OutputField>),
    /// A single top-level stream
    Stream(OutputStream),
}

/// One field of a mapping output
pub enum OutputField {
    Scalar(Value),
    Stream(OutputStream),
}

impl Output {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Self::Scalar(value.into())
    }

    /// Wrap any iterator of values as a stream output
    pub fn stream<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self::Stream(Box::new(items.into_iter()))
    }

    /// Drain every stream into a storable form
    pub fn drain(self) -> StoredOutput {
        match self {
            Self::Scalar(value) => StoredOutput::Scalar(value),
            Self::Stream(stream) => StoredOutput::Stream(stream.collect()),
            Self::Map(fields) => StoredOutput::DictOfStreams(
                fields
                    .into_iter()
                    .map(|(key, field)| (key, field.drain()))
                    .collect(),
            ),
        }
    }

    /// Consume the output into a single JSON value, streams becoming arrays
    pub fn into_value(self) -> Value {
        self.drain().into_value()
    }

    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Scalar(_) => OutputKind::Scalar,
            Self::Map(_) => OutputKind::DictOfStreams,
            Self::Stream(_) => OutputKind::Stream,
        }
    }
}

impl OutputField {
    pub fn stream<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self::Stream(Box::new(items.into_iter()))
    }

    fn drain(self) -> StoredField {
        match self {
            Self::Scalar(value) => StoredField::Scalar(value),
            Self::Stream(stream) => StoredField::Stream(stream.collect()),
        }
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<Value> for OutputField {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
            Self::Map(fields) => f.debug_tuple("Map").field(fields).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl fmt::Debug for OutputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Discriminant of a stored output, dictating how replay rebuilds it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    Scalar,
    DictOfStreams,
    Stream,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::DictOfStreams => write!(f, "dict-of-streams"),
            Self::Stream => write!(f, "stream"),
        }
    }
}

/// Persisted form of an output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum StoredOutput {
    Scalar(Value),
    DictOfStreams(BTreeMap<String, StoredField>),
    Stream(Vec<Value>),
}

/// Persisted form of one mapping field; `Stream` marks a sequence that must
/// be replayed as a fresh one-shot stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum StoredField {
    Scalar(Value),
    Stream(Vec<Value>),
}

impl StoredOutput {
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Scalar(_) => OutputKind::Scalar,
            Self::DictOfStreams(_) => OutputKind::DictOfStreams,
            Self::Stream(_) => OutputKind::Stream,
        }
    }

    /// Build an independently consumable output
    pub fn materialize(&self) -> Output {
        match self {
            Self::Scalar(value) => Output::Scalar(value.clone()),
            Self::Stream(items) => Output::stream(items.clone()),
            Self::DictOfStreams(fields) => Output::Map(
                fields
                    .iter()
                    .map(|(key, field)| {
                        let field = match field {
                            StoredField::Scalar(value) => OutputField::Scalar(value.clone()),
                            StoredField::Stream(items) => OutputField::stream(items.clone()),
                        };
                        (key.clone(), field)
                    })
                    .collect(),
            ),
        }
    }

    /// Countable units carried by this output
    ///
    /// A stream counts its drained items and a mapping holding at least one
    /// stream counts its fields. A scalar counts its `usage.total_tokens`
    /// field when present. Anything else counts zero.
    pub fn usage_units(&self) -> u64 {
        match self {
            Self::Stream(items) => items.len() as u64,
            Self::DictOfStreams(fields) => {
                let has_stream = fields
                    .values()
                    .any(|field| matches!(field, StoredField::Stream(_)));
                if has_stream {
                    fields.len() as u64
                } else {
                    0
                }
            }
            Self::Scalar(value) => value
                .pointer("/usage/total_tokens")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Scalar(value) => value,
            Self::Stream(items) => Value::Array(items),
            Self::DictOfStreams(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, field)| {
                        let value = match field {
                            StoredField::Scalar(value) => value,
                            StoredField::Stream(items) => Value::Array(items),
                        };
                        (key, value)
                    })
                    .collect(),
            ),
        }
    }
}

//! Call input normalization and content hashing
//!
//! Inputs are normalized into a JSON mapping before hashing: sequences
//! recurse element-wise, maps recurse over values and drop sensitive keys,
//! and opaque arguments (live connections, in-memory handles) collapse to an
//! empty array so they never reach the hash or the record file.

use crate::error::{RewindError, RewindResult};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Keys dropped from every mapping before hashing or persisting
pub const DEFAULT_SENSITIVE_KEYS: &[&str] = &["extra_headers"];

/// A single call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Plain serializable value
    Value(Value),
    /// Tuple or ordered sequence
    List(Vec<Arg>),
    /// Key-value mapping
    Map(Vec<(String, Arg)>),
    /// Live connection or other object that is not stable across runs
    Opaque(String),
}

impl Arg {
    /// Tag an argument as opaque
    pub fn opaque(label: impl Into<String>) -> Self {
        Self::Opaque(label.into())
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(items: Vec<Arg>) -> Self {
        Self::List(items)
    }
}

/// The named arguments of one call to the external service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallInput {
    args: Vec<(String, Arg)>,
}

impl CallInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named argument; a later argument with the same name wins
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.args.push((name.into(), value.into()));
        self
    }

    /// Add an argument that must not influence the hash
    pub fn opaque(self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.arg(name, Arg::opaque(label))
    }

    /// Build an input from a JSON object
    pub fn from_json(value: Value) -> RewindResult<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                args: map.into_iter().map(|(k, v)| (k, Arg::Value(v))).collect(),
            }),
            other => Err(RewindError::InvalidInput(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn args(&self) -> &[(String, Arg)] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Normalized form of a call input, ready for hashing and storage
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput(Map<String, Value>);

impl NormalizedInput {
    /// Content hash: SHA-256 over the key-sorted `[key, value]` pairs in
    /// canonical JSON form
    pub fn hash(&self) -> RewindResult<String> {
        let mut pairs: Vec<(&String, &Value)> = self.0.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        let canonical = serde_jcs::to_string(&pairs)?;

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Human-readable dump used in miss diagnostics
    pub fn dump(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Applies the input normalization rules
#[derive(Debug, Clone)]
pub struct Normalizer {
    sensitive_keys: BTreeSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_KEYS.iter().copied())
    }
}

impl Normalizer {
    pub fn new<I, S>(sensitive_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sensitive_keys: sensitive_keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        self.sensitive_keys.contains(key)
    }

    pub fn normalize(&self, input: &CallInput) -> NormalizedInput {
        let mut map = Map::new();
        for (key, arg) in &input.args {
            if self.is_sensitive(key) {
                continue;
            }
            map.insert(key.clone(), self.normalize_arg(arg));
        }
        NormalizedInput(map)
    }

    fn normalize_arg(&self, arg: &Arg) -> Value {
        match arg {
            Arg::Value(value) => self.normalize_value(value),
            Arg::List(items) => Value::Array(items.iter().map(|i| self.normalize_arg(i)).collect()),
            Arg::Map(entries) => Value::Object(
                entries
                    .iter()
                    .filter(|(k, _)| !self.is_sensitive(k))
                    .map(|(k, v)| (k.clone(), self.normalize_arg(v)))
                    .collect(),
            ),
            Arg::Opaque(_) => Value::Array(Vec::new()),
        }
    }

    fn normalize_value(&self, value: &Value) -> Value {
        match value {
            Value::Array(items) => {
                Value::Array(items.iter().map(|i| self.normalize_value(i)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(k, _)| !self.is_sensitive(k))
                    .map(|(k, v)| (k.clone(), self.normalize_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

//! The filled data container: values keyed by parameter/field id.
//!
//! `FilledData` follows an immutable-update discipline. `set` returns a new
//! container and leaves the receiver untouched, so a view layer can detect a
//! change by comparing the old and new values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scalar value entered for one parameter or field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Interpret the value as a number.
    ///
    /// Text is accepted when it parses as a float after trimming; a decimal
    /// comma is tolerated. Booleans and blank text are never numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Number(_) | FieldValue::Bool(_) => None,
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed
                    .replace(',', ".")
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
            }
        }
    }

    /// True for blank text. Booleans and numbers always count as filled.
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Read a scalar JSON value. Arrays, objects and null yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// A mapping from stable parameter/field id to the value entered for it.
///
/// Entries are stored as raw JSON so that legacy payloads (for example an
/// analysis result's `rows` array) survive normalization untouched.
/// [`FilledData::get`] only ever yields scalars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilledData {
    entries: BTreeMap<String, Value>,
}

impl FilledData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a container from a JSON object's entries.
    pub fn from_object(object: &serde_json::Map<String, Value>) -> Self {
        Self {
            entries: object.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// The scalar value stored under `id`, if any.
    pub fn get(&self, id: &str) -> Option<FieldValue> {
        self.entries.get(id).and_then(FieldValue::from_json)
    }

    /// The raw JSON stored under `key`, scalar or not.
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Return a new container with `id` set to `value`. Other keys are kept.
    #[must_use]
    pub fn set(&self, id: impl Into<String>, value: FieldValue) -> Self {
        self.set_raw(id, value.to_json())
    }

    /// Return a new container with `key` set to an arbitrary JSON value.
    #[must_use]
    pub fn set_raw(&self, key: impl Into<String>, value: Value) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(key.into(), value);
        Self { entries }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

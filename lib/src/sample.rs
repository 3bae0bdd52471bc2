//! Observations and group keys.
//!
//! A [`Sample`] is one observation from the stream: a bag of named, dynamically
//! typed [`Value`]s. Transformers pull their group [`Key`] and their numeric
//! inputs out of it by field name.

use crate::feature_extraction::error::FeatureError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Numeric view of the value. Booleans count as 0/1, strings have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Str(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x as f64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// One observation: field name to value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample {
    fields: HashMap<String, Value>,
}

impl Sample {
    /// Create an empty sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a sample from a flat JSON object such as `{"user": "a", "amount": 3.5}`.
    pub fn from_json(json: &str) -> Result<Self, FeatureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the group key from the given fields, in order.
    pub fn key(&self, fields: &[String]) -> Result<Key, FeatureError> {
        fields
            .iter()
            .map(|field| {
                self.get(field)
                    .map(KeyPart::from)
                    .ok_or_else(|| FeatureError::missing(field))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Key)
    }

    /// Numeric value of a field.
    pub fn number(&self, field: &str) -> Result<f64, FeatureError> {
        match self.get(field) {
            None => Err(FeatureError::missing(field)),
            Some(value) => value.as_f64().ok_or_else(|| FeatureError::NonNumericField {
                field: field.to_string(),
            }),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Sample {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut sample = Sample::new();
        for (name, value) in iter {
            sample.insert(name, value);
        }
        sample
    }
}

/// Hashable image of a [`Value`].
///
/// Integral floats fold onto `Int` so that `3` and `3.0` land in the same
/// group. Other floats compare by bit pattern, with `-0.0` folded onto `0.0`
/// and every NaN folded onto one canonical NaN.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPart {
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(String),
}

const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl From<&Value> for KeyPart {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(b) => KeyPart::Bool(*b),
            Value::Int(i) => KeyPart::Int(*i),
            Value::Str(s) => KeyPart::Str(s.clone()),
            Value::Float(x) => {
                if x.fract() == 0.0 && *x >= -I64_BOUND && *x < I64_BOUND {
                    KeyPart::Int(*x as i64)
                } else if x.is_nan() {
                    KeyPart::Float(f64::NAN.to_bits())
                } else {
                    KeyPart::Float(x.to_bits())
                }
            }
        }
    }
}

/// Ordered tuple of key parts identifying one group.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(Vec<KeyPart>);

impl Key {
    /// Build a key directly from values, in key-field order.
    pub fn from_values<V: Into<Value> + Clone>(values: &[V]) -> Self {
        Key(values
            .iter()
            .map(|v| KeyPart::from(&v.clone().into()))
            .collect())
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

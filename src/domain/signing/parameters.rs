//! Parameter sets exchanged with the gateway.
//!
//! Keys are kept in a `BTreeMap`, so iteration order is the lexicographic
//! order of the raw key bytes regardless of insertion order.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::domain::foundation::ValidationError;

/// Key carrying the signature. Never part of the signed base string.
pub const SIGNATURE_KEY: &str = "s";

/// Scalar value of a signed parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(i64::from(value))
    }
}

/// Unordered mapping from parameter name to scalar value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style insert that skips `None`.
    pub fn with_optional<V: Into<ParamValue>>(
        mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Removes a value, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.remove(key)
    }

    /// Looks up a value.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Looks up a value rendered as text.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(ToString::to_string)
    }

    /// The attached signature, if any.
    pub fn signature(&self) -> Option<String> {
        self.get_text(SIGNATURE_KEY)
    }

    /// Entries in canonical (byte-sorted) key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders every entry as a string pair for form or query encoding.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Builds a set from decoded form fields. All values are kept as text.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (k, v) in pairs {
            set.insert(k.into(), ParamValue::Text(v.into()));
        }
        set
    }

    /// Builds a set from a flat JSON object.
    ///
    /// Integers stay integers, booleans and floats use their JSON text,
    /// nulls are dropped. Nested arrays or objects are rejected.
    pub fn from_json_object(value: &Value) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::invalid_format("payload", "expected a JSON object"))?;

        let mut set = Self::new();
        for (key, value) in object {
            match value {
                Value::Null => {}
                Value::String(s) => set.insert(key.clone(), s.clone()),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => set.insert(key.clone(), i),
                    None => set.insert(key.clone(), n.to_string()),
                },
                Value::Bool(b) => set.insert(key.clone(), b.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ValidationError::invalid_format(
                        key.clone(),
                        "nested values are not signable",
                    ))
                }
            }
        }
        Ok(set)
    }
}

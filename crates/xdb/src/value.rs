//! Loosely-typed result containers.
//!
//! A [`Value`] is one column's raw bytes as the driver produced them; typed
//! accessors parse on demand and fall back to the type's zero value. A [`Row`]
//! maps column names to values.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

/// Raw bytes of a single column. `NULL` is kept distinct from an empty value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Value(Option<Bytes>);

impl Value {
    /// A SQL `NULL`.
    pub const fn null() -> Self {
        Value(None)
    }

    /// Wrap raw column bytes.
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Value(Some(raw.into()))
    }

    /// Build from an optional byte buffer (`None` is `NULL`).
    pub fn from_raw(raw: Option<Bytes>) -> Self {
        Value(raw)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Raw bytes; empty for `NULL`.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_deref().unwrap_or_default()
    }

    /// Raw bytes, `None` for `NULL`.
    pub fn raw(&self) -> Option<&[u8]> {
        self.0.as_deref()
    }

    /// Text form. Invalid UTF-8 yields an empty string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    /// Decimal integer, 0 when unparsable.
    pub fn as_i64(&self) -> i64 {
        self.as_str().parse().unwrap_or_default()
    }

    /// Decimal unsigned integer, 0 when unparsable.
    pub fn as_u64(&self) -> u64 {
        self.as_str().parse().unwrap_or_default()
    }

    /// Decimal or scientific float, 0.0 when unparsable.
    pub fn as_f64(&self) -> f64 {
        self.as_str().parse().unwrap_or_default()
    }

    /// Textual boolean, false when unparsable.
    pub fn as_bool(&self) -> bool {
        crate::decode::parse_bool(self.as_bytes()).unwrap_or_default()
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        self.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::new(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::new(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}

/// One result row keyed by column name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Set (or replace) the value of a column.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.values.insert(column.into(), value);
    }

    /// Whether the row carries the column.
    pub fn has(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn from_columns(columns: &[String], values: Vec<Value>) -> Self {
        Self {
            values: columns.iter().cloned().zip(values).collect(),
        }
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

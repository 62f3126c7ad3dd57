//! Field values for schema-on-read records.
//!
//! Source records arrive as untyped JSON. Transformation needs a slightly
//! richer vocabulary than JSON offers (integers distinct from floats, and a
//! timestamp type), so records are converted to [`FieldValue`] on entry and
//! to BSON on the way out.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mongodb::bson::{self, Bson, Document};

/// A single field value inside a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// JSON null.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integral number.
    Int(i64),

    /// Non-integral (or out of i64 range, NaN, infinite) number.
    Float(f64),

    /// Text value.
    Text(String),

    /// Parsed timestamp.
    DateTime(DateTime<Utc>),

    /// Multi-valued field.
    Array(Vec<FieldValue>),

    /// Nested object.
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Build a numeric value, preferring the integer form when exact.
    pub fn number(n: f64) -> Self {
        // 2^63 is exactly representable; everything strictly below fits in i64.
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        if n.is_finite() && n.fract() == 0.0 && n >= -LIMIT && n < LIMIT {
            FieldValue::Int(n as i64)
        } else {
            FieldValue::Float(n)
        }
    }

    /// Borrow the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert to BSON for the document store.
    pub fn to_bson(&self) -> Bson {
        match self {
            FieldValue::Null => Bson::Null,
            FieldValue::Bool(b) => Bson::Boolean(*b),
            FieldValue::Int(i) => Bson::Int64(*i),
            FieldValue::Float(f) => Bson::Double(*f),
            FieldValue::Text(s) => Bson::String(s.clone()),
            FieldValue::DateTime(dt) => {
                Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis()))
            }
            FieldValue::Array(items) => Bson::Array(items.iter().map(FieldValue::to_bson).collect()),
            FieldValue::Object(map) => {
                let mut doc = Document::new();
                for (k, v) in map {
                    doc.insert(k.clone(), v.to_bson());
                }
                Bson::Document(doc)
            }
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::Array(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Object(
                map.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

//! Scalar field values

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A single field value of a record.
///
/// This is the raw, dialect-independent form. Turning a `Value` into SQL
/// literal text is the job of the coercer in `rowpack-engine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// Timestamp with time zone, normalized to UTC
    TimestampTz(DateTime<Utc>),
    Uuid(Uuid),
    /// Arbitrary JSON document
    Json(JsonValue),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Uuid(_) => "uuid",
            Value::Json(JsonValue::Array(_)) => "json array",
            Value::Json(JsonValue::Object(_)) => "json object",
            Value::Json(_) => "json scalar",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Json(JsonValue::Null))
    }

    /// Text content, if this value is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Json(JsonValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Numeric content widened to `f64`, if this value is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Json(JsonValue::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Convert a JSON value into the closest scalar `Value`.
    ///
    /// Arrays and objects stay as `Value::Json`; so do numbers that fit
    /// neither `i64` nor `f64` exactly, preserving their textual form.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::String(s) => Value::Text(s),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.is_f64() {
                    n.as_f64().map(Value::Float).unwrap_or(Value::Json(JsonValue::Number(n)))
                } else {
                    Value::Json(JsonValue::Number(n))
                }
            }
            other => Value::Json(other),
        }
    }

    /// Convert this value into a JSON document.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Bytes(b) => JsonValue::Array(b.iter().map(|x| JsonValue::from(*x)).collect()),
            Value::Date(d) => JsonValue::String(d.to_string()),
            Value::Timestamp(ts) => JsonValue::String(ts.to_string()),
            Value::TimestampTz(ts) => JsonValue::String(ts.to_rfc3339()),
            Value::Uuid(u) => JsonValue::String(u.to_string()),
            Value::Json(j) => j.clone(),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Uuid => Uuid,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Value::from_json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

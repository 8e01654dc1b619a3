//! Value Coercer
//!
//! Turns a [`Value`] into PostgreSQL literal text. Every literal produced here
//! is safe to splice into a statement: text is quoted and escaped, and values
//! that have no faithful literal form are rejected instead of stringified.

use rowpack_core::{ColumnMeta, SqlType, StatementError, Value};
use serde_json::Value as JsonValue;

/// Placeholder column name for errors raised by [`coerce`].
const ANONYMOUS_COLUMN: &str = "<value>";

/// Coerce a value without column type information.
pub fn coerce(value: &Value) -> Result<String, StatementError> {
    coerce_value(value, ANONYMOUS_COLUMN, None)
}

/// Coerce a value for a specific table column, honoring its declared type.
pub fn coerce_for(value: &Value, column: &ColumnMeta) -> Result<String, StatementError> {
    coerce_value(value, &column.name, Some(&column.sql_type))
}

fn coerce_value(
    value: &Value,
    column: &str,
    sql_type: Option<&SqlType>,
) -> Result<String, StatementError> {
    if value.is_null() {
        return Ok("NULL".to_string());
    }

    if sql_type.is_some_and(SqlType::is_json) {
        return match value {
            Value::Float(f) if !f.is_finite() => Err(unsupported(
                column,
                value,
                "non-finite floats have no JSON representation".to_string(),
            )),
            Value::Bytes(_) => Err(unsupported(
                column,
                value,
                "bytes have no JSON representation".to_string(),
            )),
            _ => quote_text(&value.to_json().to_string(), column),
        };
    }

    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(true) => Ok("TRUE".to_string()),
        Value::Bool(false) => Ok("FALSE".to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => coerce_float(*f, column, sql_type),
        Value::Text(s) => quote_text(s, column),
        Value::Bytes(bytes) => match sql_type {
            None | Some(SqlType::Bytea) | Some(SqlType::Other(_)) => {
                Ok(format!("E'\\\\x{}'", hex::encode(bytes)))
            }
            Some(other) => Err(unsupported(
                column,
                value,
                format!("bytes cannot be stored in a {:?} column", other),
            )),
        },
        Value::Date(d) => Ok(quote_plain(&d.format("%Y-%m-%d").to_string())),
        Value::Timestamp(ts) => Ok(quote_plain(
            &ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        )),
        Value::TimestampTz(ts) => Ok(quote_plain(&ts.to_rfc3339())),
        Value::Uuid(u) => Ok(quote_plain(&u.hyphenated().to_string())),
        Value::Json(JsonValue::Number(n)) => Ok(n.to_string()),
        Value::Json(JsonValue::Array(_)) | Value::Json(JsonValue::Object(_)) => Err(unsupported(
            column,
            value,
            "json documents require a json or jsonb column".to_string(),
        )),
        Value::Json(scalar) => coerce_value(&Value::from_json(scalar.clone()), column, sql_type),
    }
}

fn coerce_float(f: f64, column: &str, sql_type: Option<&SqlType>) -> Result<String, StatementError> {
    if f.is_finite() {
        return Ok(format!("{}", f));
    }
    if !sql_type.is_some_and(SqlType::accepts_non_finite) {
        return Err(unsupported(
            column,
            &Value::Float(f),
            "non-finite floats require a float or numeric column".to_string(),
        ));
    }
    let literal = if f.is_nan() {
        "NaN"
    } else if f > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    };
    Ok(quote_plain(literal))
}

/// Quote text as a string literal.
///
/// Embedded quotes are doubled. Text containing a backslash is emitted as an
/// `E'...'` escape string with the backslashes doubled, which reads the same
/// whatever `standard_conforming_strings` is set to.
fn quote_text(s: &str, column: &str) -> Result<String, StatementError> {
    if s.contains('\0') {
        return Err(StatementError::UnsupportedType {
            column: column.to_string(),
            value_type: "text".to_string(),
            reason: "text contains a NUL byte".to_string(),
        });
    }
    if s.contains('\\') {
        Ok(format!("E'{}'", s.replace('\\', "\\\\").replace('\'', "''")))
    } else {
        Ok(quote_plain(s))
    }
}

/// Quote text known to contain no backslash or NUL.
fn quote_plain(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote an identifier, doubling embedded double quotes.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn unsupported(column: &str, value: &Value, reason: String) -> StatementError {
    StatementError::UnsupportedType {
        column: column.to_string(),
        value_type: value.type_name().to_string(),
        reason,
    }
}

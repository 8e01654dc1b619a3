//! Validator Filter
//!
//! Validation is an explicit strategy passed in by the caller. The filter
//! only consults it when the call asks for validation.

use rowpack_core::{Row, ValidationError, Value};
use serde_json::Value as JsonValue;
use std::fmt;

/// Decides whether a row may be inserted.
pub trait Validator: Send + Sync {
    fn validate(&self, row: &Row) -> Result<(), ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&Row) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, row: &Row) -> Result<(), ValidationError> {
        self(row)
    }
}

type CustomCheck = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

enum Rule {
    Presence(String),
    Length {
        field: String,
        min: Option<usize>,
        max: Option<usize>,
    },
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    Inclusion {
        field: String,
        allowed: Vec<String>,
    },
    Custom {
        field: String,
        check: CustomCheck,
    },
}

/// Blank values fail `presence`: whitespace-only text, `false`, empty bytes,
/// and empty JSON arrays or objects.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Bytes(bytes) => bytes.is_empty(),
        Value::Json(JsonValue::Array(items)) => items.is_empty(),
        Value::Json(JsonValue::Object(map)) => map.is_empty(),
        other => other.as_str().is_some_and(|s| s.trim().is_empty()),
    }
}

impl Rule {
    fn field(&self) -> &str {
        match self {
            Rule::Presence(field)
            | Rule::Length { field, .. }
            | Rule::Range { field, .. }
            | Rule::Inclusion { field, .. }
            | Rule::Custom { field, .. } => field,
        }
    }

    fn check(&self, row: &Row) -> Result<(), ValidationError> {
        let value = row.get(self.field()).filter(|v| !v.is_null());

        match self {
            Rule::Presence(field) => {
                if value.map_or(true, is_blank) {
                    return Err(ValidationError::RequiredFieldMissing {
                        field: field.clone(),
                    });
                }
            }
            Rule::Length { field, min, max } => {
                if let Some(s) = value.and_then(Value::as_str) {
                    let length = s.chars().count();
                    if min.is_some_and(|m| length < m) || max.is_some_and(|m| length > m) {
                        return Err(ValidationError::InvalidLength {
                            field: field.clone(),
                            length,
                            min: *min,
                            max: *max,
                        });
                    }
                }
            }
            Rule::Range { field, min, max } => {
                if let Some(v) = value {
                    let in_range = v.as_f64().is_some_and(|n| {
                        !min.is_some_and(|m| n < m) && !max.is_some_and(|m| n > m)
                    });
                    if !in_range {
                        return Err(ValidationError::OutOfRange {
                            field: field.clone(),
                            value: v.to_json().to_string(),
                        });
                    }
                }
            }
            Rule::Inclusion { field, allowed } => {
                if let Some(v) = value {
                    if !v.as_str().is_some_and(|s| allowed.iter().any(|a| a == s)) {
                        return Err(ValidationError::NotIncluded {
                            field: field.clone(),
                            value: v.to_json().to_string(),
                        });
                    }
                }
            }
            Rule::Custom { field, check } => {
                if let Some(v) = value {
                    check(v).map_err(|reason| ValidationError::Custom {
                        field: field.clone(),
                        reason,
                    })?;
                }
            }
        }
        Ok(())
    }
}

/// Declarative validation rules attached to a record type.
///
/// Apart from `presence`, rules skip fields that are absent or `NULL`.
/// A rule set with no rules accepts every row.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The field must be present, non-null, and not blank. Whitespace-only
    /// text, `false`, empty bytes, and empty JSON arrays or objects are blank.
    pub fn presence(mut self, field: impl Into<String>) -> Self {
        self.rules.push(Rule::Presence(field.into()));
        self
    }

    /// Text length, in characters, must fall within the bounds.
    pub fn length(mut self, field: impl Into<String>, min: Option<usize>, max: Option<usize>) -> Self {
        self.rules.push(Rule::Length {
            field: field.into(),
            min,
            max,
        });
        self
    }

    /// Numeric value must fall within the bounds; non-numeric values fail.
    pub fn range(mut self, field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        self.rules.push(Rule::Range {
            field: field.into(),
            min,
            max,
        });
        self
    }

    /// Text value must be one of `allowed`.
    pub fn inclusion<I, S>(mut self, field: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(Rule::Inclusion {
            field: field.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn custom<F>(mut self, field: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rules.push(Rule::Custom {
            field: field.into(),
            check: Box::new(check),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("fields", &self.rules.iter().map(Rule::field).collect::<Vec<_>>())
            .finish()
    }
}

impl Validator for RuleSet {
    /// Reports the first failing rule.
    fn validate(&self, row: &Row) -> Result<(), ValidationError> {
        self.rules.iter().try_for_each(|rule| rule.check(row))
    }
}

/// Rows left after validation, plus how many were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub valid: Vec<Row>,
    pub invalid_count: usize,
}

/// Drop rows the validator rejects.
///
/// With `validate == false` every row is kept and the validator is never
/// consulted.
pub fn filter(rows: Vec<Row>, validate: bool, validator: &dyn Validator) -> FilterOutcome {
    if !validate {
        return FilterOutcome {
            valid: rows,
            invalid_count: 0,
        };
    }

    let total = rows.len();
    let valid: Vec<Row> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match validator.validate(&row) {
            Ok(()) => Some(row),
            Err(error) => {
                tracing::debug!(index, %error, "Skipping invalid record");
                None
            }
        })
        .collect();

    FilterOutcome {
        invalid_count: total - valid.len(),
        valid,
    }
}

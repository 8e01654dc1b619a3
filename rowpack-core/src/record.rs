//! Rows and the record abstraction
//!
//! Callers hand the engine either raw mappings or structured objects. Both
//! are normalized exactly once, through [`Record::to_row`], into a [`Row`];
//! nothing downstream branches on the input shape.

use crate::{RecordError, RowpackResult, Value};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

// ============================================================================
// ROW
// ============================================================================

/// Ordered mapping of column name to value.
///
/// Keys keep their first insertion position; inserting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((column, value));
                None
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(name, _)| name == column)?;
        Some(self.fields.remove(idx).1)
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// Anything that can be persisted as one table row.
pub trait Record {
    /// Produce the column name to value mapping for this record.
    fn to_row(&self) -> RowpackResult<Row>;
}

impl Record for Row {
    fn to_row(&self) -> RowpackResult<Row> {
        Ok(self.clone())
    }
}

impl Record for BTreeMap<String, Value> {
    fn to_row(&self) -> RowpackResult<Row> {
        Ok(self.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl Record for Map<String, JsonValue> {
    fn to_row(&self) -> RowpackResult<Row> {
        Ok(self
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v.clone())))
            .collect())
    }
}

impl Record for JsonValue {
    fn to_row(&self) -> RowpackResult<Row> {
        match self {
            JsonValue::Object(map) => map.to_row(),
            _ => Err(RecordError::NotAnObject {
                type_name: "serde_json::Value".to_string(),
            }
            .into()),
        }
    }
}

impl<T: Record + ?Sized> Record for &T {
    fn to_row(&self) -> RowpackResult<Row> {
        (**self).to_row()
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn to_row(&self) -> RowpackResult<Row> {
        (**self).to_row()
    }
}

/// Structured object whose serde representation supplies its attributes.
///
/// The wrapped value must serialize to a map. `None` fields become `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes<T>(pub T);

impl<T: Serialize> Record for Attributes<T> {
    fn to_row(&self) -> RowpackResult<Row> {
        let json = serde_json::to_value(&self.0).map_err(|e| RecordError::Serialization {
            reason: e.to_string(),
        })?;
        match json {
            JsonValue::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect()),
            _ => Err(RecordError::NotAnObject {
                type_name: std::any::type_name::<T>().to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RowpackError;
    use serde_json::json;

    #[derive(Serialize)]
    struct Person {
        name: String,
        age: Option<i32>,
    }

    #[test]
    fn test_row_insert_keeps_first_position() {
        let mut row = Row::new().with("name", "Foo").with("age", 30);
        let previous = row.insert("name", "Bar");
        assert_eq!(previous, Some(Value::Text("Foo".to_string())));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(row.get("name"), Some(&Value::Text("Bar".to_string())));
    }

    #[test]
    fn test_row_remove() {
        let mut row = Row::new().with("id", 1).with("name", "Foo");
        assert_eq!(row.remove("id"), Some(Value::Int(1)));
        assert!(!row.contains("id"));
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_json_map_record() {
        let record = json!({"name": "Foo", "age": 30});
        let row = record.to_row().unwrap();
        assert_eq!(row.get("age"), Some(&Value::Int(30)));
        assert_eq!(row.get("name"), Some(&Value::Text("Foo".to_string())));
    }

    #[test]
    fn test_json_non_object_rejected() {
        let result = json!([1, 2]).to_row();
        assert!(matches!(
            result,
            Err(RowpackError::Record(RecordError::NotAnObject { .. }))
        ));
    }

    #[test]
    fn test_attributes_record() {
        let person = Attributes(Person {
            name: "Foo".to_string(),
            age: None,
        });
        let row = person.to_row().unwrap();
        assert_eq!(row.get("name"), Some(&Value::Text("Foo".to_string())));
        assert_eq!(row.get("age"), Some(&Value::Null));
    }

    #[test]
    fn test_attributes_non_map_rejected() {
        let result = Attributes(42u32).to_row();
        assert!(matches!(
            result,
            Err(RowpackError::Record(RecordError::NotAnObject { .. }))
        ));
    }

    #[test]
    fn test_boxed_dyn_records_mix() {
        let records: Vec<Box<dyn Record>> = vec![
            Box::new(Row::new().with("name", "A")),
            Box::new(Attributes(Person {
                name: "B".to_string(),
                age: Some(4),
            })),
        ];
        let rows: Vec<Row> = records.iter().map(|r| r.to_row().unwrap()).collect();
        assert_eq!(rows[0].get("name"), Some(&Value::Text("A".to_string())));
        assert_eq!(rows[1].get("age"), Some(&Value::Int(4)));
    }
}

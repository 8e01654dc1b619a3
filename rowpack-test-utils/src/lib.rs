//! ROWPACK Test Utilities
//!
//! Centralized test infrastructure for the ROWPACK workspace:
//! - Proptest generators for values and rows
//! - Test fixtures for the `sample_records` table
//! - Custom assertions for generated SQL and errors

// Re-export test doubles from their source crate
pub use rowpack_storage::{count_value_tuples, MockExecutor, StaticCatalog};

// Re-export core types for convenience
pub use rowpack_core::{
    Attributes, ColumnMeta, InsertOptions, OnConflict, Record, Row, RowpackError, RowpackResult,
    SqlType, StatementError, StorageError, TableMetadata, Value,
};

use serde::Serialize;

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Common test data.

    use super::*;

    /// Name of the fixture table.
    pub const SAMPLE_TABLE: &str = "sample_records";

    /// `sample_records (id serial primary key, name text, age integer,
    /// created_at timestamptz, updated_at timestamptz)`
    pub fn sample_records_table() -> TableMetadata {
        TableMetadata::new(SAMPLE_TABLE)
            .with_column(
                ColumnMeta::new("id", SqlType::Integer)
                    .not_null()
                    .with_default(),
            )
            .with_column(ColumnMeta::new("name", SqlType::Text))
            .with_column(ColumnMeta::new("age", SqlType::Integer))
            .with_column(ColumnMeta::new("created_at", SqlType::TimestampTz))
            .with_column(ColumnMeta::new("updated_at", SqlType::TimestampTz))
            .with_primary_key("id")
    }

    /// Catalog containing only the fixture table.
    pub fn sample_catalog() -> StaticCatalog {
        StaticCatalog::new().with_table(sample_records_table())
    }

    /// Structured record for the fixture table.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct SampleRecord {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub id: Option<i64>,
        pub name: Option<String>,
        pub age: i32,
    }

    impl SampleRecord {
        pub fn new(name: impl Into<String>, age: i32) -> Self {
            Self {
                id: None,
                name: Some(name.into()),
                age,
            }
        }

        pub fn with_id(mut self, id: i64) -> Self {
            self.id = Some(id);
            self
        }
    }

    impl Record for SampleRecord {
        fn to_row(&self) -> RowpackResult<Row> {
            Attributes(self).to_row()
        }
    }

    /// `n` raw mappings `{name: "Foo<i>", age}`.
    pub fn sample_rows(n: usize, age: i32) -> Vec<Row> {
        (0..n)
            .map(|i| Row::new().with("age", age).with("name", format!("Foo{}", i)))
            .collect()
    }

    /// `n` structured records with explicit ids starting at `first_id`.
    pub fn sample_records_with_ids(n: usize, first_id: i64) -> Vec<SampleRecord> {
        (0..n)
            .map(|i| SampleRecord::new(format!("Foo{}", i), 4).with_id(first_id + i as i64))
            .collect()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for values and rows.

    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Text without quotes or backslashes, so its literal embeds it verbatim.
    pub fn arb_plain_text() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 _.-]{1,24}"
    }

    /// Any text PostgreSQL can store (no NUL).
    pub fn arb_text() -> impl Strategy<Value = String> {
        "[^\\x00]{0,32}"
    }

    pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (1970i32..2100, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
    }

    /// Any scalar value, excluding non-finite floats and JSON documents.
    pub fn arb_scalar_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            (-1.0e12f64..1.0e12).prop_map(Value::Float),
            arb_text().prop_map(Value::Text),
            proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
            arb_date().prop_map(Value::Date),
            (0i64..4_000_000_000).prop_map(|secs| {
                Value::TimestampTz(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
            }),
            (0i64..4_000_000_000, 0u32..1_000_000).prop_map(|(secs, micros)| {
                let ts = Utc.timestamp_opt(secs, micros * 1_000).single().unwrap_or_default();
                Value::Timestamp(ts.naive_utc())
            }),
            any::<[u8; 16]>().prop_map(|b| Value::Uuid(Uuid::from_bytes(b))),
        ]
    }

    /// Column type that stores `value` without loss.
    pub fn sql_type_for(value: &Value) -> SqlType {
        match value {
            Value::Null | Value::Text(_) => SqlType::Text,
            Value::Bool(_) => SqlType::Boolean,
            Value::Int(_) => SqlType::Integer,
            Value::Float(_) => SqlType::Float,
            Value::Bytes(_) => SqlType::Bytea,
            Value::Date(_) => SqlType::Date,
            Value::Timestamp(_) => SqlType::Timestamp,
            Value::TimestampTz(_) => SqlType::TimestampTz,
            Value::Uuid(_) => SqlType::Uuid,
            Value::Json(_) => SqlType::Json,
        }
    }

    /// A row of scalar values `c0, c1, ...` and a table whose columns are
    /// typed to match.
    pub fn arb_typed_row(max: usize) -> impl Strategy<Value = (TableMetadata, Row)> {
        proptest::collection::vec(arb_scalar_value(), 1..=max).prop_map(|values| {
            let mut table = TableMetadata::new("typed_values");
            let mut row = Row::new();
            for (i, value) in values.into_iter().enumerate() {
                let name = format!("c{}", i);
                table = table.with_column(ColumnMeta::new(name.clone(), sql_type_for(&value)));
                row.insert(name, value);
            }
            (table, row)
        })
    }

    /// A `sample_records` row with any subset of `name` / `age`.
    pub fn arb_sample_row() -> impl Strategy<Value = Row> {
        (
            proptest::option::of(arb_plain_text()),
            proptest::option::of(0i32..120),
        )
            .prop_map(|(name, age)| {
                let mut row = Row::new();
                if let Some(name) = name {
                    row.insert("name", name);
                }
                if let Some(age) = age {
                    row.insert("age", age);
                }
                row
            })
    }

    /// A batch of fixture rows, each with both `name` and `age` set.
    pub fn arb_complete_sample_rows(max: usize) -> impl Strategy<Value = Vec<Row>> {
        proptest::collection::vec((arb_plain_text(), 0i32..120), 1..=max).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(name, age)| Row::new().with("name", name).with("age", age))
                .collect()
        })
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertions for generated SQL and errors.

    use super::*;

    /// Assert that `sql` holds exactly one insert into `table`.
    pub fn assert_single_insert(sql: &str, table: &str) {
        let needle = format!("INSERT INTO \"{}\"", table);
        assert_eq!(
            sql.matches(&needle).count(),
            1,
            "Expected exactly one insert into {} in: {}",
            table,
            sql
        );
    }

    /// Assert that `sql` inserts exactly `rows` row tuples.
    pub fn assert_row_tuples(sql: &str, rows: u64) {
        assert_eq!(
            count_value_tuples(sql),
            rows,
            "Unexpected row tuple count in: {}",
            sql
        );
    }

    pub fn assert_unknown_column<T: std::fmt::Debug>(result: &RowpackResult<T>, column: &str) {
        match result {
            Err(RowpackError::Statement(StatementError::UnknownColumn { column: c, .. })) => {
                assert_eq!(c, column)
            }
            other => panic!("Expected UnknownColumn({}), got {:?}", column, other),
        }
    }

    pub fn assert_unsupported_type<T: std::fmt::Debug>(result: &RowpackResult<T>) {
        assert!(
            matches!(
                result,
                Err(RowpackError::Statement(StatementError::UnsupportedType { .. }))
            ),
            "Expected UnsupportedType, got {:?}",
            result
        );
    }

    pub fn assert_execution_failed<T: std::fmt::Debug>(result: &RowpackResult<T>) {
        assert!(
            matches!(
                result,
                Err(RowpackError::Storage(StorageError::ExecutionFailed { .. }))
            ),
            "Expected ExecutionFailed, got {:?}",
            result
        );
    }
}

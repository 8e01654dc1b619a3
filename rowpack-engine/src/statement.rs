//! Statement Builder
//!
//! Emits exactly one multi-row `INSERT` per batch. The number of rows in a
//! batch never changes the number of statements.

use crate::coerce::{coerce_for, quote_identifier};
use crate::resolve::ColumnSet;
use rowpack_core::{OnConflict, Row, StatementError, TableMetadata};

/// A resolved column set paired with the statement text for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    pub columns: ColumnSet,
    pub sql: String,
    pub row_count: usize,
}

/// Quote a table name, schema-qualified when the metadata carries a schema.
pub fn quote_table(table: &TableMetadata) -> String {
    match &table.schema {
        Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(&table.name)),
        None => quote_identifier(&table.name),
    }
}

/// Build the insert statement for `rows`.
///
/// Returns `None` for an empty batch. Values follow `columns` order and a
/// row missing a column contributes `NULL` in that position. An empty column
/// set still inserts one row per record, each with `DEFAULT` for the primary
/// key (or the first column when the table has none).
pub fn build(
    table: &TableMetadata,
    columns: &ColumnSet,
    rows: &[Row],
    on_conflict: OnConflict,
) -> Result<Option<InsertPlan>, StatementError> {
    if rows.is_empty() {
        return Ok(None);
    }

    let mut sql = String::with_capacity(64 + rows.len() * (columns.len() + 1) * 12);
    sql.push_str("INSERT INTO ");
    sql.push_str(&quote_table(table));

    if columns.is_empty() {
        let target = table
            .primary_key
            .as_deref()
            .or_else(|| table.columns.first().map(|c| c.name.as_str()))
            .ok_or_else(|| StatementError::NoColumns {
                table: table.qualified_name(),
            })?;
        sql.push_str(" (");
        sql.push_str(&quote_identifier(target));
        sql.push_str(") VALUES ");
        push_separated(&mut sql, rows.iter().map(|_| "(DEFAULT)".to_string()));
    } else {
        let metas = columns
            .names()
            .iter()
            .map(|name| {
                table.column(name).ok_or_else(|| StatementError::UnknownColumn {
                    table: table.qualified_name(),
                    column: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        sql.push_str(" (");
        push_separated(&mut sql, columns.names().iter().map(|c| quote_identifier(c)));
        sql.push_str(") VALUES ");

        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (j, meta) in metas.iter().enumerate() {
                if j > 0 {
                    sql.push_str(", ");
                }
                match row.get(&meta.name) {
                    Some(value) => sql.push_str(&coerce_for(value, meta)?),
                    None => sql.push_str("NULL"),
                }
            }
            sql.push(')');
        }
    }

    if on_conflict == OnConflict::DoNothing {
        sql.push_str(" ON CONFLICT DO NOTHING");
    }

    Ok(Some(InsertPlan {
        columns: columns.clone(),
        sql,
        row_count: rows.len(),
    }))
}

fn push_separated(sql: &mut String, parts: impl Iterator<Item = String>) {
    for (i, part) in parts.enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&part);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use rowpack_core::{ColumnMeta, SqlType, Value};

    fn table() -> TableMetadata {
        TableMetadata::new("sample_records")
            .with_column(ColumnMeta::new("id", SqlType::Integer))
            .with_column(ColumnMeta::new("name", SqlType::Text))
            .with_column(ColumnMeta::new("age", SqlType::Integer))
            .with_primary_key("id")
    }

    fn plan(rows: &[Row], use_pk: bool) -> Option<InsertPlan> {
        let t = table();
        let columns = resolve(rows, use_pk, &t).unwrap();
        build(&t, &columns, rows, OnConflict::Error).unwrap()
    }

    #[test]
    fn test_single_row() {
        let rows = vec![Row::new().with("name", "Foo").with("age", 30)];
        let plan = plan(&rows, false).unwrap();
        assert_eq!(
            plan.sql,
            r#"INSERT INTO "sample_records" ("name", "age") VALUES ('Foo', 30)"#
        );
        assert_eq!(plan.row_count, 1);
    }

    #[test]
    fn test_multi_row_single_statement_with_null_fill() {
        let rows = vec![
            Row::new().with("name", "Foo0").with("age", 4),
            Row::new().with("age", 5),
            Row::new().with("name", "Foo2"),
        ];
        let plan = plan(&rows, false).unwrap();
        assert_eq!(
            plan.sql,
            r#"INSERT INTO "sample_records" ("name", "age") VALUES ('Foo0', 4), (NULL, 5), ('Foo2', NULL)"#
        );
        assert_eq!(plan.sql.matches("INSERT INTO").count(), 1);
    }

    #[test]
    fn test_primary_key_values_excluded() {
        let rows = vec![
            Row::new().with("id", 10_000).with("name", "Foo"),
            Row::new().with("id", 10_001).with("name", "Bar"),
        ];
        let excluded = plan(&rows, false).unwrap();
        assert!(!excluded.sql.contains("10000"));
        assert!(!excluded.sql.contains("10001"));

        let kept = plan(&rows, true).unwrap();
        assert!(kept.sql.contains("10000"));
        assert!(kept.sql.contains("10001"));
    }

    #[test]
    fn test_empty_batch_is_no_op() {
        assert!(plan(&[], false).is_none());
    }

    #[test]
    fn test_empty_column_set_uses_default() {
        let rows = vec![Row::new().with("id", 1), Row::new()];
        let plan = plan(&rows, false).unwrap();
        assert_eq!(
            plan.sql,
            r#"INSERT INTO "sample_records" ("id") VALUES (DEFAULT), (DEFAULT)"#
        );
        assert_eq!(plan.row_count, 2);
    }

    #[test]
    fn test_empty_table_has_no_columns() {
        let t = TableMetadata::new("nothing");
        let result = build(&t, &ColumnSet::default(), &[Row::new()], OnConflict::Error);
        assert!(matches!(result, Err(StatementError::NoColumns { .. })));
    }

    #[test]
    fn test_schema_qualified_and_on_conflict() {
        let t = table().with_schema("public");
        let rows = vec![Row::new().with("name", "Foo")];
        let columns = resolve(&rows, false, &t).unwrap();
        let plan = build(&t, &columns, &rows, OnConflict::DoNothing).unwrap().unwrap();
        assert_eq!(
            plan.sql,
            r#"INSERT INTO "public"."sample_records" ("name") VALUES ('Foo') ON CONFLICT DO NOTHING"#
        );
    }

    #[test]
    fn test_coercion_error_aborts_batch() {
        let t = table();
        let rows = vec![Row::new().with("age", Value::Float(f64::NAN))];
        let columns = resolve(&rows, false, &t).unwrap();
        let result = build(&t, &columns, &rows, OnConflict::Error);
        assert!(matches!(result, Err(StatementError::UnsupportedType { .. })));
    }
}

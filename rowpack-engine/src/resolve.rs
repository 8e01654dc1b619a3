//! Column Resolver

use rowpack_core::{Row, StatementError, TableMetadata};
use std::collections::HashSet;

/// Ordered, deduplicated column names shared by every row of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<String>,
}

impl ColumnSet {
    pub fn names(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Resolve the column set for one batch.
///
/// Columns appear in first-encounter order across `rows`. Every key must be
/// a real column of `table`. The primary key is dropped unless
/// `use_provided_primary_key` is set, so the database assigns it.
pub fn resolve(
    rows: &[Row],
    use_provided_primary_key: bool,
    table: &TableMetadata,
) -> Result<ColumnSet, StatementError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::new();

    for row in rows {
        for name in row.columns() {
            if !seen.insert(name) {
                continue;
            }
            if !table.has_column(name) {
                return Err(StatementError::UnknownColumn {
                    table: table.qualified_name(),
                    column: name.to_string(),
                });
            }
            if table.is_primary_key(name) && !use_provided_primary_key {
                continue;
            }
            columns.push(name.to_string());
        }
    }

    Ok(ColumnSet { columns })
}

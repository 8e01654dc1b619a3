//! Bulk-insert entry points

use crate::planner::{self, InsertReport};
use crate::statement::InsertPlan;
use crate::validate::{filter, RuleSet, Validator};
use rowpack_core::{
    InsertOptions, Record, Row, RowpackResult, TableMetadata, Timestamp, Value, CREATED_AT,
    UPDATED_AT,
};
use rowpack_storage::{ColumnCatalog, SqlExecutor};

/// Statements planned for a call, not yet executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedInsert {
    pub plans: Vec<InsertPlan>,
    pub skipped_invalid: usize,
}

impl PreparedInsert {
    /// Statement texts in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.plans.iter().map(|p| p.sql.as_str())
    }
}

/// Inserts record collections into one table through an executor.
pub struct BulkInserter<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
    table: TableMetadata,
    validator: Option<&'a dyn Validator>,
}

impl<'a, E: SqlExecutor + ?Sized> BulkInserter<'a, E> {
    pub fn new(executor: &'a E, table: TableMetadata) -> Self {
        Self {
            executor,
            table,
            validator: None,
        }
    }

    /// Fetch the table metadata from `catalog` first.
    pub async fn load<C>(catalog: &C, executor: &'a E, table_name: &str) -> RowpackResult<Self>
    where
        C: ColumnCatalog + ?Sized,
    {
        let table = catalog.table(table_name).await?;
        Ok(Self::new(executor, table))
    }

    /// Validator consulted when `options.validate` is set. Without one,
    /// validation accepts every record.
    pub fn with_validator(mut self, validator: &'a dyn Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn table(&self) -> &TableMetadata {
        &self.table
    }

    /// Insert all records in a single statement. `options.batch_size` is
    /// ignored.
    pub async fn bulk_insert<R: Record>(
        &self,
        records: &[R],
        options: &InsertOptions,
    ) -> RowpackResult<u64> {
        let options = InsertOptions {
            batch_size: None,
            ..options.clone()
        };
        Ok(self.insert(records, &options).await?.rows_inserted)
    }

    /// Insert records with at most `options.batch_size` rows per statement.
    pub async fn bulk_insert_in_batches<R: Record>(
        &self,
        records: &[R],
        options: &InsertOptions,
    ) -> RowpackResult<u64> {
        Ok(self.insert(records, options).await?.rows_inserted)
    }

    /// Insert records and report statement and skip counts.
    #[tracing::instrument(
        name = "bulk_insert",
        skip_all,
        fields(table = %self.table.qualified_name(), records = records.len())
    )]
    pub async fn insert<R: Record>(
        &self,
        records: &[R],
        options: &InsertOptions,
    ) -> RowpackResult<InsertReport> {
        let prepared = self.prepare(records, options)?;
        let rows_inserted = planner::execute(self.executor, &prepared.plans).await?;

        let report = InsertReport {
            rows_inserted,
            statements_executed: prepared.plans.len(),
            skipped_invalid: prepared.skipped_invalid,
        };
        tracing::info!(
            rows_inserted = report.rows_inserted,
            statements = report.statements_executed,
            skipped_invalid = report.skipped_invalid,
            "Bulk insert complete"
        );
        Ok(report)
    }

    /// Normalize, validate, and plan without executing anything.
    pub fn prepare<R: Record>(
        &self,
        records: &[R],
        options: &InsertOptions,
    ) -> RowpackResult<PreparedInsert> {
        options.check()?;

        let mut rows = records
            .iter()
            .map(|record| record.to_row())
            .collect::<RowpackResult<Vec<Row>>>()?;

        if options.timestamps {
            apply_timestamps(&mut rows, &self.table, chrono::Utc::now());
        }

        let no_rules = RuleSet::new();
        let validator: &dyn Validator = match self.validator {
            Some(validator) => validator,
            None => &no_rules,
        };
        let outcome = filter(rows, options.validate, validator);

        let plans = planner::plan(&self.table, &outcome.valid, options)?;
        Ok(PreparedInsert {
            plans,
            skipped_invalid: outcome.invalid_count,
        })
    }
}

/// Fill missing or null `created_at` / `updated_at` with `now`, for the
/// columns the table actually has.
pub fn apply_timestamps(rows: &mut [Row], table: &TableMetadata, now: Timestamp) {
    let columns: Vec<&str> = [CREATED_AT, UPDATED_AT]
        .into_iter()
        .filter(|c| table.has_column(c))
        .collect();
    if columns.is_empty() {
        return;
    }
    for row in rows.iter_mut() {
        for column in &columns {
            if row.get(column).map_or(true, Value::is_null) {
                row.insert(*column, Value::TimestampTz(now));
            }
        }
    }
}

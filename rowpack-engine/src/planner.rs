//! Batch Planner
//!
//! Splits the filtered rows into bounded batches, plans one statement per
//! batch, then executes the statements in order.

use crate::resolve::resolve;
use crate::statement::{build, InsertPlan};
use rowpack_core::{InsertOptions, Row, RowpackResult, TableMetadata};
use rowpack_storage::SqlExecutor;

/// Outcome of a bulk-insert call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertReport {
    /// Sum of the affected-row counts reported by the executor.
    pub rows_inserted: u64,
    pub statements_executed: usize,
    /// Records dropped by validation.
    pub skipped_invalid: usize,
}

/// Plan every batch.
///
/// Each batch resolves its own column set, so batches of differently shaped
/// rows may insert different columns. Planning finishes before anything is
/// executed: an unknown column or unsupported value in the last batch still
/// aborts the call before the first statement runs.
pub fn plan(
    table: &TableMetadata,
    rows: &[Row],
    options: &InsertOptions,
) -> RowpackResult<Vec<InsertPlan>> {
    options.check()?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = options.batch_size.unwrap_or(rows.len());
    let mut plans = Vec::with_capacity(rows.len().div_ceil(batch_size));

    for (batch, chunk) in rows.chunks(batch_size).enumerate() {
        let columns = resolve(chunk, options.use_provided_primary_key, table)?;
        if let Some(plan) = build(table, &columns, chunk, options.on_conflict)? {
            tracing::debug!(
                batch,
                rows = plan.row_count,
                columns = plan.columns.len(),
                "Planned insert batch"
            );
            plans.push(plan);
        }
    }

    Ok(plans)
}

/// Execute planned statements sequentially and sum the affected rows.
///
/// The first failure stops the remaining batches and is returned as is;
/// batches already executed stay applied.
pub async fn execute<E>(executor: &E, plans: &[InsertPlan]) -> RowpackResult<u64>
where
    E: SqlExecutor + ?Sized,
{
    let mut total = 0u64;
    for (batch, plan) in plans.iter().enumerate() {
        let affected = executor.execute(&plan.sql).await.map_err(|error| {
            tracing::warn!(batch, %error, "Insert batch failed, aborting remaining batches");
            error
        })?;
        tracing::debug!(batch, affected, "Executed insert batch");
        total += affected;
    }
    Ok(total)
}

/// Plan and execute in one step.
pub async fn plan_and_execute<E>(
    executor: &E,
    table: &TableMetadata,
    rows: &[Row],
    options: &InsertOptions,
) -> RowpackResult<InsertReport>
where
    E: SqlExecutor + ?Sized,
{
    let plans = plan(table, rows, options)?;
    let rows_inserted = execute(executor, &plans).await?;
    Ok(InsertReport {
        rows_inserted,
        statements_executed: plans.len(),
        skipped_invalid: 0,
    })
}

//! rowpack-import
//!
//! Reads newline-delimited JSON objects from stdin and bulk-inserts them
//! into the table named by the first argument. Options come from the
//! `ROWPACK_*` environment variables. The whole import runs in one
//! transaction.

use rowpack_core::InsertOptions;
use rowpack_pg::{init_tracing, DbClient, DbConfig, PgError, PgResult, TelemetryConfig};
use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> PgResult<()> {
    init_tracing(&TelemetryConfig::default())?;

    let table = std::env::args()
        .nth(1)
        .ok_or_else(|| PgError::Usage("rowpack-import <table> < records.ndjson".to_string()))?;
    let options = InsertOptions::from_env();
    options.check()?;

    let records = read_records().await?;
    tracing::info!(%table, records = records.len(), "Read import input");

    let db = DbClient::from_config(&DbConfig::from_env())?;
    let report = db
        .bulk_insert_atomic(&table, &records, &options, None)
        .await?;

    println!(
        "inserted {} rows in {} statements into {}",
        report.rows_inserted, report.statements_executed, table
    );
    Ok(())
}

async fn read_records() -> PgResult<Vec<JsonValue>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut records = Vec::new();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: JsonValue =
            serde_json::from_str(&line).map_err(|e| PgError::InvalidInput {
                line: line_number,
                reason: e.to_string(),
            })?;
        if !record.is_object() {
            return Err(PgError::InvalidInput {
                line: line_number,
                reason: "expected a JSON object".to_string(),
            });
        }
        records.push(record);
    }

    Ok(records)
}

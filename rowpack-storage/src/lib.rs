//! ROWPACK Storage - Collaborator Traits and Mock Implementations
//!
//! Defines the two database-facing seams of the bulk-insert engine:
//! statement execution and column metadata lookup. The PostgreSQL
//! implementations live in rowpack-pg.

pub mod catalog;

pub use catalog::StaticCatalog;

use ::async_trait::async_trait;
use rowpack_core::{StorageError, StorageResult, TableMetadata};
use std::sync::{Arc, Mutex};

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Executes raw SQL text.
///
/// One bulk-insert call drives one executor sequentially; implementations
/// need not support concurrent statements on the same handle.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute a single statement and return the number of affected rows.
    async fn execute(&self, sql: &str) -> StorageResult<u64>;
}

/// Source of authoritative table metadata.
#[async_trait]
pub trait ColumnCatalog: Send + Sync {
    /// Look up a table by name (optionally `schema.table`).
    async fn table(&self, name: &str) -> StorageResult<TableMetadata>;
}

#[async_trait]
impl<T: SqlExecutor + ?Sized> SqlExecutor for Arc<T> {
    async fn execute(&self, sql: &str) -> StorageResult<u64> {
        (**self).execute(sql).await
    }
}

// ============================================================================
// MOCK EXECUTOR
// ============================================================================

/// In-memory executor for testing.
///
/// Records every statement it receives and reports the number of row
/// tuples in each `INSERT ... VALUES` statement as the affected count.
/// A failure can be scripted for the n-th statement (0-based).
#[derive(Debug, Default, Clone)]
pub struct MockExecutor {
    statements: Arc<Mutex<Vec<String>>>,
    rows_inserted: Arc<Mutex<u64>>,
    fail_at: Option<usize>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the statement at `index` (0-based) with an execution error.
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    /// All statements executed so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of statements executed so far.
    pub fn statement_count(&self) -> usize {
        self.statements.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Total rows reported as inserted, standing in for the table row count.
    pub fn rows_inserted(&self) -> u64 {
        self.rows_inserted.lock().map(|n| *n).unwrap_or(0)
    }

    /// Clear all recorded state.
    pub fn clear(&self) {
        if let Ok(mut statements) = self.statements.lock() {
            statements.clear();
        }
        if let Ok(mut rows) = self.rows_inserted.lock() {
            *rows = 0;
        }
    }
}

#[async_trait]
impl SqlExecutor for MockExecutor {
    async fn execute(&self, sql: &str) -> StorageResult<u64> {
        let mut statements = self
            .statements
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        if self.fail_at == Some(statements.len()) {
            return Err(StorageError::ExecutionFailed {
                message: format!("scripted failure at statement {}", statements.len()),
                code: Some("XX000".to_string()),
            });
        }
        statements.push(sql.to_string());

        let affected = count_value_tuples(sql);
        let mut rows = self
            .rows_inserted
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        *rows += affected;
        Ok(affected)
    }
}

/// Count the top-level row tuples following `VALUES` in an insert statement.
///
/// Quoted literals and quoted identifiers are skipped, so parentheses or
/// keywords inside them are not counted.
pub fn count_value_tuples(sql: &str) -> u64 {
    let bytes = sql.as_bytes();
    let mut in_literal = false;
    let mut in_identifier = false;
    let mut depth = 0usize;
    let mut after_values = false;
    let mut tuples = 0u64;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' if !in_identifier => in_literal = !in_literal,
            b'"' if !in_literal => in_identifier = !in_identifier,
            _ if in_literal || in_identifier => {}
            b'(' => {
                if depth == 0 && after_values {
                    tuples += 1;
                }
                depth += 1;
            }
            b')' => depth = depth.saturating_sub(1),
            b'V' | b'v' if depth == 0 && !after_values => {
                let rest = &bytes[i..];
                if rest.len() >= 6 && rest[..6].eq_ignore_ascii_case(b"VALUES") {
                    after_values = true;
                }
            }
            _ => {}
        }
    }
    tuples
}

// ============================================================================
// TESTS
// ============================================================================

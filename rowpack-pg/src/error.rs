//! PostgreSQL error mapping

use rowpack_core::{RowpackError, StorageError};
use thiserror::Error;

/// Errors surfaced by the import binary and tracing setup.
#[derive(Debug, Error)]
pub enum PgError {
    #[error(transparent)]
    Rowpack(#[from] RowpackError),

    #[error("Invalid input at line {line}: {reason}")]
    InvalidInput { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialize tracing: {reason}")]
    Telemetry { reason: String },

    #[error("Usage: {0}")]
    Usage(String),
}

impl From<StorageError> for PgError {
    fn from(err: StorageError) -> Self {
        PgError::Rowpack(err.into())
    }
}

pub type PgResult<T> = Result<T, PgError>;

/// Map a driver error, keeping the SQLSTATE code when the server sent one.
pub fn execution_failed(err: tokio_postgres::Error) -> StorageError {
    tracing::error!("Database error: {:?}", err);

    let code = err.code().map(|state| state.code().to_string());
    let message = match err.as_db_error() {
        Some(db) => db.message().to_string(),
        None => err.to_string(),
    };
    StorageError::ExecutionFailed { message, code }
}

/// Map a pool checkout failure.
pub fn connection_failed(err: deadpool_postgres::PoolError) -> StorageError {
    tracing::error!("Connection pool error: {:?}", err);

    let reason = match err {
        deadpool_postgres::PoolError::Timeout(_) => "connection pool exhausted".to_string(),
        deadpool_postgres::PoolError::Closed => "connection pool is closed".to_string(),
        other => other.to_string(),
    };
    StorageError::ConnectionFailed { reason }
}

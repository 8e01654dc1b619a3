//! Error types for ROWPACK operations

use thiserror::Error;

/// Statement planning errors.
///
/// Both variants are structural: they are raised while planning, before any
/// statement reaches the database.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatementError {
    #[error("Unsupported value for column {column}: {value_type} ({reason})")]
    UnsupportedType {
        column: String,
        value_type: String,
        reason: String,
    },

    #[error("Unknown column {column} for table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Table {table} has no columns")]
    NoColumns { table: String },
}

/// Storage and execution errors raised by the database collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Statement execution failed: {message}")]
    ExecutionFailed {
        message: String,
        /// SQLSTATE code, when the driver reports one.
        code: Option<String>,
    },

    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation failures for a single row.
///
/// These are soft failures: the filter drops the row and counts it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid length for {field}: {length} not in [{min:?}, {max:?}]")]
    InvalidLength {
        field: String,
        length: usize,
        min: Option<usize>,
        max: Option<usize>,
    },

    #[error("Value for {field} out of range: {value}")]
    OutOfRange { field: String, value: String },

    #[error("Value for {field} is not an allowed value: {value}")]
    NotIncluded { field: String, value: String },

    #[error("Invalid value for {field}: {reason}")]
    Custom { field: String, reason: String },
}

/// Record normalization errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Record of type {type_name} did not serialize to an object")]
    NotAnObject { type_name: String },

    #[error("Record serialization failed: {reason}")]
    Serialization { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all ROWPACK errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RowpackError {
    #[error("Statement error: {0}")]
    Statement(#[from] StatementError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for ROWPACK operations.
pub type RowpackResult<T> = Result<T, RowpackError>;

/// Result type alias for collaborator storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// TESTS
// =============================================================================

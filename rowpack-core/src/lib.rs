//! ROWPACK Core - Value, Row, and Table Types
//!
//! Pure data structures shared by every other crate in the workspace:
//! field values, rows and the `Record` abstraction, table metadata,
//! insert options, and the error taxonomy.

pub mod config;
pub mod error;
pub mod record;
pub mod schema;
pub mod value;

pub use config::{InsertOptions, OnConflict};
pub use error::{
    ConfigError, RecordError, RowpackError, RowpackResult, StatementError, StorageError,
    StorageResult, ValidationError,
};
pub use record::{Attributes, Record, Row};
pub use schema::{ColumnMeta, SqlType, TableMetadata};
pub use value::Value;

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Column conventionally holding the row creation time.
pub const CREATED_AT: &str = "created_at";

/// Column conventionally holding the row modification time.
pub const UPDATED_AT: &str = "updated_at";

//! ROWPACK PostgreSQL
//!
//! Connection pooling, statement execution, and catalog introspection on top
//! of deadpool-postgres, plus tracing setup for the `rowpack-import` binary.

pub mod db;
pub mod error;
pub mod telemetry;

pub use db::{DbClient, DbConfig, PgConnection};
pub use error::{PgError, PgResult};
pub use telemetry::{init_tracing, TelemetryConfig};

//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Conflict handling appended to every generated statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnConflict {
    /// No clause; a conflicting row fails the statement.
    #[default]
    Error,
    /// `ON CONFLICT DO NOTHING`
    DoNothing,
}

/// Options recognized by a bulk-insert call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOptions {
    /// Run each record through the validator and drop failures.
    pub validate: bool,
    /// Keep caller-supplied primary-key values instead of letting the
    /// database assign them.
    pub use_provided_primary_key: bool,
    /// Maximum rows per statement; `None` means a single statement.
    pub batch_size: Option<usize>,
    /// Fill missing `created_at` / `updated_at` with the call's timestamp.
    pub timestamps: bool,
    pub on_conflict: OnConflict,
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn use_provided_primary_key(mut self, use_provided: bool) -> Self {
        self.use_provided_primary_key = use_provided;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = on_conflict;
        self
    }

    /// Check the options before any work is done.
    pub fn check(&self) -> RowpackResult<()> {
        if self.batch_size == Some(0) {
            return Err(RowpackError::Config(ConfigError::InvalidValue {
                field: "batch_size".to_string(),
                value: "0".to_string(),
                reason: "batch_size must be greater than 0".to_string(),
            }));
        }
        Ok(())
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `ROWPACK_BATCH_SIZE`: rows per statement (default: unbounded)
    /// - `ROWPACK_VALIDATE`: `true`/`1` to validate (default: false)
    /// - `ROWPACK_USE_PROVIDED_PRIMARY_KEY`: `true`/`1` (default: false)
    /// - `ROWPACK_TIMESTAMPS`: `true`/`1` (default: false)
    pub fn from_env() -> Self {
        Self {
            validate: env_flag("ROWPACK_VALIDATE"),
            use_provided_primary_key: env_flag("ROWPACK_USE_PROVIDED_PRIMARY_KEY"),
            batch_size: env_var("ROWPACK_BATCH_SIZE"),
            timestamps: env_flag("ROWPACK_TIMESTAMPS"),
            on_conflict: OnConflict::default(),
        }
    }
}

/// Parse an environment variable; `None` when unset or unparseable.
pub fn env_var<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

/// `true` when the variable is `true` or `1`.
pub fn env_flag(name: &str) -> bool {
    env_var::<String>(name).is_some_and(|s| s == "true" || s == "1")
}

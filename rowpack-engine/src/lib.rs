//! ROWPACK Engine - Bulk Insert Planning
//!
//! Turns a collection of records into as few multi-row `INSERT` statements
//! as the batch size allows:
//!
//! records → normalize → validate (optional) → batch → resolve columns →
//! build statement → execute → sum affected rows
//!
//! ```ignore
//! let inserter = BulkInserter::new(&executor, table).with_validator(&rules);
//! let inserted = inserter
//!     .bulk_insert_in_batches(&records, &InsertOptions::new().batch_size(500))
//!     .await?;
//! ```

pub mod coerce;
pub mod inserter;
pub mod planner;
pub mod resolve;
pub mod statement;
pub mod validate;

pub use coerce::{coerce, coerce_for, quote_identifier};
pub use inserter::{apply_timestamps, BulkInserter, PreparedInsert};
pub use planner::{execute, plan, plan_and_execute, InsertReport};
pub use resolve::{resolve, ColumnSet};
pub use statement::{build, quote_table, InsertPlan};
pub use validate::{filter, FilterOutcome, RuleSet, Validator};

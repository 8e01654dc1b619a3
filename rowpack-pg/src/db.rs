//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling with deadpool-postgres, and the
//! `SqlExecutor` / `ColumnCatalog` implementations the bulk inserter runs
//! against.

use crate::error::{connection_failed, execution_failed};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use rowpack_core::config::env_var;
use rowpack_core::{
    ColumnMeta, InsertOptions, Record, RowpackResult, SqlType, StorageError, StorageResult,
    TableMetadata,
};
use rowpack_engine::{quote_table, BulkInserter, InsertReport, Validator};
use rowpack_storage::{ColumnCatalog, SqlExecutor};
use std::time::Duration;
use tokio_postgres::NoTls;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Connection and pool settings.
///
/// `timeout` bounds both establishing a connection and waiting for a free
/// pooled one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub max_size: usize,
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "rowpack".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Read `ROWPACK_DB_{HOST,PORT,NAME,USER,PASSWORD,POOL_SIZE,TIMEOUT}`,
    /// keeping the default for anything unset or unparseable. The timeout is
    /// in seconds.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_var("ROWPACK_DB_HOST").unwrap_or(defaults.host),
            port: env_var("ROWPACK_DB_PORT").unwrap_or(defaults.port),
            dbname: env_var("ROWPACK_DB_NAME").unwrap_or(defaults.dbname),
            user: env_var("ROWPACK_DB_USER").unwrap_or(defaults.user),
            password: env_var("ROWPACK_DB_PASSWORD").unwrap_or(defaults.password),
            max_size: env_var("ROWPACK_DB_POOL_SIZE").unwrap_or(defaults.max_size),
            timeout: env_var("ROWPACK_DB_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// The deadpool configuration these settings describe.
    pub fn pool_config(&self) -> Config {
        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(self.timeout);
        timeouts.create = Some(self.timeout);
        let mut pool = PoolConfig::new(self.max_size);
        pool.timeouts = timeouts;

        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(pool);
        cfg
    }

    /// Build the pool. No connection is opened until the first checkout.
    pub fn create_pool(&self) -> StorageResult<Pool> {
        self.pool_config()
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StorageError::ConnectionFailed {
                reason: format!("Failed to create pool: {}", e),
            })
    }
}

// ============================================================================
// SINGLE CONNECTION
// ============================================================================

/// One checked-out pooled connection.
///
/// Every statement of a bulk call runs here, so an explicit transaction
/// opened with [`PgConnection::begin`] covers all of its batches.
pub struct PgConnection {
    client: deadpool_postgres::Object,
}

impl PgConnection {
    pub fn new(client: deadpool_postgres::Object) -> Self {
        Self { client }
    }

    /// The underlying driver client.
    pub fn client(&self) -> &tokio_postgres::Client {
        &self.client
    }

    pub async fn begin(&self) -> StorageResult<()> {
        self.control("BEGIN").await
    }

    pub async fn commit(&self) -> StorageResult<()> {
        self.control("COMMIT").await
    }

    pub async fn rollback(&self) -> StorageResult<()> {
        self.control("ROLLBACK").await
    }

    async fn control(&self, command: &str) -> StorageResult<()> {
        self.client
            .batch_execute(command)
            .await
            .map_err(|e| StorageError::TransactionFailed {
                reason: format!("{} failed: {}", command, execution_failed(e)),
            })
    }
}

#[async_trait]
impl SqlExecutor for PgConnection {
    async fn execute(&self, sql: &str) -> StorageResult<u64> {
        self.client.execute(sql, &[]).await.map_err(execution_failed)
    }
}

const COLUMNS_QUERY: &str = "\
SELECT c.table_schema::text, c.column_name::text, c.udt_name::text, \
       c.is_nullable = 'YES', \
       (c.column_default IS NOT NULL OR c.is_identity = 'YES') \
FROM information_schema.columns c \
WHERE c.table_name::text = $1::text \
  AND c.table_schema::text = COALESCE($2::text, current_schema()::text) \
ORDER BY c.ordinal_position";

const PRIMARY_KEY_QUERY: &str = "\
SELECT a.attname::text \
FROM pg_index i \
JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
WHERE i.indrelid = $1::text::regclass AND i.indisprimary";

#[async_trait]
impl ColumnCatalog for PgConnection {
    async fn table(&self, name: &str) -> StorageResult<TableMetadata> {
        let (schema, table_name) = split_table_name(name);

        let rows = self
            .client
            .query(COLUMNS_QUERY, &[&table_name, &schema])
            .await
            .map_err(execution_failed)?;
        if rows.is_empty() {
            return Err(StorageError::TableNotFound {
                table: name.to_string(),
            });
        }

        let resolved_schema: String = rows[0].get(0);
        let mut table = TableMetadata::new(table_name).with_schema(resolved_schema);
        for row in &rows {
            let column_name: String = row.get(1);
            let type_name: String = row.get(2);
            let nullable: bool = row.get(3);
            let has_default: bool = row.get(4);

            let mut column = ColumnMeta::new(column_name, SqlType::from_pg_name(&type_name));
            if !nullable {
                column = column.not_null();
            }
            if has_default {
                column = column.with_default();
            }
            table = table.with_column(column);
        }

        let key_rows = self
            .client
            .query(PRIMARY_KEY_QUERY, &[&quote_table(&table)])
            .await
            .map_err(execution_failed)?;
        // Composite keys are treated as no single primary key.
        if let [key] = key_rows.as_slice() {
            let key_name: String = key.get(0);
            table = table.with_primary_key(key_name);
        }

        tracing::debug!(
            table = %table.qualified_name(),
            columns = table.columns.len(),
            primary_key = ?table.primary_key,
            "Loaded table metadata"
        );
        Ok(table)
    }
}

/// Split `schema.table` into its parts. A bare name has no schema.
fn split_table_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((schema, table)) => (Some(schema), table),
        None => (None, name),
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client that wraps a connection pool. Each call checks out one
/// connection and runs all of its batches on it.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> StorageResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    pub async fn connection(&self) -> StorageResult<PgConnection> {
        let client = self.pool.get().await.map_err(connection_failed)?;
        Ok(PgConnection::new(client))
    }

    pub async fn table_metadata(&self, name: &str) -> StorageResult<TableMetadata> {
        self.connection().await?.table(name).await
    }

    /// Insert all records into `table` in a single statement.
    pub async fn bulk_insert<R: Record>(
        &self,
        table: &str,
        records: &[R],
        options: &InsertOptions,
    ) -> RowpackResult<u64> {
        let conn = self.connection().await?;
        let inserter = BulkInserter::load(&conn, &conn, table).await?;
        inserter.bulk_insert(records, options).await
    }

    /// Insert records into `table` with at most `options.batch_size` rows
    /// per statement.
    pub async fn bulk_insert_in_batches<R: Record>(
        &self,
        table: &str,
        records: &[R],
        options: &InsertOptions,
    ) -> RowpackResult<u64> {
        self.insert(table, records, options, None)
            .await
            .map(|report| report.rows_inserted)
    }

    /// Insert records with an optional validator and report the outcome.
    pub async fn insert<R: Record>(
        &self,
        table: &str,
        records: &[R],
        options: &InsertOptions,
        validator: Option<&dyn Validator>,
    ) -> RowpackResult<InsertReport> {
        let conn = self.connection().await?;
        let mut inserter = BulkInserter::load(&conn, &conn, table).await?;
        if let Some(validator) = validator {
            inserter = inserter.with_validator(validator);
        }
        inserter.insert(records, options).await
    }

    /// Like [`DbClient::insert`], but all batches commit together or not
    /// at all.
    pub async fn bulk_insert_atomic<R: Record>(
        &self,
        table: &str,
        records: &[R],
        options: &InsertOptions,
        validator: Option<&dyn Validator>,
    ) -> RowpackResult<InsertReport> {
        let conn = self.connection().await?;
        let mut inserter = BulkInserter::load(&conn, &conn, table).await?;
        if let Some(validator) = validator {
            inserter = inserter.with_validator(validator);
        }

        conn.begin().await?;
        match inserter.insert(records, options).await {
            Ok(report) => {
                conn.commit().await?;
                Ok(report)
            }
            Err(err) => {
                if let Err(rollback) = conn.rollback().await {
                    tracing::warn!(%rollback, "Rollback after failed bulk insert also failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvVarGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let original = std::env::var(key).ok();
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
            Self { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.original.as_deref() {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_db_config_from_env() {
        let _port = EnvVarGuard::set("ROWPACK_DB_PORT", Some("6543"));
        let _timeout = EnvVarGuard::set("ROWPACK_DB_TIMEOUT", Some("5"));
        let _pool = EnvVarGuard::set("ROWPACK_DB_POOL_SIZE", Some("not-a-number"));

        let config = DbConfig::from_env();
        assert_eq!(config.port, 6543);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_pool_config_carries_settings() {
        let config = DbConfig {
            host: "db.internal".to_string(),
            max_size: 4,
            timeout: Duration::from_secs(7),
            ..DbConfig::default()
        };
        let cfg = config.pool_config();

        assert_eq!(cfg.host.as_deref(), Some("db.internal"));
        assert_eq!(cfg.port, Some(5432));
        assert_eq!(cfg.connect_timeout, Some(Duration::from_secs(7)));
        let pool = cfg.pool.expect("pool settings");
        assert_eq!(pool.max_size, 4);
        assert_eq!(pool.timeouts.wait, Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_split_table_name() {
        assert_eq!(split_table_name("sample_records"), (None, "sample_records"));
        assert_eq!(
            split_table_name("audit.sample_records"),
            (Some("audit"), "sample_records")
        );
    }

    #[test]
    fn test_create_pool_is_lazy() {
        let config = DbConfig {
            port: 1,
            ..DbConfig::default()
        };
        let client = DbClient::from_config(&config).unwrap();
        assert_eq!(client.pool_size(), 0);
    }
}

//! Fixed, in-memory column catalog.

use crate::ColumnCatalog;
use ::async_trait::async_trait;
use rowpack_core::{StorageError, StorageResult, TableMetadata};
use std::collections::HashMap;

/// Catalog backed by table metadata registered up front.
///
/// Lookups accept either the bare table name or `schema.table`.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: HashMap<String, TableMetadata>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.register(table);
        self
    }

    pub fn register(&mut self, table: TableMetadata) {
        self.tables.insert(table.qualified_name(), table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[async_trait]
impl ColumnCatalog for StaticCatalog {
    async fn table(&self, name: &str) -> StorageResult<TableMetadata> {
        if let Some(table) = self.tables.get(name) {
            return Ok(table.clone());
        }
        // Bare name: accept a single schema-qualified match.
        let mut matches = self.tables.values().filter(|t| t.name == name);
        match (matches.next(), matches.next()) {
            (Some(table), None) => Ok(table.clone()),
            _ => Err(StorageError::TableNotFound {
                table: name.to_string(),
            }),
        }
    }
}

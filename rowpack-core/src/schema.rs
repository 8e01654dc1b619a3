//! Table metadata supplied by the column catalog

use serde::{Deserialize, Serialize};

/// Declared column type, as far as literal coercion cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    Boolean,
    Integer,
    Float,
    Numeric,
    Text,
    Bytea,
    Date,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    /// Any other declared type, kept by name
    Other(String),
}

impl SqlType {
    /// Map a PostgreSQL type name (`information_schema` or `pg_type` form).
    pub fn from_pg_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" => SqlType::Boolean,
            "smallint" | "integer" | "bigint" | "int2" | "int4" | "int8" | "serial"
            | "bigserial" | "smallserial" => SqlType::Integer,
            "real" | "double precision" | "float4" | "float8" => SqlType::Float,
            "numeric" | "decimal" => SqlType::Numeric,
            "text" | "character varying" | "varchar" | "character" | "char" | "bpchar"
            | "citext" | "name" => SqlType::Text,
            "bytea" => SqlType::Bytea,
            "date" => SqlType::Date,
            "timestamp" | "timestamp without time zone" => SqlType::Timestamp,
            "timestamptz" | "timestamp with time zone" => SqlType::TimestampTz,
            "uuid" => SqlType::Uuid,
            "json" | "jsonb" => SqlType::Json,
            other => SqlType::Other(other.to_string()),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, SqlType::Json)
    }

    /// Whether the column accepts `NaN` and infinities.
    pub fn accepts_non_finite(&self) -> bool {
        matches!(self, SqlType::Float | SqlType::Numeric)
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub has_default: bool,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            has_default: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}

/// Authoritative description of the target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<ColumnMeta>,
    pub primary_key: Option<String>,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_column(mut self, column: ColumnMeta) -> Self {
        self.columns.push(column);
        self
    }

    /// Declare the primary key. The column must also be added with
    /// [`with_column`](Self::with_column).
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key.as_deref() == Some(name)
    }

    /// Name used in log and error messages (`schema.table` when qualified).
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

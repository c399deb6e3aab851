//! Narrow interfaces to the schema store and the filesystem
//!
//! The undo engine and the forward commands never open a database or touch
//! files directly; they go through these traits, injected at construction.

use crate::error::RollbackResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single stored value. Blobs are arrays of byte values.
pub type RowValue = serde_json::Value;

/// A column name paired with its declared SQL type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        ColumnDef {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Relational schema store holding one table per model
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Create a table with the given columns, in order
    async fn create_table(&self, name: &str, columns: &[ColumnDef]) -> RollbackResult<()>;

    /// Drop a table; dropping a missing table is not an error
    async fn drop_table(&self, name: &str) -> RollbackResult<()>;

    /// Rename a table
    async fn rename_table(&self, old_name: &str, new_name: &str) -> RollbackResult<()>;

    /// Insert one row given as column/value pairs
    async fn insert_row(&self, table: &str, values: &[(String, RowValue)]) -> RollbackResult<()>;

    /// Execute a raw SQL statement
    async fn run_raw_statement(&self, sql: &str) -> RollbackResult<()>;

    /// Whether a table with this name exists
    async fn table_exists(&self, name: &str) -> RollbackResult<bool>;

    /// Names of all user tables
    async fn list_tables(&self) -> RollbackResult<Vec<String>>;

    /// Column definitions of a table, in declaration order
    async fn describe_table(&self, name: &str) -> RollbackResult<Vec<ColumnDef>>;

    /// Every row of a table, values ordered like `columns`
    async fn fetch_rows(&self, name: &str, columns: &[String]) -> RollbackResult<Vec<Vec<RowValue>>>;
}

/// File primitives used on model definition files. None of them retry.
#[async_trait]
pub trait FilePrimitives: Send + Sync {
    async fn copy_file(&self, from: &Path, to: &Path) -> RollbackResult<()>;

    async fn rename_file(&self, from: &Path, to: &Path) -> RollbackResult<()>;

    /// Write a whole file, creating parent directories
    async fn write_file(&self, path: &Path, content: &str) -> RollbackResult<()>;

    async fn delete_file(&self, path: &Path) -> RollbackResult<()>;

    async fn read_file(&self, path: &Path) -> RollbackResult<String>;

    async fn exists(&self, path: &Path) -> bool;

    /// Files directly inside `dir`, sorted by name; empty if `dir` is missing
    async fn list_files(&self, dir: &Path) -> RollbackResult<Vec<std::path::PathBuf>>;
}

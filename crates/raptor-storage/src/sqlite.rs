//! SQLite-backed schema store

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use raptor_rollback::{ColumnDef, RollbackError, RollbackResult, RowValue, SchemaStore};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// [`SchemaStore`] over a single SQLite connection
#[derive(Debug, Clone)]
pub struct SqliteSchemaStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSchemaStore {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Opened database");
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T, F>(&self, operation: &str, f: F) -> RollbackResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|_| RollbackError::collaborator(operation, "database connection lock poisoned"))?;
        f(&conn).map_err(|e| StorageError::Database(e).into_collaborator(operation))
    }

    fn execute(&self, operation: &str, sql: &str) -> RollbackResult<()> {
        debug!(sql = %sql, "Executing");
        self.with_conn(operation, |conn| conn.execute(sql, []).map(|_| ()))
    }
}

struct ColumnInfo {
    name: String,
    declared: String,
    not_null: bool,
    default: Option<String>,
    pk: bool,
}

/// A stored default as it can appear after `DEFAULT`
///
/// Literals and the `CURRENT_*` keywords stand alone; any other expression
/// must be parenthesized.
fn default_expr(stored: &str) -> String {
    let trimmed = stored.trim();
    let upper = trimmed.to_ascii_uppercase();
    let is_literal = trimmed.starts_with('\'')
        || trimmed.starts_with('(')
        || trimmed.parse::<f64>().is_ok()
        || matches!(
            upper.as_str(),
            "NULL" | "TRUE" | "FALSE" | "CURRENT_TIME" | "CURRENT_DATE" | "CURRENT_TIMESTAMP"
        )
        || (upper.starts_with("X'") && trimmed.ends_with('\''));
    if is_literal {
        trimmed.to_string()
    } else {
        format!("({})", trimmed)
    }
}

/// Double-quote an identifier, escaping embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql_value(value: &RowValue) -> Value {
    match value {
        RowValue::Null => Value::Null,
        RowValue::Bool(b) => Value::Integer(i64::from(*b)),
        RowValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
        },
        RowValue::String(s) => Value::Text(s.clone()),
        RowValue::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            match bytes {
                Some(bytes) => Value::Blob(bytes),
                None => Value::Text(value.to_string()),
            }
        }
        RowValue::Object(_) => Value::Text(value.to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> RowValue {
    match value {
        ValueRef::Null => RowValue::Null,
        ValueRef::Integer(i) => RowValue::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(RowValue::Number)
            .unwrap_or(RowValue::Null),
        ValueRef::Text(bytes) => RowValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => RowValue::Array(bytes.iter().map(|b| RowValue::from(*b)).collect()),
    }
}

#[async_trait]
impl SchemaStore for SqliteSchemaStore {
    async fn create_table(&self, name: &str, columns: &[ColumnDef]) -> RollbackResult<()> {
        if columns.is_empty() {
            return Err(RollbackError::collaborator(
                "create table",
                format!("table '{}' needs at least one column", name),
            ));
        }
        let defs: Vec<String> = columns
            .iter()
            .map(|c| {
                if c.sql_type.trim().is_empty() {
                    quote_ident(&c.name)
                } else {
                    format!("{} {}", quote_ident(&c.name), c.sql_type)
                }
            })
            .collect();
        let sql = format!("CREATE TABLE {} ({})", quote_ident(name), defs.join(", "));
        self.execute("create table", &sql)
    }

    async fn drop_table(&self, name: &str) -> RollbackResult<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_ident(name));
        self.execute("drop table", &sql)
    }

    async fn rename_table(&self, old_name: &str, new_name: &str) -> RollbackResult<()> {
        let sql = format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_ident(old_name),
            quote_ident(new_name)
        );
        self.execute("rename table", &sql)
    }

    async fn insert_row(&self, table: &str, values: &[(String, RowValue)]) -> RollbackResult<()> {
        let sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
        } else {
            let columns: Vec<String> = values.iter().map(|(c, _)| quote_ident(c)).collect();
            let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(table),
                columns.join(", "),
                placeholders.join(", ")
            )
        };
        debug!(sql = %sql, "Executing");
        let params: Vec<Value> = values.iter().map(|(_, v)| to_sql_value(v)).collect();
        self.with_conn("insert row", |conn| {
            conn.execute(&sql, rusqlite::params_from_iter(params)).map(|_| ())
        })
    }

    async fn run_raw_statement(&self, sql: &str) -> RollbackResult<()> {
        debug!(sql = %sql, "Executing raw statement");
        self.with_conn("run statement", |conn| conn.execute_batch(sql))
    }

    async fn table_exists(&self, name: &str) -> RollbackResult<bool> {
        self.with_conn("check table", |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                [name],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
        })
    }

    async fn list_tables(&self) -> RollbackResult<Vec<String>> {
        self.with_conn("list tables", |conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
            names.collect()
        })
    }

    /// Column definitions of `name` as `PRAGMA table_info` reports them
    ///
    /// Each column keeps its declared type, `PRIMARY KEY` (with
    /// `AUTOINCREMENT` when the table was declared with it), `NOT NULL` and
    /// `DEFAULT`. A composite primary key is a table constraint and is not
    /// carried by any single column, so it is lost; so are CHECK, UNIQUE and
    /// foreign key constraints.
    async fn describe_table(&self, name: &str) -> RollbackResult<Vec<ColumnDef>> {
        let sql = format!("PRAGMA table_info({})", quote_ident(name));
        let (info, create_sql) = self.with_conn("describe table", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    declared: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    not_null: row.get::<_, i64>(3)? != 0,
                    default: row.get(4)?,
                    pk: row.get::<_, i64>(5)? > 0,
                })
            })?;
            let info = rows.collect::<rusqlite::Result<Vec<ColumnInfo>>>()?;
            let create_sql: Option<String> = conn
                .query_row(
                    "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                    [name],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();
            Ok((info, create_sql))
        })?;

        if info.is_empty() {
            return Err(RollbackError::collaborator(
                "describe table",
                format!("no such table: {}", name),
            ));
        }

        let single_pk = info.iter().filter(|c| c.pk).count() == 1;
        let autoincrement = create_sql
            .map(|sql| sql.to_ascii_uppercase().contains("AUTOINCREMENT"))
            .unwrap_or(false);
        Ok(info
            .into_iter()
            .map(|column| {
                let mut parts = Vec::new();
                if !column.declared.is_empty() {
                    parts.push(column.declared.clone());
                }
                if single_pk && column.pk {
                    let integer_key = column.declared.eq_ignore_ascii_case("INTEGER");
                    parts.push("PRIMARY KEY".to_string());
                    if autoincrement && integer_key {
                        parts.push("AUTOINCREMENT".to_string());
                    }
                }
                if column.not_null {
                    parts.push("NOT NULL".to_string());
                }
                if let Some(default) = column.default {
                    parts.push(format!("DEFAULT {}", default_expr(&default)));
                }
                ColumnDef::new(column.name, parts.join(" "))
            })
            .collect())
    }

    async fn fetch_rows(&self, name: &str, columns: &[String]) -> RollbackResult<Vec<Vec<RowValue>>> {
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let selected: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            selected.join(", "),
            quote_ident(name)
        );
        debug!(sql = %sql, "Querying");
        self.with_conn("fetch rows", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    values.push(from_sql_value(row.get_ref(i)?));
                }
                out.push(values);
            }
            Ok(out)
        })
    }
}

//! In-memory collaborator doubles that record every call

use crate::collaborators::{ColumnDef, FilePrimitives, RowValue, SchemaStore};
use crate::error::{RollbackError, RollbackResult};
use crate::flow::OperatorPrompt;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A call received by [`RecordingSchemaStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaCall {
    CreateTable(String, Vec<ColumnDef>),
    DropTable(String),
    RenameTable(String, String),
    InsertRow(String, Vec<(String, RowValue)>),
    RawStatement(String),
    TableExists(String),
    ListTables,
    DescribeTable(String),
    FetchRows(String),
}

impl SchemaCall {
    fn is_mutation(&self) -> bool {
        matches!(
            self,
            SchemaCall::CreateTable(..)
                | SchemaCall::DropTable(_)
                | SchemaCall::RenameTable(..)
                | SchemaCall::InsertRow(..)
                | SchemaCall::RawStatement(_)
        )
    }
}

#[derive(Debug, Clone, Default)]
struct Table {
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<RowValue>>,
}

#[derive(Debug, Default)]
struct SchemaState {
    tables: BTreeMap<String, Table>,
    calls: Vec<SchemaCall>,
    fail_create: bool,
    fail_insert: bool,
    fail_drop: bool,
    fail_rename: bool,
}

/// Schema store kept in memory
#[derive(Debug, Default)]
pub struct RecordingSchemaStore {
    state: Mutex<SchemaState>,
}

impl RecordingSchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table without recording a call
    pub fn seed_table(&self, name: &str, columns: &[ColumnDef]) {
        self.lock().tables.insert(
            name.to_string(),
            Table {
                columns: columns.to_vec(),
                rows: Vec::new(),
            },
        );
    }

    /// Add rows to a seeded table without recording a call
    pub fn seed_rows(&self, name: &str, rows: Vec<Vec<RowValue>>) {
        if let Some(table) = self.lock().tables.get_mut(name) {
            table.rows.extend(rows);
        }
    }

    pub fn fail_on_create(&self) {
        self.lock().fail_create = true;
    }

    pub fn fail_on_insert(&self) {
        self.lock().fail_insert = true;
    }

    pub fn fail_on_drop(&self) {
        self.lock().fail_drop = true;
    }

    pub fn fail_on_rename(&self) {
        self.lock().fail_rename = true;
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.lock().tables.contains_key(name)
    }

    pub fn columns_of(&self, name: &str) -> Option<Vec<ColumnDef>> {
        self.lock().tables.get(name).map(|t| t.columns.clone())
    }

    pub fn rows_of(&self, name: &str) -> Vec<Vec<RowValue>> {
        self.lock()
            .tables
            .get(name)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Every call, queries included
    pub fn calls(&self) -> Vec<SchemaCall> {
        self.lock().calls.clone()
    }

    /// Calls that change the store
    pub fn mutations(&self) -> Vec<SchemaCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SchemaState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SchemaStore for RecordingSchemaStore {
    async fn create_table(&self, name: &str, columns: &[ColumnDef]) -> RollbackResult<()> {
        let mut state = self.lock();
        state.calls.push(SchemaCall::CreateTable(name.to_string(), columns.to_vec()));
        if state.fail_create {
            return Err(RollbackError::collaborator("create table", "disk I/O error"));
        }
        if state.tables.contains_key(name) {
            return Err(RollbackError::collaborator("create table", format!("table {} already exists", name)));
        }
        state.tables.insert(
            name.to_string(),
            Table {
                columns: columns.to_vec(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn drop_table(&self, name: &str) -> RollbackResult<()> {
        let mut state = self.lock();
        state.calls.push(SchemaCall::DropTable(name.to_string()));
        if state.fail_drop {
            return Err(RollbackError::collaborator("drop table", "database is locked"));
        }
        state.tables.remove(name);
        Ok(())
    }

    async fn rename_table(&self, old_name: &str, new_name: &str) -> RollbackResult<()> {
        let mut state = self.lock();
        state
            .calls
            .push(SchemaCall::RenameTable(old_name.to_string(), new_name.to_string()));
        if state.fail_rename {
            return Err(RollbackError::collaborator("rename table", "database is locked"));
        }
        if state.tables.contains_key(new_name) {
            return Err(RollbackError::collaborator("rename table", format!("there is already a table named {}", new_name)));
        }
        let table = state
            .tables
            .remove(old_name)
            .ok_or_else(|| RollbackError::collaborator("rename table", format!("no such table: {}", old_name)))?;
        state.tables.insert(new_name.to_string(), table);
        Ok(())
    }

    async fn insert_row(&self, table: &str, values: &[(String, RowValue)]) -> RollbackResult<()> {
        let mut state = self.lock();
        state
            .calls
            .push(SchemaCall::InsertRow(table.to_string(), values.to_vec()));
        if state.fail_insert {
            return Err(RollbackError::collaborator("insert row", "constraint failed"));
        }
        let target = state
            .tables
            .get_mut(table)
            .ok_or_else(|| RollbackError::collaborator("insert row", format!("no such table: {}", table)))?;
        let row = target
            .columns
            .iter()
            .map(|c| {
                values
                    .iter()
                    .find(|(name, _)| name == &c.name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(RowValue::Null)
            })
            .collect();
        target.rows.push(row);
        Ok(())
    }

    async fn run_raw_statement(&self, sql: &str) -> RollbackResult<()> {
        self.lock().calls.push(SchemaCall::RawStatement(sql.to_string()));
        Ok(())
    }

    async fn table_exists(&self, name: &str) -> RollbackResult<bool> {
        let mut state = self.lock();
        state.calls.push(SchemaCall::TableExists(name.to_string()));
        Ok(state.tables.contains_key(name))
    }

    async fn list_tables(&self) -> RollbackResult<Vec<String>> {
        let mut state = self.lock();
        state.calls.push(SchemaCall::ListTables);
        Ok(state.tables.keys().cloned().collect())
    }

    async fn describe_table(&self, name: &str) -> RollbackResult<Vec<ColumnDef>> {
        let mut state = self.lock();
        state.calls.push(SchemaCall::DescribeTable(name.to_string()));
        state
            .tables
            .get(name)
            .map(|t| t.columns.clone())
            .ok_or_else(|| RollbackError::collaborator("describe table", format!("no such table: {}", name)))
    }

    async fn fetch_rows(&self, name: &str, columns: &[String]) -> RollbackResult<Vec<Vec<RowValue>>> {
        let mut state = self.lock();
        state.calls.push(SchemaCall::FetchRows(name.to_string()));
        let table = state
            .tables
            .get(name)
            .ok_or_else(|| RollbackError::collaborator("fetch rows", format!("no such table: {}", name)))?;
        let positions: Vec<Option<usize>> = columns
            .iter()
            .map(|wanted| table.columns.iter().position(|c| &c.name == wanted))
            .collect();
        Ok(table
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|p| p.and_then(|i| row.get(i).cloned()).unwrap_or(RowValue::Null))
                    .collect()
            })
            .collect())
    }
}

/// A call received by [`RecordingFiles`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCall {
    Copy(PathBuf, PathBuf),
    Rename(PathBuf, PathBuf),
    Write(PathBuf),
    Delete(PathBuf),
    Read(PathBuf),
    Exists(PathBuf),
    List(PathBuf),
}

impl FileCall {
    fn is_mutation(&self) -> bool {
        matches!(
            self,
            FileCall::Copy(..) | FileCall::Rename(..) | FileCall::Write(_) | FileCall::Delete(_)
        )
    }
}

#[derive(Debug, Default)]
struct FileState {
    files: BTreeMap<PathBuf, String>,
    calls: Vec<FileCall>,
    fail_rename: bool,
    fail_write: bool,
}

/// Filesystem kept in memory
#[derive(Debug, Default)]
pub struct RecordingFiles {
    state: Mutex<FileState>,
}

impl RecordingFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file without recording a call
    pub fn seed(&self, path: impl Into<PathBuf>, content: &str) {
        self.lock().files.insert(path.into(), content.to_string());
    }

    pub fn fail_on_rename(&self) {
        self.lock().fail_rename = true;
    }

    pub fn fail_on_write(&self) {
        self.lock().fail_write = true;
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    pub fn content(&self, path: &Path) -> Option<String> {
        self.lock().files.get(path).cloned()
    }

    pub fn calls(&self) -> Vec<FileCall> {
        self.lock().calls.clone()
    }

    pub fn mutations(&self) -> Vec<FileCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn missing(operation: &str, path: &Path) -> RollbackError {
    RollbackError::collaborator(operation, format!("{} not found", path.display()))
}

#[async_trait]
impl FilePrimitives for RecordingFiles {
    async fn copy_file(&self, from: &Path, to: &Path) -> RollbackResult<()> {
        let mut state = self.lock();
        state.calls.push(FileCall::Copy(from.to_path_buf(), to.to_path_buf()));
        let content = state.files.get(from).cloned().ok_or_else(|| missing("copy file", from))?;
        state.files.insert(to.to_path_buf(), content);
        Ok(())
    }

    async fn rename_file(&self, from: &Path, to: &Path) -> RollbackResult<()> {
        let mut state = self.lock();
        state.calls.push(FileCall::Rename(from.to_path_buf(), to.to_path_buf()));
        if state.fail_rename {
            return Err(RollbackError::collaborator("rename file", "permission denied"));
        }
        let content = state.files.remove(from).ok_or_else(|| missing("rename file", from))?;
        state.files.insert(to.to_path_buf(), content);
        Ok(())
    }

    async fn write_file(&self, path: &Path, content: &str) -> RollbackResult<()> {
        let mut state = self.lock();
        state.calls.push(FileCall::Write(path.to_path_buf()));
        if state.fail_write {
            return Err(RollbackError::collaborator("write file", "no space left on device"));
        }
        state.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> RollbackResult<()> {
        let mut state = self.lock();
        state.calls.push(FileCall::Delete(path.to_path_buf()));
        state.files.remove(path).map(|_| ()).ok_or_else(|| missing("delete file", path))
    }

    async fn read_file(&self, path: &Path) -> RollbackResult<String> {
        let mut state = self.lock();
        state.calls.push(FileCall::Read(path.to_path_buf()));
        state.files.get(path).cloned().ok_or_else(|| missing("read file", path))
    }

    async fn exists(&self, path: &Path) -> bool {
        let mut state = self.lock();
        state.calls.push(FileCall::Exists(path.to_path_buf()));
        state.files.contains_key(path)
    }

    async fn list_files(&self, dir: &Path) -> RollbackResult<Vec<PathBuf>> {
        let mut state = self.lock();
        state.calls.push(FileCall::List(dir.to_path_buf()));
        Ok(state
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}

/// Severity of an operator-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Warning,
    Error,
}

/// Operator that answers with pre-scripted choices
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    selection: Option<usize>,
    confirm: bool,
    shown_choices: Mutex<Vec<String>>,
    confirmations: Mutex<Vec<String>>,
    messages: Mutex<Vec<(Notice, String)>>,
}

impl ScriptedPrompt {
    /// Picks `selection` (None aborts the selection) and answers `confirm`
    pub fn new(selection: Option<usize>, confirm: bool) -> Self {
        ScriptedPrompt {
            selection,
            confirm,
            ..Default::default()
        }
    }

    pub fn shown_choices(&self) -> Vec<String> {
        self.shown_choices.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<(Notice, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn has_message(&self, level: Notice, needle: &str) -> bool {
        self.messages()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    fn push(&self, level: Notice, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((level, message.to_string()));
        }
    }
}

impl OperatorPrompt for ScriptedPrompt {
    fn select(&self, _message: &str, choices: &[String]) -> RollbackResult<Option<usize>> {
        if let Ok(mut shown) = self.shown_choices.lock() {
            shown.extend(choices.iter().cloned());
        }
        Ok(self.selection)
    }

    fn confirm(&self, message: &str) -> RollbackResult<bool> {
        if let Ok(mut asked) = self.confirmations.lock() {
            asked.push(message.to_string());
        }
        Ok(self.confirm)
    }

    fn info(&self, message: &str) {
        self.push(Notice::Info, message);
    }

    fn success(&self, message: &str) {
        self.push(Notice::Success, message);
    }

    fn warning(&self, message: &str) {
        self.push(Notice::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(Notice::Error, message);
    }
}

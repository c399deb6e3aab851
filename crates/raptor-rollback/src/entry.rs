//! Rollback entries: the compensating records kept in the history log

use crate::collaborators::{ColumnDef, RowValue};
use crate::error::{RollbackError, RollbackResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of forward mutation an entry compensates for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollbackKind {
    /// A model file was added
    AddModel,
    /// A model (table and file) was renamed
    RenameModel,
    /// A model (table and file) was deleted
    DeleteModel,
    /// A migration created tables
    Migration,
}

impl RollbackKind {
    /// All kinds, in declaration order
    pub const ALL: [RollbackKind; 4] = [
        RollbackKind::AddModel,
        RollbackKind::RenameModel,
        RollbackKind::DeleteModel,
        RollbackKind::Migration,
    ];

    /// Tag written to the log file
    pub fn as_str(&self) -> &'static str {
        match self {
            RollbackKind::AddModel => "addModel",
            RollbackKind::RenameModel => "renameModel",
            RollbackKind::DeleteModel => "deleteModel",
            RollbackKind::Migration => "migration",
        }
    }

    /// Parse a log tag. Older logs wrote `migrate` for migrations.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "addModel" => Some(RollbackKind::AddModel),
            "renameModel" => Some(RollbackKind::RenameModel),
            "deleteModel" => Some(RollbackKind::DeleteModel),
            "migration" | "migrate" => Some(RollbackKind::Migration),
            _ => None,
        }
    }
}

impl fmt::Display for RollbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an `addModel` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddModelPayload {
    pub model_name: String,
}

/// Payload of a `renameModel` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameModelPayload {
    pub old_name: String,
    pub new_name: String,
}

/// Payload of a `deleteModel` entry: a full snapshot of the dropped table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteModelPayload {
    pub name: String,
    pub column_names: Vec<String>,
    pub column_types: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<RowValue>>,
}

impl DeleteModelPayload {
    /// Build a payload from captured column definitions and rows
    pub fn capture(name: impl Into<String>, columns: &[ColumnDef], rows: Vec<Vec<RowValue>>) -> Self {
        DeleteModelPayload {
            name: name.into(),
            column_names: columns.iter().map(|c| c.name.clone()).collect(),
            column_types: columns.iter().map(|c| c.sql_type.clone()).collect(),
            rows,
        }
    }

    /// Column definitions, pairing names and types positionally
    pub fn columns(&self) -> Vec<ColumnDef> {
        self.column_names
            .iter()
            .zip(&self.column_types)
            .map(|(name, sql_type)| ColumnDef::new(name.clone(), sql_type.clone()))
            .collect()
    }

    /// Check that names, types and row widths line up
    pub fn validate(&self) -> RollbackResult<()> {
        if self.column_names.len() != self.column_types.len() {
            return Err(RollbackError::validation(format!(
                "model '{}' has {} column names but {} column types",
                self.name,
                self.column_names.len(),
                self.column_types.len()
            )));
        }
        if self.column_names.is_empty() {
            return Err(RollbackError::validation(format!(
                "model '{}' has no columns to restore",
                self.name
            )));
        }
        if let Some((i, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.column_names.len())
        {
            return Err(RollbackError::validation(format!(
                "row {} of model '{}' has {} values, expected {}",
                i,
                self.name,
                row.len(),
                self.column_names.len()
            )));
        }
        Ok(())
    }
}

/// Payload of a `migration` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPayload {
    pub model_names: Vec<String>,
}

/// What to undo, with the data needed to undo it
#[derive(Debug, Clone, PartialEq)]
pub enum RollbackAction {
    AddModel(AddModelPayload),
    RenameModel(RenameModelPayload),
    DeleteModel(DeleteModelPayload),
    Migration(MigrationPayload),
}

impl RollbackAction {
    pub fn add_model(model_name: impl Into<String>) -> Self {
        RollbackAction::AddModel(AddModelPayload {
            model_name: model_name.into(),
        })
    }

    pub fn rename_model(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        RollbackAction::RenameModel(RenameModelPayload {
            old_name: old_name.into(),
            new_name: new_name.into(),
        })
    }

    pub fn delete_model(
        name: impl Into<String>,
        columns: &[ColumnDef],
        rows: Vec<Vec<RowValue>>,
    ) -> Self {
        RollbackAction::DeleteModel(DeleteModelPayload::capture(name, columns, rows))
    }

    pub fn migration<I, S>(model_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RollbackAction::Migration(MigrationPayload {
            model_names: model_names.into_iter().map(Into::into).collect(),
        })
    }

    /// The discriminator of this action
    pub fn kind(&self) -> RollbackKind {
        match self {
            RollbackAction::AddModel(_) => RollbackKind::AddModel,
            RollbackAction::RenameModel(_) => RollbackKind::RenameModel,
            RollbackAction::DeleteModel(_) => RollbackKind::DeleteModel,
            RollbackAction::Migration(_) => RollbackKind::Migration,
        }
    }
}

/// One compensating record in the history log
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackEntry {
    pub action: RollbackAction,
    /// Shown to the operator when choosing what to roll back
    pub recovery_message: String,
    /// When the entry was registered; absent in logs written by older versions
    pub recorded_at: Option<DateTime<Utc>>,
}

impl RollbackEntry {
    /// Create an entry stamped with the current time
    pub fn new(action: RollbackAction, recovery_message: impl Into<String>) -> Self {
        RollbackEntry {
            action,
            recovery_message: recovery_message.into(),
            recorded_at: Some(Utc::now()),
        }
    }

    pub fn kind(&self) -> RollbackKind {
        self.action.kind()
    }
}

impl fmt::Display for RollbackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.recorded_at {
            Some(at) => write!(
                f,
                "[{}] {} ({})",
                self.kind(),
                self.recovery_message,
                at.format("%Y-%m-%d %H:%M:%S")
            ),
            None => write!(f, "[{}] {}", self.kind(), self.recovery_message),
        }
    }
}

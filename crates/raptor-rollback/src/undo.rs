//! Replays a rollback entry against the schema store and the model files

use crate::collaborators::{FilePrimitives, SchemaStore};
use crate::entry::{
    AddModelPayload, DeleteModelPayload, MigrationPayload, RenameModelPayload, RollbackAction,
    RollbackEntry,
};
use crate::error::{RollbackError, RollbackResult};
use crate::model::{render_model_file, ModelLayout};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Stateless dispatcher: one entry in, prior state reconstructed
///
/// A failing step aborts the undo and is reported as
/// [`RollbackError::UndoFailed`]. Steps already applied are not reverted,
/// except for the table rename of a rename-undo whose file rename failed.
pub struct UndoEngine {
    schema: Arc<dyn SchemaStore>,
    files: Arc<dyn FilePrimitives>,
    layout: ModelLayout,
}

impl UndoEngine {
    pub fn new(schema: Arc<dyn SchemaStore>, files: Arc<dyn FilePrimitives>, layout: ModelLayout) -> Self {
        UndoEngine {
            schema,
            files,
            layout,
        }
    }

    pub fn layout(&self) -> &ModelLayout {
        &self.layout
    }

    /// Undo the forward mutation described by `entry`
    pub async fn undo(&self, entry: &RollbackEntry) -> RollbackResult<()> {
        debug!(kind = %entry.kind(), "Undoing: {}", entry.recovery_message);
        let result = match &entry.action {
            RollbackAction::AddModel(p) => self.undo_add_model(entry, p).await,
            RollbackAction::RenameModel(p) => self.undo_rename_model(entry, p).await,
            RollbackAction::DeleteModel(p) => self.undo_delete_model(entry, p).await,
            RollbackAction::Migration(p) => self.undo_migration(entry, p).await,
        };

        match &result {
            Ok(()) => info!(kind = %entry.kind(), "Rolled back: {}", entry.recovery_message),
            Err(e) => error!(kind = %entry.kind(), "Rollback failed: {}", e),
        }
        result
    }

    async fn undo_add_model(&self, entry: &RollbackEntry, p: &AddModelPayload) -> RollbackResult<()> {
        let name = &p.model_name;
        self.schema
            .drop_table(name)
            .await
            .map_err(|e| step(entry, format!("drop table '{}'", name), e))?;

        let path = self.layout.model_path(name);
        if self.files.exists(&path).await {
            self.files
                .delete_file(&path)
                .await
                .map_err(|e| step(entry, format!("delete {}", path.display()), e))?;
        } else {
            debug!(path = %path.display(), "Model file already absent");
        }
        Ok(())
    }

    async fn undo_rename_model(&self, entry: &RollbackEntry, p: &RenameModelPayload) -> RollbackResult<()> {
        let (original, current) = (&p.old_name, &p.new_name);
        let original_path = self.layout.model_path(original);
        let current_path = self.layout.model_path(current);

        // Both destinations are checked before either store is touched
        if self
            .schema
            .table_exists(original)
            .await
            .map_err(|e| step(entry, format!("look up table '{}'", original), e))?
        {
            return Err(RollbackError::collision(original.clone(), "table"));
        }
        if self.files.exists(&original_path).await {
            return Err(RollbackError::collision(original.clone(), "model file"));
        }

        let has_table = self
            .schema
            .table_exists(current)
            .await
            .map_err(|e| step(entry, format!("look up table '{}'", current), e))?;
        let has_file = self.files.exists(&current_path).await;
        if !has_table && !has_file {
            return Err(step(
                entry,
                format!("rename '{}' back to '{}'", current, original),
                RollbackError::collaborator("lookup", format!("no table or model file named '{}'", current)),
            ));
        }

        if has_table {
            self.schema
                .rename_table(current, original)
                .await
                .map_err(|e| step(entry, format!("rename table '{}' to '{}'", current, original), e))?;
        }

        if has_file {
            if let Err(e) = self.files.rename_file(&current_path, &original_path).await {
                if has_table {
                    if let Err(revert) = self.schema.rename_table(original, current).await {
                        warn!(table = %original, "Could not restore table name after failed file rename: {}", revert);
                    }
                }
                return Err(step(
                    entry,
                    format!("rename {} to {}", current_path.display(), original_path.display()),
                    e,
                ));
            }
        }
        Ok(())
    }

    async fn undo_delete_model(&self, entry: &RollbackEntry, p: &DeleteModelPayload) -> RollbackResult<()> {
        p.validate()?;
        let name = &p.name;
        let path = self.layout.model_path(name);

        if self
            .schema
            .table_exists(name)
            .await
            .map_err(|e| step(entry, format!("look up table '{}'", name), e))?
        {
            return Err(RollbackError::collision(name.clone(), "table"));
        }
        if self.files.exists(&path).await {
            return Err(RollbackError::collision(name.clone(), "model file"));
        }

        // Table first, then the file, then the rows
        let columns = p.columns();
        self.schema
            .create_table(name, &columns)
            .await
            .map_err(|e| step(entry, format!("recreate table '{}'", name), e))?;

        self.files
            .write_file(&path, &render_model_file(name, &columns))
            .await
            .map_err(|e| step(entry, format!("recreate {}", path.display()), e))?;

        for (i, row) in p.rows.iter().enumerate() {
            let values: Vec<_> = p
                .column_names
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();
            self.schema
                .insert_row(name, &values)
                .await
                .map_err(|e| step(entry, format!("restore row {} of '{}'", i, name), e))?;
        }
        debug!(table = %name, rows = p.rows.len(), "Restored deleted model");
        Ok(())
    }

    async fn undo_migration(&self, entry: &RollbackEntry, p: &MigrationPayload) -> RollbackResult<()> {
        for name in &p.model_names {
            self.schema
                .drop_table(name)
                .await
                .map_err(|e| step(entry, format!("drop table '{}'", name), e))?;
        }
        Ok(())
    }
}

fn step(entry: &RollbackEntry, what: String, source: RollbackError) -> RollbackError {
    RollbackError::undo_failed(entry.recovery_message.clone(), what, source)
}

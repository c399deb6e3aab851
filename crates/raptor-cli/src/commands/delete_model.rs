// Delete a model, keeping enough to restore it

use super::{check_model_name, open_initialized, record, Command};
use crate::context::ProjectContext;
use crate::error::{CliError, CliResult};
use crate::output;
use async_trait::async_trait;
use raptor_rollback::model::DEFAULT_PRIMARY_KEY;
use raptor_rollback::{parse_model_fields, ColumnDef, RollbackAction};
use std::path::PathBuf;
use tracing::warn;

pub struct DeleteModelCommand {
    pub project_root: PathBuf,
    pub name: String,
}

impl DeleteModelCommand {
    pub fn new(project_root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            name: name.into(),
        }
    }

    /// Snapshot columns and rows, then delete the file and drop the table
    ///
    /// Columns come from the table when it exists, otherwise from the model
    /// file. Returns the number of rows captured.
    pub async fn apply(&self, ctx: &ProjectContext) -> CliResult<usize> {
        let name = self.name.as_str();
        check_model_name(name)?;

        let path = ctx.layout().model_path(name);
        let has_file = ctx.files().exists(&path).await;
        let has_table = ctx.schema().table_exists(name).await?;
        if !has_file && !has_table {
            return Err(CliError::ModelNotFound { name: name.to_string() });
        }

        let source = if has_file {
            Some(ctx.files().read_file(&path).await?)
        } else {
            None
        };

        let (columns, rows) = if has_table {
            let columns = ctx.schema().describe_table(name).await?;
            let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
            let rows = ctx.schema().fetch_rows(name, &names).await?;
            (columns, rows)
        } else {
            let columns = source
                .as_deref()
                .and_then(parse_model_fields)
                .filter(|columns| !columns.is_empty())
                .unwrap_or_else(|| {
                    warn!(model = name, "Model file declares no fields, restoring it would use the default key");
                    vec![ColumnDef::new(DEFAULT_PRIMARY_KEY.0, DEFAULT_PRIMARY_KEY.1)]
                });
            (columns, Vec::new())
        };
        let row_count = rows.len();
        let action = RollbackAction::delete_model(name, &columns, rows);

        if has_file {
            ctx.files().delete_file(&path).await?;
        }
        if has_table {
            if let Err(e) = ctx.schema().drop_table(name).await {
                if let Some(source) = &source {
                    if let Err(restore) = ctx.files().write_file(&path, source).await {
                        warn!(path = %path.display(), "Could not restore model file: {}", restore);
                    }
                }
                return Err(e.into());
            }
        }

        record(
            ctx,
            action,
            format!("Deleted model {} with {} rows", name, row_count),
        )
        .await;
        Ok(row_count)
    }
}

#[async_trait]
impl Command for DeleteModelCommand {
    async fn execute(&self) -> CliResult<()> {
        let ctx = open_initialized(&self.project_root).await?;
        let rows = self.apply(&ctx).await?;
        output::print_success(&format!("Deleted model \"{}\" ({} rows saved for rollback)", self.name, rows));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Harness;
    use raptor_rollback::testing::SchemaCall;
    use raptor_rollback::{RollbackAction, RollbackKind};
    use serde_json::json;
    use std::path::Path;

    const USERS: &str = "/proj/src/models/users.js";

    fn users() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "INTEGER PRIMARY KEY"),
            ColumnDef::new("name", "TEXT"),
        ]
    }

    #[tokio::test]
    async fn test_delete_captures_rows_before_dropping() {
        let h = Harness::new();
        h.files.seed(USERS, "export const fields = { id: \"INTEGER PRIMARY KEY\", name: \"TEXT\" };");
        h.schema.seed_table("users", &users());
        h.schema.seed_rows(
            "users",
            vec![vec![json!(1), json!("ann")], vec![json!(2), json!("bob")]],
        );

        let rows = DeleteModelCommand::new("/proj", "users").apply(&h.ctx).await.unwrap();

        assert_eq!(rows, 2);
        assert!(!h.files.contains(Path::new(USERS)));
        assert_eq!(h.schema.mutations(), vec![SchemaCall::DropTable("users".to_string())]);

        let entries = h.history.read().await;
        assert_eq!(entries[0].kind(), RollbackKind::DeleteModel);
        assert_eq!(entries[0].recovery_message, "Deleted model users with 2 rows");
        match &entries[0].action {
            RollbackAction::DeleteModel(payload) => {
                assert_eq!(payload.columns(), users());
                assert_eq!(payload.rows[1], vec![json!(2), json!("bob")]);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_without_table_uses_model_fields() {
        let h = Harness::new();
        h.files.seed(USERS, "export const fields = { id: \"INTEGER PRIMARY KEY\", email: 'TEXT' };");

        let rows = DeleteModelCommand::new("/proj", "users").apply(&h.ctx).await.unwrap();

        assert_eq!(rows, 0);
        assert!(h.schema.mutations().is_empty());
        match &h.history.read().await[0].action {
            RollbackAction::DeleteModel(payload) => {
                assert_eq!(payload.column_names, vec!["id".to_string(), "email".to_string()]);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_missing_model_is_refused() {
        let h = Harness::new();
        let result = DeleteModelCommand::new("/proj", "ghost").apply(&h.ctx).await;
        assert!(matches!(result, Err(CliError::ModelNotFound { .. })));
        assert!(h.history.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_drop_restores_file_and_records_nothing() {
        let h = Harness::new();
        h.files.seed(USERS, "original source");
        h.schema.seed_table("users", &users());
        h.schema.fail_on_drop();

        let result = DeleteModelCommand::new("/proj", "users").apply(&h.ctx).await;

        assert!(result.is_err());
        assert_eq!(h.files.content(Path::new(USERS)).as_deref(), Some("original source"));
        assert!(h.history.read().await.is_empty());
    }
}

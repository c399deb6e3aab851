// Rename a model file and its table

use super::{check_model_name, open_initialized, record, Command};
use crate::context::ProjectContext;
use crate::error::{CliError, CliResult};
use crate::output;
use async_trait::async_trait;
use raptor_rollback::RollbackAction;
use std::path::PathBuf;
use tracing::warn;

pub struct RenameModelCommand {
    pub project_root: PathBuf,
    pub old_name: String,
    pub new_name: String,
}

impl RenameModelCommand {
    pub fn new(
        project_root: impl Into<PathBuf>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    /// Rename the file, then the table if there is one
    ///
    /// If the table rename fails the file is moved back and nothing is
    /// recorded.
    pub async fn apply(&self, ctx: &ProjectContext) -> CliResult<()> {
        let (old, new) = (self.old_name.as_str(), self.new_name.as_str());
        check_model_name(old)?;
        check_model_name(new)?;
        if old == new {
            return Err(CliError::InvalidArgument {
                message: format!("\"{}\" is already the model's name", old),
            });
        }

        let old_path = ctx.layout().model_path(old);
        let new_path = ctx.layout().model_path(new);
        if !ctx.files().exists(&old_path).await {
            return Err(CliError::ModelNotFound { name: old.to_string() });
        }
        if ctx.files().exists(&new_path).await || ctx.schema().table_exists(new).await? {
            return Err(CliError::ModelExists { name: new.to_string() });
        }

        let has_table = ctx.schema().table_exists(old).await?;
        ctx.files().rename_file(&old_path, &new_path).await?;
        if has_table {
            if let Err(e) = ctx.schema().rename_table(old, new).await {
                if let Err(revert) = ctx.files().rename_file(&new_path, &old_path).await {
                    warn!(from = %new_path.display(), "Could not move model file back: {}", revert);
                }
                return Err(e.into());
            }
        }

        record(
            ctx,
            RollbackAction::rename_model(old, new),
            format!("Renamed {} to {}", old, new),
        )
        .await;
        Ok(())
    }
}

#[async_trait]
impl Command for RenameModelCommand {
    async fn execute(&self) -> CliResult<()> {
        let ctx = open_initialized(&self.project_root).await?;
        self.apply(&ctx).await?;
        output::print_success(&format!(
            "Model \"{}\" renamed to \"{}\"",
            self.old_name, self.new_name
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Harness;
    use raptor_rollback::testing::{FileCall, SchemaCall};
    use raptor_rollback::{ColumnDef, RollbackKind};
    use std::path::Path;

    const POST: &str = "/proj/src/models/post.js";
    const POSTS: &str = "/proj/src/models/posts.js";

    fn id() -> Vec<ColumnDef> {
        vec![ColumnDef::new("id", "INTEGER PRIMARY KEY")]
    }

    #[tokio::test]
    async fn test_rename_moves_file_and_table() {
        let h = Harness::new();
        h.files.seed(POST, "export const fields = {};");
        h.schema.seed_table("post", &id());

        RenameModelCommand::new("/proj", "post", "posts").apply(&h.ctx).await.unwrap();

        assert!(h.files.contains(Path::new(POSTS)));
        assert!(!h.files.contains(Path::new(POST)));
        assert_eq!(
            h.schema.mutations(),
            vec![SchemaCall::RenameTable("post".to_string(), "posts".to_string())]
        );
        let entries = h.history.read().await;
        assert_eq!(entries[0].kind(), RollbackKind::RenameModel);
        assert_eq!(entries[0].recovery_message, "Renamed post to posts");
    }

    #[tokio::test]
    async fn test_rename_without_table_moves_only_file() {
        let h = Harness::new();
        h.files.seed(POST, "");

        RenameModelCommand::new("/proj", "post", "posts").apply(&h.ctx).await.unwrap();

        assert!(h.schema.mutations().is_empty());
        assert_eq!(h.history.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_model_is_refused() {
        let h = Harness::new();
        let result = RenameModelCommand::new("/proj", "post", "posts").apply(&h.ctx).await;
        assert!(matches!(result, Err(CliError::ModelNotFound { .. })));
        assert!(h.history.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_taken_target_is_refused() {
        let h = Harness::new();
        h.files.seed(POST, "");
        h.schema.seed_table("posts", &id());

        let result = RenameModelCommand::new("/proj", "post", "posts").apply(&h.ctx).await;

        assert!(matches!(result, Err(CliError::ModelExists { .. })));
        assert!(h.files.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_failed_table_rename_moves_file_back() {
        let h = Harness::new();
        h.files.seed(POST, "source");
        h.schema.seed_table("post", &id());
        h.schema.fail_on_rename();

        let result = RenameModelCommand::new("/proj", "post", "posts").apply(&h.ctx).await;

        assert!(matches!(result, Err(CliError::Rollback(_))));
        assert_eq!(
            h.files.mutations(),
            vec![
                FileCall::Rename(PathBuf::from(POST), PathBuf::from(POSTS)),
                FileCall::Rename(PathBuf::from(POSTS), PathBuf::from(POST)),
            ]
        );
        assert_eq!(h.files.content(Path::new(POST)).as_deref(), Some("source"));
        assert!(h.history.read().await.is_empty());
    }
}

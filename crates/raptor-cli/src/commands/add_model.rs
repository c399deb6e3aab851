// Scaffold a new model definition file

use super::{check_model_name, open_initialized, record, Command};
use crate::context::ProjectContext;
use crate::error::{CliError, CliResult};
use crate::output;
use async_trait::async_trait;
use raptor_rollback::model::DEFAULT_PRIMARY_KEY;
use raptor_rollback::{render_model_file, ColumnDef, RollbackAction};
use std::path::PathBuf;

/// Create `src/models/<name>.<ext>` from the model template
pub struct AddModelCommand {
    pub project_root: PathBuf,
    pub name: String,
}

impl AddModelCommand {
    pub fn new(project_root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            name: name.into(),
        }
    }

    /// Write the model file and record an AddModel entry; returns the file path
    pub async fn apply(&self, ctx: &ProjectContext) -> CliResult<PathBuf> {
        check_model_name(&self.name)?;
        let path = ctx.layout().model_path(&self.name);
        if ctx.files().exists(&path).await {
            return Err(CliError::ModelExists {
                name: self.name.clone(),
            });
        }

        let columns = [ColumnDef::new(DEFAULT_PRIMARY_KEY.0, DEFAULT_PRIMARY_KEY.1)];
        ctx.files()
            .write_file(&path, &render_model_file(&self.name, &columns))
            .await?;

        record(ctx, RollbackAction::add_model(&self.name), format!("Added {}", self.name)).await;
        Ok(path)
    }
}

#[async_trait]
impl Command for AddModelCommand {
    async fn execute(&self) -> CliResult<()> {
        let ctx = open_initialized(&self.project_root).await?;
        let path = self.apply(&ctx).await?;
        output::print_success(&format!("Model successfully added as {}", path.display()));
        Ok(())
    }
}

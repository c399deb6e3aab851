// Command handlers for the raptor CLI

pub mod add_model;
pub mod delete_model;
pub mod history;
pub mod migrate;
pub mod rename_model;
pub mod rollback;

pub use add_model::AddModelCommand;
pub use delete_model::DeleteModelCommand;
pub use history::HistoryCommand;
pub use migrate::{MigrateCommand, MigrationReport};
pub use rename_model::RenameModelCommand;
pub use rollback::RollbackCommand;

use crate::context::ProjectContext;
use crate::error::{CliError, CliResult};
use crate::output;
use raptor_rollback::{validate_model_name, RollbackAction};
use raptor_storage::Project;
use std::path::Path;

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}

/// Open the project at `root` for a command that changes models
async fn open_initialized(root: &Path) -> CliResult<ProjectContext> {
    let project = Project::open(root)?;
    project.require_initialized()?;
    ProjectContext::open(&project).await
}

fn check_model_name(name: &str) -> CliResult<()> {
    validate_model_name(name).map_err(|e| CliError::InvalidArgument {
        message: e.to_string(),
    })
}

/// Record the compensating entry for a forward change that already happened
async fn record(ctx: &ProjectContext, action: RollbackAction, recovery_message: String) {
    if !ctx.registrar().register(action, recovery_message).await {
        output::print_warning("Could not record a rollback entry; this change cannot be rolled back");
    }
}

#[cfg(test)]
mod testing;

// Create tables for models that have none yet

use super::{open_initialized, record, Command};
use crate::context::ProjectContext;
use crate::error::CliResult;
use crate::output;
use async_trait::async_trait;
use raptor_rollback::{parse_model_fields, validate_model_name, RollbackAction};
use std::path::Path;
use tracing::{debug, error, warn};

/// What `migrate` did, per model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Tables created, in file order
    pub created: Vec<String>,
    /// Models skipped because their file declares no fields or has an unusable name
    pub skipped: Vec<String>,
    /// Models whose table could not be created, with the reason
    pub failed: Vec<(String, String)>,
}

enum ModelStep {
    Created,
    AlreadyMigrated,
    NoFields,
}

pub struct MigrateCommand {
    pub project_root: std::path::PathBuf,
}

impl MigrateCommand {
    pub fn new(project_root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Create every missing table and record one Migration entry for them
    ///
    /// A failing model does not stop the others; nothing is recorded when no
    /// table was created.
    pub async fn apply(&self, ctx: &ProjectContext) -> CliResult<MigrationReport> {
        let mut report = MigrationReport::default();
        let paths = ctx.files().list_files(ctx.layout().models_dir()).await?;

        for path in paths {
            let Some(name) = ctx.layout().model_name(&path) else {
                debug!(path = %path.display(), "Not a model file");
                continue;
            };
            if let Err(e) = validate_model_name(&name) {
                warn!(path = %path.display(), "Skipping model file: {}", e);
                report.skipped.push(name);
                continue;
            }
            match migrate_model(ctx, &name, &path).await {
                Ok(ModelStep::Created) => report.created.push(name),
                Ok(ModelStep::AlreadyMigrated) => {}
                Ok(ModelStep::NoFields) => report.skipped.push(name),
                Err(e) => {
                    error!(model = %name, "Migration failed: {}", e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        if !report.created.is_empty() {
            let message = format!("Migrated {}", report.created.join(", "));
            record(ctx, RollbackAction::migration(report.created.clone()), message).await;
        }
        Ok(report)
    }
}

async fn migrate_model(ctx: &ProjectContext, name: &str, path: &Path) -> CliResult<ModelStep> {
    if ctx.schema().table_exists(name).await? {
        return Ok(ModelStep::AlreadyMigrated);
    }
    let source = ctx.files().read_file(path).await?;
    let columns = match parse_model_fields(&source) {
        Some(columns) if !columns.is_empty() => columns,
        _ => return Ok(ModelStep::NoFields),
    };
    ctx.schema().create_table(name, &columns).await?;
    debug!(model = name, columns = columns.len(), "Created table");
    Ok(ModelStep::Created)
}

#[async_trait]
impl Command for MigrateCommand {
    async fn execute(&self) -> CliResult<()> {
        let ctx = open_initialized(&self.project_root).await?;
        output::print_info("Starting migration...");
        let report = self.apply(&ctx).await?;

        for name in &report.skipped {
            output::print_warning(&format!("Skipping {}: no 'fields' export found", name));
        }
        for (name, reason) in &report.failed {
            output::print_error(&format!("Migration failed for {}: {}", name, reason));
        }
        if report.created.is_empty() {
            output::print_info("No new migrations needed.");
        } else {
            output::print_success(&format!("Migrated {}", report.created.join(", ")));
        }
        Ok(())
    }
}

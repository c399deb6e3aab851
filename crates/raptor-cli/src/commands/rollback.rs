// Interactive rollback of a recorded change

use super::Command;
use crate::context::ProjectContext;
use crate::error::CliResult;
use crate::prompt::TerminalPrompt;
use async_trait::async_trait;
use raptor_rollback::{FlowOutcome, OperatorPrompt, RollbackFlow};
use raptor_storage::Project;
use std::path::PathBuf;
use tracing::debug;

/// Works with or without `raptor.config.json`; defaults apply when absent
pub struct RollbackCommand {
    pub project_root: PathBuf,
}

impl RollbackCommand {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Run the rollback flow against `ctx`, asking `prompt`
    ///
    /// Only an out-of-range selection surfaces as an error; failed undos are
    /// reported through the prompt and leave the log as it was.
    pub async fn run_with(ctx: &ProjectContext, prompt: &dyn OperatorPrompt) -> CliResult<FlowOutcome> {
        let engine = ctx.engine();
        let outcome = RollbackFlow::new(ctx.history(), &engine, prompt).run().await?;
        debug!(?outcome, "Rollback finished");
        Ok(outcome)
    }
}

#[async_trait]
impl Command for RollbackCommand {
    async fn execute(&self) -> CliResult<()> {
        let project = Project::open(&self.project_root)?;
        let ctx = ProjectContext::open(&project).await?;
        let prompt = TerminalPrompt::stdin();
        Self::run_with(&ctx, &prompt).await?;
        Ok(())
    }
}

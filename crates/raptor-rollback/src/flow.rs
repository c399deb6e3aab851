//! Operator-facing rollback: list, select, confirm, undo, consume

use crate::entry::RollbackEntry;
use crate::error::{RollbackError, RollbackResult};
use crate::history::HistoryStore;
use crate::undo::UndoEngine;
use std::sync::Arc;
use tracing::debug;

/// Interaction with the operator running the rollback
pub trait OperatorPrompt: Send + Sync {
    /// Ask for one of `choices`; `None` when the operator backs out
    fn select(&self, message: &str, choices: &[String]) -> RollbackResult<Option<usize>>;

    /// Ask a yes/no question
    fn confirm(&self, message: &str) -> RollbackResult<bool>;

    fn info(&self, message: &str);

    fn success(&self, message: &str);

    fn warning(&self, message: &str);

    fn error(&self, message: &str);
}

/// How a rollback run ended
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// The log was empty or unusable
    NothingToRollBack,
    /// The operator backed out or declined
    Cancelled,
    /// The entry was undone; `log_updated` is false if it could not be removed
    Applied { entry: RollbackEntry, log_updated: bool },
    /// The undo failed and the entry was left in the log
    Failed { entry: RollbackEntry, reason: String },
}

/// One line of the selection menu
pub fn choice_label(position: usize, entry: &RollbackEntry) -> String {
    format!("{}. {}", position + 1, entry)
}

/// Drives one interactive rollback
pub struct RollbackFlow<'a> {
    history: Arc<HistoryStore>,
    engine: &'a UndoEngine,
    prompt: &'a dyn OperatorPrompt,
}

impl<'a> RollbackFlow<'a> {
    pub fn new(history: Arc<HistoryStore>, engine: &'a UndoEngine, prompt: &'a dyn OperatorPrompt) -> Self {
        RollbackFlow {
            history,
            engine,
            prompt,
        }
    }

    /// Run the flow
    ///
    /// Only internal-consistency failures are returned as errors; everything
    /// the operator can act on is reported through the prompt.
    pub async fn run(&self) -> RollbackResult<FlowOutcome> {
        let entries = match self.history.load().await {
            Ok(decoded) => {
                for warning in &decoded.warnings {
                    self.prompt.warning(&format!("Rollback log {}", warning));
                }
                decoded.entries
            }
            Err(e) => {
                self.prompt.error(&format!("Could not read rollback history: {}", e));
                Vec::new()
            }
        };

        if entries.is_empty() {
            self.prompt.info("Nothing to roll back.");
            return Ok(FlowOutcome::NothingToRollBack);
        }

        let choices: Vec<String> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| choice_label(i, entry))
            .collect();

        let index = match self.prompt.select("Choose a rollback to apply:", &choices)? {
            Some(index) => index,
            None => {
                self.prompt.info("Rollback cancelled.");
                return Ok(FlowOutcome::Cancelled);
            }
        };
        let entry = entries
            .get(index)
            .cloned()
            .ok_or(RollbackError::IndexOutOfRange {
                index,
                len: entries.len(),
            })?;

        let question = format!("Are you sure you want to roll back: {}?", choices[index]);
        if !self.prompt.confirm(&question)? {
            self.prompt.info("Rollback cancelled.");
            return Ok(FlowOutcome::Cancelled);
        }

        if let Err(e) = self.engine.undo(&entry).await {
            if e.is_fatal() {
                return Err(e);
            }
            self.prompt.error(&format!(
                "Could not roll back \"{}\": {}. The entry was kept so you can retry.",
                entry.recovery_message, e
            ));
            return Ok(FlowOutcome::Failed {
                entry,
                reason: e.to_string(),
            });
        }

        let log_updated = match self.history.remove_at(index).await {
            Ok(_) => true,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                self.prompt.error(&format!(
                    "Rolled back \"{}\" but could not update the rollback log: {}",
                    entry.recovery_message, e
                ));
                false
            }
        };
        debug!(index, log_updated, "Rollback applied");

        self.prompt
            .success(&format!("Rolled back: {}", entry.recovery_message));
        Ok(FlowOutcome::Applied { entry, log_updated })
    }
}

// List or clear the rollback log

use super::Command;
use crate::error::CliResult;
use crate::output::{self, OutputStyle};
use async_trait::async_trait;
use raptor_rollback::{choice_label, HistoryStore, RollbackEntry};
use raptor_storage::Project;
use std::path::PathBuf;

pub struct HistoryCommand {
    pub project_root: PathBuf,
    pub clear: bool,
}

impl HistoryCommand {
    pub fn new(project_root: impl Into<PathBuf>, clear: bool) -> Self {
        Self {
            project_root: project_root.into(),
            clear,
        }
    }

    /// Menu lines for `entries`, newest first, numbered like the rollback menu
    pub fn lines(entries: &[RollbackEntry]) -> Vec<String> {
        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| choice_label(i, entry))
            .collect()
    }
}

#[async_trait]
impl Command for HistoryCommand {
    async fn execute(&self) -> CliResult<()> {
        let project = Project::open(&self.project_root)?;
        let history = HistoryStore::for_project(project.root(), project.history_config());
        if let Err(e) = history.ensure_exists().await {
            output::print_error(&format!("Could not create rollback history: {}", e));
            return Ok(());
        }

        if self.clear {
            history.clear().await?;
            output::print_success("Rollback history cleared");
            return Ok(());
        }

        let decoded = match history.load().await {
            Ok(decoded) => decoded,
            Err(e) => {
                output::print_error(&format!("Could not read rollback history: {}", e));
                return Ok(());
            }
        };
        for warning in &decoded.warnings {
            output::print_warning(&format!("Rollback log {}", warning));
        }
        if decoded.entries.is_empty() {
            output::print_info("Nothing to roll back.");
            return Ok(());
        }

        let style = OutputStyle::default();
        println!(
            "{}",
            style.section(&format!(
                "Rollback history ({} of {})",
                decoded.entries.len(),
                history.capacity()
            ))
        );
        for line in Self::lines(&decoded.entries) {
            println!("{}", style.numbered_item(&line));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raptor_rollback::{HistoryConfig, RollbackAction};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lines_are_newest_first() {
        let dir = TempDir::new().unwrap();
        let history = HistoryStore::for_project(dir.path(), HistoryConfig::default());
        history
            .append(RollbackEntry::new(RollbackAction::add_model("a"), "Added a"))
            .await
            .unwrap();
        history
            .append(RollbackEntry::new(RollbackAction::migration(["a"]), "Migrated a"))
            .await
            .unwrap();

        let lines = HistoryCommand::lines(&history.read().await);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1. [migration] Migrated a"));
        assert!(lines[1].starts_with("2. [addModel] Added a"));
    }

    #[tokio::test]
    async fn test_clear_empties_the_log() {
        let dir = TempDir::new().unwrap();
        let history = HistoryStore::for_project(dir.path(), HistoryConfig::default());
        history
            .append(RollbackEntry::new(RollbackAction::add_model("a"), "Added a"))
            .await
            .unwrap();

        HistoryCommand::new(dir.path(), true).execute().await.unwrap();

        assert!(history.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_listing_a_fresh_project_creates_an_empty_log() {
        let dir = TempDir::new().unwrap();

        HistoryCommand::new(dir.path(), false).execute().await.unwrap();

        let history = HistoryStore::for_project(dir.path(), HistoryConfig::default());
        assert!(history.path().exists());
        assert!(history.load().await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_listing_does_not_change_the_log() {
        let dir = TempDir::new().unwrap();
        let history = HistoryStore::for_project(dir.path(), HistoryConfig::default());
        history
            .append(RollbackEntry::new(RollbackAction::add_model("a"), "Added a"))
            .await
            .unwrap();
        let before = tokio::fs::read_to_string(history.path()).await.unwrap();

        HistoryCommand::new(dir.path(), false).execute().await.unwrap();

        assert_eq!(tokio::fs::read_to_string(history.path()).await.unwrap(), before);
    }
}

//! Registration of compensating records by forward-mutating commands
//!
//! Callers must capture everything the undo needs (column definitions, rows)
//! before they perform the destructive part of their mutation.

use crate::entry::{RollbackAction, RollbackEntry};
use crate::error::RollbackResult;
use crate::history::HistoryStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Records rollback entries on behalf of forward commands
#[derive(Debug, Clone)]
pub struct Registrar {
    history: Arc<HistoryStore>,
}

impl Registrar {
    pub fn new(history: Arc<HistoryStore>) -> Self {
        Registrar { history }
    }

    /// Record an entry, logging instead of failing
    ///
    /// Registration never undoes or aborts the forward mutation; the log is a
    /// convenience. Returns whether the entry was recorded.
    pub async fn register(&self, action: RollbackAction, recovery_message: impl Into<String>) -> bool {
        let kind = action.kind();
        match self.try_register(action, recovery_message).await {
            Ok(()) => {
                info!(%kind, "Backup {}", kind);
                true
            }
            Err(e) => {
                warn!(%kind, "Could not record rollback entry: {}", e);
                false
            }
        }
    }

    /// Record an entry, returning any log failure
    pub async fn try_register(
        &self,
        action: RollbackAction,
        recovery_message: impl Into<String>,
    ) -> RollbackResult<()> {
        self.history
            .append(RollbackEntry::new(action, recovery_message))
            .await
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::RollbackKind;
    use crate::history::HistoryConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_register_appends_entry() {
        let dir = TempDir::new().unwrap();
        let registrar = Registrar::new(Arc::new(HistoryStore::for_project(
            dir.path(),
            HistoryConfig::default(),
        )));

        assert!(registrar.register(RollbackAction::add_model("orders"), "Added orders").await);

        let entries = registrar.history().read().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind(), RollbackKind::AddModel);
        assert!(entries[0].recovery_message.contains("orders"));
    }

    #[tokio::test]
    async fn test_register_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        // A directory where the log file should be makes every write fail
        let log_path = dir.path().join("log.json");
        std::fs::create_dir_all(log_path.join("occupied")).unwrap();
        let registrar = Registrar::new(Arc::new(HistoryStore::new(log_path, HistoryConfig::default())));

        assert!(!registrar.register(RollbackAction::add_model("orders"), "Added orders").await);
        assert!(registrar
            .try_register(RollbackAction::add_model("orders"), "Added orders")
            .await
            .is_err());
    }
}

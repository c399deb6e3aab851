//! Bounded, persisted history of rollback entries

use crate::codec::{self, DecodedLog};
use crate::entry::RollbackEntry;
use crate::error::{LogOperation, RollbackError, RollbackResult};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// File name of the log, relative to the project root
pub const LOG_FILE_NAME: &str = ".rollback.backup.json";

/// Entries kept when no valid capacity is configured
pub const DEFAULT_CAPACITY: usize = 5;

/// History sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl HistoryConfig {
    /// Build from a configured value; absent or non-positive means the default
    pub fn from_configured(capacity: Option<i64>) -> Self {
        match capacity {
            Some(n) if n > 0 => HistoryConfig {
                capacity: usize::try_from(n).unwrap_or(DEFAULT_CAPACITY),
            },
            Some(n) => {
                warn!(capacity = n, "Ignoring non-positive rollback capacity, using {}", DEFAULT_CAPACITY);
                HistoryConfig::default()
            }
            None => HistoryConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Sole owner of the on-disk rollback log
///
/// Entries are kept newest first. Every mutation is a read-modify-write of
/// the whole file; the write goes to a temporary sibling that is renamed over
/// the log. Concurrent processes are not coordinated.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, config: HistoryConfig) -> Self {
        HistoryStore {
            path: path.into(),
            capacity: config.capacity.max(1),
        }
    }

    /// Store for the log at `<project_root>/.rollback.backup.json`
    pub fn for_project(project_root: &Path, config: HistoryConfig) -> Self {
        Self::new(project_root.join(LOG_FILE_NAME), config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create parent directories and an empty log if missing
    pub async fn ensure_exists(&self) -> RollbackResult<&Path> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RollbackError::log_access(parent, LogOperation::Create, e))?;
            }
        }

        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            self.write_atomic("[]").await?;
            debug!(path = %self.path.display(), "Created empty rollback log");
        }

        Ok(&self.path)
    }

    /// Read and decode the log, reporting skipped records
    ///
    /// A missing file is an empty log.
    pub async fn load(&self) -> RollbackResult<DecodedLog> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(DecodedLog::default()),
            Err(e) => return Err(RollbackError::log_access(&self.path, LogOperation::Read, e)),
        };

        let decoded = codec::decode_lenient(&text)?;
        for warning in &decoded.warnings {
            warn!(path = %self.path.display(), "Rollback log {}", warning);
        }
        Ok(decoded)
    }

    /// Entries newest first; an unreadable log is logged and read as empty
    pub async fn read(&self) -> Vec<RollbackEntry> {
        match self.load().await {
            Ok(decoded) => decoded.entries,
            Err(e) => {
                error!(path = %self.path.display(), "Error reading rollback log: {}", e);
                Vec::new()
            }
        }
    }

    /// Insert `entry` at the front, evicting the oldest entries beyond capacity
    pub async fn append(&self, entry: RollbackEntry) -> RollbackResult<()> {
        let mut entries = match self.load().await {
            Ok(decoded) => decoded.entries,
            Err(RollbackError::CorruptLog { message }) => {
                self.quarantine(&message).await?;
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if entries.len() >= self.capacity {
            let evicted = entries.len() + 1 - self.capacity;
            entries.truncate(self.capacity - 1);
            debug!(evicted, capacity = self.capacity, "Evicted oldest rollback entries");
        }

        info!(kind = %entry.kind(), "Registered rollback entry: {}", entry.recovery_message);
        entries.insert(0, entry);
        self.write_entries(&entries).await
    }

    /// Remove the entry at `index` and rewrite the log
    pub async fn remove_at(&self, index: usize) -> RollbackResult<RollbackEntry> {
        let mut entries = self.load().await?.entries;
        if index >= entries.len() {
            return Err(RollbackError::IndexOutOfRange {
                index,
                len: entries.len(),
            });
        }

        let removed = entries.remove(index);
        self.write_entries(&entries).await?;
        debug!(index, kind = %removed.kind(), "Removed rollback entry");
        Ok(removed)
    }

    /// Drop every entry
    pub async fn clear(&self) -> RollbackResult<()> {
        self.write_entries(&[]).await
    }

    async fn write_entries(&self, entries: &[RollbackEntry]) -> RollbackResult<()> {
        let text = codec::encode(entries)?;
        self.write_atomic(&text).await
    }

    /// Write to a temporary sibling, then rename over the log
    async fn write_atomic(&self, content: &str) -> RollbackResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RollbackError::log_access(parent, LogOperation::Create, e))?;
            }
        }

        let temp_path = self.sibling(&format!(".tmp-{}", Uuid::new_v4()));
        if let Err(e) = fs::write(&temp_path, content).await {
            return Err(RollbackError::log_access(&temp_path, LogOperation::Write, e));
        }
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(RollbackError::log_access(&self.path, LogOperation::Write, e));
        }
        Ok(())
    }

    /// Move an undecodable log aside so the next write does not destroy it
    async fn quarantine(&self, reason: &str) -> RollbackResult<()> {
        let aside = self.sibling(&format!(".corrupt-{}", Utc::now().format("%Y%m%d_%H%M%S")));
        fs::rename(&self.path, &aside)
            .await
            .map_err(|e| RollbackError::log_access(&self.path, LogOperation::Write, e))?;
        warn!(
            path = %self.path.display(),
            moved_to = %aside.display(),
            "Rollback log was corrupt ({}); starting a new one",
            reason
        );
        Ok(())
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(LOG_FILE_NAME);
        self.path.with_file_name(format!("{}{}", file_name, suffix))
    }
}

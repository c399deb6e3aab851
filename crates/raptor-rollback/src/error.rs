//! Error types for the rollback subsystem

use std::path::PathBuf;
use thiserror::Error;

/// Result type for rollback operations
pub type RollbackResult<T> = Result<T, RollbackError>;

/// Errors that can occur while recording or replaying rollback entries
#[derive(Debug, Error)]
pub enum RollbackError {
    /// The log file could not be read or written
    #[error("Rollback log at {path} is not accessible ({operation}): {source}")]
    LogAccess {
        path: PathBuf,
        operation: LogOperation,
        source: std::io::Error,
    },

    /// The log file does not hold a well-formed sequence of entries
    #[error("Rollback log is corrupt: {message}")]
    CorruptLog { message: String },

    /// A selection index outside `[0, len)`
    #[error("Rollback entry index {index} is out of range (log holds {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A schema-store or filesystem collaborator failed
    #[error("{operation} failed: {message}")]
    Collaborator { operation: String, message: String },

    /// The name a rename-undo would restore is already taken
    #[error("Cannot restore '{name}': a {resource} with that name already exists")]
    TargetNameCollision { name: String, resource: String },

    /// An undo step failed; the entry stays in the log
    #[error("Undo of \"{recovery_message}\" failed while trying to {step}: {source}")]
    UndoFailed {
        recovery_message: String,
        step: String,
        #[source]
        source: Box<RollbackError>,
    },

    /// An entry is internally inconsistent
    #[error("Invalid rollback entry: {0}")]
    Validation(String),
}

/// Log file operation, for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOperation {
    Create,
    Read,
    Write,
}

impl std::fmt::Display for LogOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogOperation::Create => write!(f, "create"),
            LogOperation::Read => write!(f, "read"),
            LogOperation::Write => write!(f, "write"),
        }
    }
}

impl RollbackError {
    /// Create a LogAccess error
    pub fn log_access(
        path: impl Into<PathBuf>,
        operation: LogOperation,
        source: std::io::Error,
    ) -> Self {
        Self::LogAccess {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a CorruptLog error
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptLog {
            message: message.into(),
        }
    }

    /// Create a Collaborator error
    pub fn collaborator(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Collaborator {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create a TargetNameCollision error
    pub fn collision(name: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::TargetNameCollision {
            name: name.into(),
            resource: resource.into(),
        }
    }

    /// Create a Validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap an error raised during one undo step
    pub fn undo_failed(
        recovery_message: impl Into<String>,
        step: impl Into<String>,
        source: RollbackError,
    ) -> Self {
        Self::UndoFailed {
            recovery_message: recovery_message.into(),
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Internal-consistency failures that should end the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, RollbackError::IndexOutOfRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_index_out_of_range_is_fatal() {
        assert!(RollbackError::IndexOutOfRange { index: 3, len: 1 }.is_fatal());
        assert!(!RollbackError::corrupt("bad").is_fatal());
        assert!(!RollbackError::collision("users", "table").is_fatal());
        assert!(!RollbackError::collaborator("drop table", "locked").is_fatal());
    }

    #[test]
    fn test_undo_failed_message_names_entry_and_step() {
        let err = RollbackError::undo_failed(
            "Deleted model users with 2 rows",
            "recreate table 'users'",
            RollbackError::collaborator("create table", "disk I/O error"),
        );
        let msg = err.to_string();
        assert!(msg.contains("Deleted model users with 2 rows"));
        assert!(msg.contains("recreate table 'users'"));
        assert!(msg.contains("disk I/O error"));
    }
}

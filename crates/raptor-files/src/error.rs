//! Error types for file operations

use raptor_rollback::RollbackError;
use std::path::PathBuf;

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// File not found at the specified path
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Destination already exists
    #[error("Conflict detected at {0}: file already exists")]
    ConflictDetected(PathBuf),

    /// Invalid path provided
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Any other IO failure, with the path it concerned
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl FileError {
    /// Classify an IO error raised while working on `path`
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound(path),
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path),
            std::io::ErrorKind::AlreadyExists => FileError::ConflictDetected(path),
            _ => FileError::Io { path, source },
        }
    }

    /// Convert into a collaborator failure for the rollback subsystem
    pub fn into_collaborator(self, operation: &str) -> RollbackError {
        RollbackError::collaborator(operation, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_from_io_classifies_kinds() {
        let p = PathBuf::from("/x");
        assert!(matches!(FileError::from_io(&p, Error::from(ErrorKind::NotFound)), FileError::NotFound(_)));
        assert!(matches!(
            FileError::from_io(&p, Error::from(ErrorKind::PermissionDenied)),
            FileError::PermissionDenied(_)
        ));
        assert!(matches!(FileError::from_io(&p, Error::from(ErrorKind::Other)), FileError::Io { .. }));
    }

    #[test]
    fn test_into_collaborator_keeps_message() {
        let err = FileError::NotFound(PathBuf::from("/proj/src/models/a.js")).into_collaborator("delete file");
        let msg = err.to_string();
        assert!(msg.starts_with("delete file failed"));
        assert!(msg.contains("/proj/src/models/a.js"));
    }
}

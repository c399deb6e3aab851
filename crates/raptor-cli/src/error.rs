// CLI error types and operator-facing messages

use raptor_rollback::RollbackError;
use raptor_storage::StorageError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Model \"{name}\" does not exist")]
    ModelNotFound { name: String },

    #[error("Model \"{name}\" already exists")]
    ModelExists { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Rollback error: {0}")]
    Rollback(#[from] RollbackError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'raptor --help' for usage information.", message)
            }
            CliError::ModelNotFound { name } => {
                format!(
                    "Model \"{}\" does not exist.\n\nModels live in src/models; check the name and try again.",
                    name
                )
            }
            CliError::ModelExists { name } => {
                format!("Model \"{}\" already exists. Choose a different name.", name)
            }
            CliError::Io(e) => {
                format!("File operation failed: {}", e)
            }
            CliError::Config(msg) => {
                format!("Configuration error: {}\n\nCheck raptor.config.json in the project root.", msg)
            }
            CliError::Storage(e @ StorageError::NotAProject { .. }) => {
                format!("{}\n\nRun this command from the project root.", e)
            }
            CliError::Storage(e) => {
                format!("Storage error: {}\n\nCheck the database and raptor.config.json.", e)
            }
            CliError::Rollback(e) => {
                format!("Rollback failed: {}\n\nRun 'raptor history' to inspect the rollback log.", e)
            }
            CliError::Internal(msg) => {
                format!("Internal error: {}\n\nPlease report this issue.", msg)
            }
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_invalid_argument_user_message() {
        let error = CliError::InvalidArgument {
            message: "bad model name".to_string(),
        };
        let msg = error.user_message();
        assert!(msg.contains("bad model name"));
        assert!(msg.contains("raptor --help"));
    }

    #[test]
    fn test_not_a_project_hint() {
        let error = CliError::from(StorageError::NotAProject {
            root: PathBuf::from("/tmp/x"),
            file_name: "raptor.config.json".to_string(),
        });
        let msg = error.user_message();
        assert!(msg.contains("raptor.config.json"));
        assert!(msg.contains("project root"));
    }

    #[test]
    fn test_rollback_error_user_message() {
        let error = CliError::from(RollbackError::IndexOutOfRange { index: 3, len: 1 });
        let msg = error.user_message();
        assert!(msg.starts_with("Rollback failed"));
        assert!(msg.contains("raptor history"));
    }

    #[test]
    fn test_model_errors() {
        let missing = CliError::ModelNotFound { name: "users".to_string() };
        assert_eq!(missing.to_string(), "Model \"users\" does not exist");
        let taken = CliError::ModelExists { name: "posts".to_string() };
        assert!(taken.user_message().contains("Choose a different name"));
    }
}

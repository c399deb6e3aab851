//! Project configuration and the SQLite schema store for raptor projects

pub mod config;
pub mod error;
pub mod sqlite;

pub use config::{ModelExtension, Project, ProjectConfig, CONFIG_FILE_NAME, DEFAULT_DATABASE};
pub use error::{IoOperation, StorageError, StorageResult};
pub use sqlite::{quote_ident, SqliteSchemaStore};

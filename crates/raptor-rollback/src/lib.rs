//! Rollback subsystem for raptor projects
//!
//! Forward commands that add, rename or delete a model, or run a migration,
//! register a compensating [`RollbackEntry`] in a bounded log kept next to the
//! project. The [`UndoEngine`] replays a chosen entry against the schema store
//! and the model files, and [`RollbackFlow`] walks the operator through it.

pub mod codec;
pub mod collaborators;
pub mod entry;
pub mod error;
pub mod flow;
pub mod history;
pub mod model;
pub mod registration;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod undo;

// Re-export public API
pub use codec::{decode, decode_lenient, encode, DecodeWarning, DecodedLog};
pub use collaborators::{ColumnDef, FilePrimitives, RowValue, SchemaStore};
pub use entry::{
    AddModelPayload, DeleteModelPayload, MigrationPayload, RenameModelPayload, RollbackAction,
    RollbackEntry, RollbackKind,
};
pub use error::{LogOperation, RollbackError, RollbackResult};
pub use flow::{choice_label, FlowOutcome, OperatorPrompt, RollbackFlow};
pub use history::{HistoryConfig, HistoryStore, DEFAULT_CAPACITY, LOG_FILE_NAME};
pub use model::{parse_model_fields, render_model_file, validate_model_name, ModelLayout, MODELS_DIR};
pub use registration::Registrar;
pub use undo::UndoEngine;

// Commands wired to in-memory collaborators

use crate::context::ProjectContext;
use raptor_rollback::testing::{RecordingFiles, RecordingSchemaStore};
use raptor_rollback::{HistoryConfig, HistoryStore, ModelLayout};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub struct Harness {
    _dir: TempDir,
    pub ctx: ProjectContext,
    pub schema: Arc<RecordingSchemaStore>,
    pub files: Arc<RecordingFiles>,
    pub history: Arc<HistoryStore>,
}

impl Harness {
    /// Models under `/proj/src/models` with the `js` extension; the log is on disk
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let schema = Arc::new(RecordingSchemaStore::new());
        let files = Arc::new(RecordingFiles::new());
        let history = Arc::new(HistoryStore::for_project(dir.path(), config));
        let ctx = ProjectContext::new(
            ModelLayout::for_project(Path::new("/proj"), "js"),
            schema.clone(),
            files.clone(),
            history.clone(),
        );
        Harness {
            _dir: dir,
            ctx,
            schema,
            files,
            history,
        }
    }
}

// Collaborators shared by the model and rollback commands

use crate::error::CliResult;
use raptor_files::LocalFiles;
use raptor_rollback::{FilePrimitives, HistoryStore, ModelLayout, Registrar, SchemaStore, UndoEngine};
use raptor_storage::{Project, SqliteSchemaStore};
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs to touch a project
///
/// Built once per invocation; commands never open the database or the
/// filesystem on their own.
#[derive(Clone)]
pub struct ProjectContext {
    layout: ModelLayout,
    schema: Arc<dyn SchemaStore>,
    files: Arc<dyn FilePrimitives>,
    history: Arc<HistoryStore>,
}

impl ProjectContext {
    pub fn new(
        layout: ModelLayout,
        schema: Arc<dyn SchemaStore>,
        files: Arc<dyn FilePrimitives>,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self {
            layout,
            schema,
            files,
            history,
        }
    }

    /// Wire SQLite and the local filesystem for `project`
    ///
    /// The rollback log is created empty if it does not exist yet.
    pub async fn open(project: &Project) -> CliResult<Self> {
        let database = project.database_path();
        debug!(root = %project.root().display(), database = %database.display(), "Opening project");
        let schema = SqliteSchemaStore::open(&database)?;
        let history = HistoryStore::for_project(project.root(), project.history_config());
        history.ensure_exists().await?;
        Ok(Self::new(
            project.layout(),
            Arc::new(schema),
            Arc::new(LocalFiles::new()),
            Arc::new(history),
        ))
    }

    pub fn layout(&self) -> &ModelLayout {
        &self.layout
    }

    pub fn schema(&self) -> &dyn SchemaStore {
        self.schema.as_ref()
    }

    pub fn files(&self) -> &dyn FilePrimitives {
        self.files.as_ref()
    }

    pub fn history(&self) -> Arc<HistoryStore> {
        self.history.clone()
    }

    pub fn registrar(&self) -> Registrar {
        Registrar::new(self.history.clone())
    }

    pub fn engine(&self) -> UndoEngine {
        UndoEngine::new(self.schema.clone(), self.files.clone(), self.layout.clone())
    }
}

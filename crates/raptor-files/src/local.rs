//! File primitives on the local filesystem

use crate::error::FileError;
use crate::writer::SafeWriter;
use async_trait::async_trait;
use raptor_rollback::{FilePrimitives, RollbackResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// [`FilePrimitives`] backed by `tokio::fs`
#[derive(Debug, Clone, Default)]
pub struct LocalFiles {
    writer: SafeWriter,
}

impl LocalFiles {
    pub fn new() -> Self {
        LocalFiles {
            writer: SafeWriter::new(),
        }
    }

    async fn ensure_parent(path: &Path) -> Result<(), FileError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| FileError::from_io(parent, e))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FilePrimitives for LocalFiles {
    async fn copy_file(&self, from: &Path, to: &Path) -> RollbackResult<()> {
        Self::ensure_parent(to)
            .await
            .map_err(|e| e.into_collaborator("copy file"))?;
        fs::copy(from, to)
            .await
            .map_err(|e| FileError::from_io(from, e).into_collaborator("copy file"))?;
        debug!(from = %from.display(), to = %to.display(), "Copied file");
        Ok(())
    }

    async fn rename_file(&self, from: &Path, to: &Path) -> RollbackResult<()> {
        if fs::try_exists(to).await.unwrap_or(false) {
            return Err(FileError::ConflictDetected(to.to_path_buf()).into_collaborator("rename file"));
        }
        fs::rename(from, to)
            .await
            .map_err(|e| FileError::from_io(from, e).into_collaborator("rename file"))?;
        debug!(from = %from.display(), to = %to.display(), "Renamed file");
        Ok(())
    }

    async fn write_file(&self, path: &Path, content: &str) -> RollbackResult<()> {
        self.writer
            .write(path, content)
            .await
            .map_err(|e| e.into_collaborator("write file"))?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> RollbackResult<()> {
        fs::remove_file(path)
            .await
            .map_err(|e| FileError::from_io(path, e).into_collaborator("delete file"))?;
        debug!(path = %path.display(), "Removed file");
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> RollbackResult<String> {
        fs::read_to_string(path)
            .await
            .map_err(|e| FileError::from_io(path, e).into_collaborator("read file"))
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn list_files(&self, dir: &Path) -> RollbackResult<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FileError::from_io(dir, e).into_collaborator("list files")),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FileError::from_io(dir, e).into_collaborator("list files"))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if is_file {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

//! Atomic file writes: temp sibling, then rename

use crate::error::FileError;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Writes whole files so that readers see either the old or the new content
#[derive(Debug, Clone, Default)]
pub struct SafeWriter;

impl SafeWriter {
    pub fn new() -> Self {
        SafeWriter
    }

    /// Write `content` to `path`, creating parent directories
    ///
    /// The content goes to a temporary file next to `path`, which is then
    /// renamed over it. The temporary file is removed if the rename fails.
    pub async fn write(&self, path: &Path, content: &str) -> Result<(), FileError> {
        if path.file_name().is_none() {
            return Err(FileError::InvalidPath(path.display().to_string()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| FileError::from_io(parent, e))?;
            }
        }

        let temp_path = self.temp_path(path);
        fs::write(&temp_path, content)
            .await
            .map_err(|e| FileError::from_io(&temp_path, e))?;

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(FileError::from_io(path, e));
        }
        Ok(())
    }

    /// Temporary sibling path for `path`
    fn temp_path(&self, path: &Path) -> PathBuf {
        let mut temp_path = path.to_path_buf();
        let file_name = format!(
            ".tmp-{}-{}",
            Uuid::new_v4(),
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("file")
        );
        temp_path.set_file_name(file_name);
        temp_path
    }
}

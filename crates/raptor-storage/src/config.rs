//! Project configuration loaded from `raptor.config.json`

use crate::error::{IoOperation, StorageError, StorageResult};
use raptor_rollback::{HistoryConfig, ModelLayout};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the project configuration, relative to the project root
pub const CONFIG_FILE_NAME: &str = "raptor.config.json";

/// Database used when the configuration does not name one
pub const DEFAULT_DATABASE: &str = "db.sqlite";

/// Language of the generated model files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelExtension {
    #[default]
    Js,
    Ts,
}

impl ModelExtension {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelExtension::Js => "js",
            ModelExtension::Ts => "ts",
        }
    }
}

/// Contents of `raptor.config.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Extension of the files under `src/models`
    #[serde(default)]
    pub extension: ModelExtension,

    /// Number of rollback entries to keep
    #[serde(
        default,
        deserialize_with = "lenient_capacity",
        skip_serializing_if = "Option::is_none"
    )]
    pub rollback_capacity: Option<i64>,

    /// SQLite database, relative to the project root unless absolute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

/// Accept any JSON value for the capacity; anything but an integer is dropped
fn lenient_capacity<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(n)) if n.as_i64().is_some() => n.as_i64(),
        Some(other) => {
            warn!(value = %other, "rollbackCapacity is not an integer, using the default");
            None
        }
    })
}

impl ProjectConfig {
    /// Path of the configuration file under `project_root`
    pub fn path_in(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_FILE_NAME)
    }

    /// Load the configuration of the project at `project_root`
    ///
    /// Returns `Ok(None)` when the project has no configuration file.
    pub fn load(project_root: &Path) -> StorageResult<Option<ProjectConfig>> {
        let path = Self::path_in(project_root);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No project configuration");
                return Ok(None);
            }
            Err(e) => return Err(StorageError::io_error(path, IoOperation::Read, e)),
        };
        Self::load_from_string(&content, &path).map(Some)
    }

    /// Parse configuration JSON; `path` is only used for error context
    pub fn load_from_string(content: &str, path: &Path) -> StorageResult<ProjectConfig> {
        serde_json::from_str(content)
            .map_err(|e| StorageError::parse_error(path.to_path_buf(), "JSON", e.to_string()))
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> StorageResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StorageError::Internal(format!("Failed to serialize to JSON: {}", e)))
    }

    /// Rollback history sizing
    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig::from_configured(self.rollback_capacity)
    }

    /// Where model files live for the project at `project_root`
    pub fn layout(&self, project_root: &Path) -> ModelLayout {
        ModelLayout::for_project(project_root, self.extension.as_str())
    }

    /// Resolved database path for the project at `project_root`
    pub fn database_path(&self, project_root: &Path) -> PathBuf {
        match &self.database {
            Some(db) if db.is_absolute() => db.clone(),
            Some(db) => project_root.join(db),
            None => project_root.join(DEFAULT_DATABASE),
        }
    }
}

/// A project root together with its (possibly defaulted) configuration
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    has_config_file: bool,
}

impl Project {
    /// Open the project at `root`; a missing configuration file means defaults
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Project> {
        let root = root.into();
        let loaded = ProjectConfig::load(&root)?;
        let has_config_file = loaded.is_some();
        Ok(Project {
            config: loaded.unwrap_or_default(),
            root,
            has_config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// True when `raptor.config.json` was found
    pub fn is_initialized(&self) -> bool {
        self.has_config_file
    }

    /// Fail unless the project has a configuration file
    pub fn require_initialized(&self) -> StorageResult<()> {
        if self.has_config_file {
            Ok(())
        } else {
            Err(StorageError::NotAProject {
                root: self.root.clone(),
                file_name: CONFIG_FILE_NAME.to_string(),
            })
        }
    }

    pub fn layout(&self) -> ModelLayout {
        self.config.layout(&self.root)
    }

    pub fn history_config(&self) -> HistoryConfig {
        self.config.history_config()
    }

    pub fn database_path(&self) -> PathBuf {
        self.config.database_path(&self.root)
    }
}

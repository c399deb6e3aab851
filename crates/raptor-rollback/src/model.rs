//! Model definition files: where they live, how they are written and read back

use crate::collaborators::ColumnDef;
use crate::error::{RollbackError, RollbackResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Directory, relative to the project root, holding model files
pub const MODELS_DIR: &str = "src/models";

/// Column every freshly added model starts with
pub const DEFAULT_PRIMARY_KEY: (&str, &str) = ("id", "INTEGER PRIMARY KEY");

/// Location and extension of model definition files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLayout {
    models_dir: PathBuf,
    extension: String,
}

impl ModelLayout {
    pub fn new(models_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        ModelLayout {
            models_dir: models_dir.into(),
            extension: extension.into(),
        }
    }

    /// Layout rooted at `<project_root>/src/models`
    pub fn for_project(project_root: &Path, extension: impl Into<String>) -> Self {
        Self::new(project_root.join(MODELS_DIR), extension)
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the definition file for `model`
    pub fn model_path(&self, model: &str) -> PathBuf {
        self.models_dir.join(format!("{}.{}", model, self.extension))
    }

    /// Model name for a file in the models directory, if it has our extension
    pub fn model_name(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?;
        if ext != self.extension {
            return None;
        }
        path.file_stem()?.to_str().map(str::to_string)
    }
}

/// Check that a model name is usable as both a file stem and a table name
pub fn validate_model_name(name: &str) -> RollbackResult<()> {
    static NAME: OnceLock<Regex> = OnceLock::new();
    let re = NAME.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));
    if re.is_match(name) {
        Ok(())
    } else {
        Err(RollbackError::validation(format!(
            "'{}' is not a valid model name (letters, digits and '_', not starting with a digit)",
            name
        )))
    }
}

/// Render a model definition file declaring `columns` in order
pub fn render_model_file(model: &str, columns: &[ColumnDef]) -> String {
    let mut out = String::new();
    out.push_str(&format!("export const tableName = \"{}\";\n\n", model));
    out.push_str("export const fields = {\n");
    for column in columns {
        out.push_str(&format!(
            "  {}: \"{}\",\n",
            field_key(&column.name),
            escape(&column.sql_type)
        ));
    }
    out.push_str("};\n");
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(text: &str) -> String {
    text.replace("\\\"", "\"").replace("\\'", "'").replace("\\\\", "\\")
}

/// Object key for `name`: bare when it is an identifier, quoted otherwise
fn field_key(name: &str) -> String {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let re = IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid regex"));
    if re.is_match(name) {
        name.to_string()
    } else {
        format!("\"{}\"", escape(name))
    }
}

/// Read the `fields` declaration of a model file back into column definitions
///
/// Returns `None` when the file has no `fields` object.
pub fn parse_model_fields(source: &str) -> Option<Vec<ColumnDef>> {
    static BLOCK: OnceLock<Regex> = OnceLock::new();
    static FIELD: OnceLock<Regex> = OnceLock::new();

    let block = BLOCK.get_or_init(|| {
        Regex::new(r"(?s)\bfields\b[^=]*=\s*\{(.*?)\}").expect("valid regex")
    });
    // key: bare identifier, "double" or 'single' quoted; value: a quoted string
    let field = FIELD.get_or_init(|| {
        Regex::new(
            r#"(?:([A-Za-z_$][A-Za-z0-9_$]*)|"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')\s*:\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#,
        )
        .expect("valid regex")
    });

    let body = block.captures(source)?.get(1)?.as_str();
    let columns = field
        .captures_iter(body)
        .filter_map(|caps| {
            let name = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?.as_str();
            let sql_type = caps.get(4).or_else(|| caps.get(5))?.as_str();
            Some(ColumnDef::new(unescape(name), unescape(sql_type)))
        })
        .collect();
    Some(columns)
}

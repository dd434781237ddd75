//! Engine configuration record.
//!
//! # Responsibility
//! - Replace ad-hoc option lookups with one typed record and documented
//!   defaults.
//! - Load and validate configuration from JSON.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - File types are extensions with a leading dot.

use crate::logging::{default_log_level, normalize_level};
use crate::surface::ViewColumn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_GRAPH_TYPE: &str = "d3";
const DEFAULT_MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_LOG_FILES: usize = 5;

/// Configuration loading/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// File type is blank or lacks the leading dot.
    InvalidFileType(String),
    BlankGraphType,
    InvalidLogLevel(String),
    /// Rotation limits must be positive.
    InvalidLogRotation,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidFileType(value) => {
                write!(f, "file type must look like `.ext`, got `{value}`")
            }
            Self::BlankGraphType => write!(f, "graph type must not be blank"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidLogRotation => {
                write!(f, "log rotation limits must be greater than zero")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Rolling file log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute log directory; `None` disables file logging.
    pub dir: Option<PathBuf>,
    pub max_file_bytes: u64,
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
            max_file_bytes: DEFAULT_MAX_LOG_FILE_BYTES,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

/// Graph engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphConfig {
    /// Column new graph surfaces open in.
    pub show_column: ViewColumn,
    /// Column documents open in after a node click.
    pub open_column: ViewColumn,
    /// Extensions the file watcher reacts to.
    pub file_types: Vec<String>,
    /// Renderer directory under `graphs/` in the surface assets.
    pub graph_type: String,
    pub logging: LoggingConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            show_column: ViewColumn::Beside,
            open_column: ViewColumn::One,
            file_types: vec![".md".to_string(), ".yml".to_string()],
            graph_type: DEFAULT_GRAPH_TYPE.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GraphConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(raw.as_str())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for file_type in &self.file_types {
            let trimmed = file_type.trim();
            if trimmed.len() < 2 || !trimmed.starts_with('.') {
                return Err(ConfigError::InvalidFileType(file_type.clone()));
            }
        }
        if self.graph_type.trim().is_empty() {
            return Err(ConfigError::BlankGraphType);
        }
        normalize_level(self.logging.level.as_str()).map_err(ConfigError::InvalidLogLevel)?;
        if self.logging.max_file_bytes == 0 || self.logging.max_files == 0 {
            return Err(ConfigError::InvalidLogRotation);
        }
        Ok(())
    }

    /// Whether the watcher should react to changes at `path`.
    pub fn accepts_path(&self, path: &str) -> bool {
        self.file_types
            .iter()
            .any(|file_type| path.ends_with(file_type.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, GraphConfig};
    use crate::surface::ViewColumn;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = GraphConfig::from_json_str("{}").expect("empty config should parse");
        assert_eq!(config, GraphConfig::default());
        assert_eq!(config.show_column, ViewColumn::Beside);
        assert_eq!(config.open_column, ViewColumn::One);
        assert!(config.accepts_path("/ws/a.md"));
        assert!(config.accepts_path("/ws/a.schema.yml"));
        assert!(!config.accepts_path("/ws/a.png"));
    }

    #[test]
    fn parses_camel_case_fields() {
        let config = GraphConfig::from_json_str(
            r#"{"showColumn":"two","openColumn":"active","fileTypes":[".md"],"graphType":"force",
                "logging":{"level":"WARN","maxFiles":2}}"#,
        )
        .expect("config should parse");
        assert_eq!(config.show_column, ViewColumn::Two);
        assert_eq!(config.open_column, ViewColumn::Active);
        assert_eq!(config.graph_type, "force");
        assert_eq!(config.logging.max_files, 2);
        assert!(!config.accepts_path("/ws/a.yml"));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = GraphConfig::from_json_str(r#"{"fileTypes":["md"]}"#)
            .expect_err("file type without dot must fail");
        assert!(matches!(err, ConfigError::InvalidFileType(value) if value == "md"));

        let err = GraphConfig::from_json_str(r#"{"graphType":"  "}"#)
            .expect_err("blank graph type must fail");
        assert!(matches!(err, ConfigError::BlankGraphType));

        let err = GraphConfig::from_json_str(r#"{"logging":{"level":"loud"}}"#)
            .expect_err("unknown level must fail");
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));

        let err = GraphConfig::from_json_str(r#"{"showColumn":"nine"}"#)
            .expect_err("unknown column must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"graphType":"tree"}}"#).expect("write config");
        let config = GraphConfig::load(file.path()).expect("config file should load");
        assert_eq!(config.graph_type, "tree");

        let missing = GraphConfig::load(std::path::Path::new("/definitely/missing.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}

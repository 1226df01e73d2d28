use std::path::{Path, PathBuf};

use mentor_core::abstract_editor::DEFAULT_MAX_UNDO;
use mentor_teach::FilterRules;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::log_capture::LogBuffer;

/// Editor configuration loaded from `editor.toml`.
///
/// Every section and key is optional; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub teaching: FilterRules,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_undo: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Start capturing log output into the console buffer immediately.
    pub capture_on_start: bool,
    /// Maximum number of captured entries.
    pub capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capture_on_start: true,
            capacity: 10_000,
        }
    }
}

impl LogConfig {
    /// Applies capacity and capture state to an already installed buffer.
    pub fn apply(&self, buffer: &mut LogBuffer) {
        buffer.set_capacity(self.capacity);
        if self.capture_on_start {
            buffer.enable();
        } else {
            buffer.disable();
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl EditorConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config, falling back to defaults if it cannot be read.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded editor config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("No editor config ({e}), using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EditorConfig::from_toml("").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history.max_undo, DEFAULT_MAX_UNDO);
        assert_eq!(config.teaching.asset_marker, "Blueprint");
        assert!(config.log.capture_on_start);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = EditorConfig::from_toml(
            r#"
            [history]
            max_undo = 16

            [teaching]
            generated_suffix = "_Gen"
            interesting_types = ["Pawn"]

            [log]
            capture_on_start = false
            "#,
        )
        .unwrap();

        assert_eq!(config.history.max_undo, 16);
        assert_eq!(config.teaching.generated_suffix, "_Gen");
        assert_eq!(config.teaching.interesting_types, ["Pawn"]);
        assert_eq!(config.teaching.internal_prefix, "__");
        assert!(config.teaching.default_filters);
        assert!(!config.log.capture_on_start);
        assert_eq!(config.log.capacity, 10_000);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = Path::new("definitely/not/here/editor.toml");
        assert!(matches!(
            EditorConfig::load(path),
            Err(ConfigError::Read { .. })
        ));
        assert_eq!(EditorConfig::load_or_default(path), EditorConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        assert!(EditorConfig::from_toml("[history]\nmax_undo = \"lots\"").is_err());
    }

    #[test]
    fn log_section_reconfigures_installed_buffer() {
        let config = EditorConfig::from_toml("[log]\ncapacity = 3\ncapture_on_start = false").unwrap();
        let mut buffer = LogBuffer::new(LogConfig::default().capacity, true);
        config.log.apply(&mut buffer);

        assert_eq!(buffer.capacity(), 3);
        assert!(!buffer.is_enabled());
    }
}

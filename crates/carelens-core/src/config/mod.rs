//! Configuration management for CareLens.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section is optional in the file; missing keys fall back to
//! the `Default` implementations in [`types`].

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for CareLens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// X-ray heuristic validator thresholds
    pub validator: ValidatorConfig,

    /// Chest X-ray classifier settings
    pub scan: ScanConfig,

    /// Diagnosis model settings
    pub symptom: SymptomConfig,

    /// Chat and summarization settings
    pub assistant: AssistantConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// LLM provider settings
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.carelens.carelens/config.toml
    /// - Linux: ~/.config/carelens/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\carelens\config\config.toml
    ///
    /// Falls back to ~/.carelens/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "carelens", "carelens")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".carelens").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        expand(&self.general.model_dir)
    }

    /// Get the resolved analytics database path (with ~ expansion).
    pub fn database_path(&self) -> PathBuf {
        expand(&self.general.database_path)
    }

    /// Full path of the chest X-ray classifier model.
    pub fn scan_model_path(&self) -> PathBuf {
        self.model_dir().join(&self.scan.model_file)
    }

    /// Full path of the exported diagnosis model.
    pub fn symptom_model_path(&self) -> PathBuf {
        self.model_dir().join(&self.symptom.model_file)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.validator.min_width, 100);
        assert_eq!(config.validator.max_height, 5000);
        assert_eq!(config.scan.image_size, 224);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[validator]"));
        assert!(toml.contains("max_color_diff"));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = Config::from_toml(
            r#"
            [validator]
            max_color_diff = 20.0

            [server]
            port = 9090
            "#,
        )
        .unwrap();
        assert_eq!(config.validator.max_color_diff, 20.0);
        assert_eq!(config.validator.min_contrast, 10.0);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.scan.class_names, vec!["NORMAL", "Pneumonia"]);
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml = Config::default().to_toml().unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(parsed.validator, ValidatorConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scan]\nimage_size = 256\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.scan.image_size, 256);
    }

    #[test]
    fn test_model_paths_join_model_dir() {
        let mut config = Config::default();
        config.general.model_dir = PathBuf::from("/opt/models");
        assert_eq!(
            config.scan_model_path(),
            PathBuf::from("/opt/models/xray_classifier.onnx")
        );
        assert_eq!(
            config.symptom_model_path(),
            PathBuf::from("/opt/models/diagnosis_model.json")
        );
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::from_toml("[validator\nmin_width = 1").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}

//! Configuration management for fairclip.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file both work.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for fairclip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Pretrained model selection
    pub model: ModelConfig,

    /// FairFace dataset location
    pub dataset: DatasetConfig,

    /// Zero-shot classification settings
    pub classify: ClassifyConfig,

    /// Logging settings
    pub logging: LoggingConfig,
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
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.fairclip.fairclip/config.toml
    /// - Linux: ~/.config/fairclip/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\fairclip\config\config.toml
    ///
    /// Falls back to ~/.fairclip/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "fairclip", "fairclip")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".fairclip").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fairface::Split;
    use crate::labels::LabelSet;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.backbone, "ViT-B-32");
        assert_eq!(config.model.datasource, "openai");
        assert_eq!(config.classify.logit_scale, 100.0);
        assert_eq!(config.dataset.split, Split::Train);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[model]"));
        assert!(toml.contains("[classify]"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [model]
            datasource = "laion2b_s34b_b79k"

            [classify]
            labels = "ARGP"
            "#,
        )
        .unwrap();
        assert_eq!(config.model.backbone, "ViT-B-32");
        assert_eq!(config.model.datasource, "laion2b_s34b_b79k");
        assert_eq!(config.classify.labels, LabelSet::Argp);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dataset]\nroot = \"/data/fairface\"\nsplit = \"val\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.dataset.root.as_deref(),
            Some(Path::new("/data/fairface"))
        );
        assert_eq!(config.dataset.split, Split::Val);
    }

    #[test]
    fn test_model_dir_expands_tilde() {
        let config = Config::default();
        assert!(!config.model_dir().to_string_lossy().starts_with('~'));
    }
}

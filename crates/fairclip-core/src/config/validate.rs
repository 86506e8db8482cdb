//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.model.backbone.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.backbone must not be empty".into(),
            ));
        }
        if self.model.datasource.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.datasource must not be empty".into(),
            ));
        }
        if !(self.classify.logit_scale > 0.0 && self.classify.logit_scale.is_finite()) {
            return Err(ConfigError::ValidationError(
                "classify.logit_scale must be a positive number".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}

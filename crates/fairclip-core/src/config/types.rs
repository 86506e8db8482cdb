//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::device::DevicePreference;
use crate::fairface::Split;
use crate::labels::LabelSet;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where ONNX models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.fairclip/models"),
        }
    }
}

/// Pretrained model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Architecture identifier, e.g. "ViT-B-32"
    pub backbone: String,

    /// Checkpoint source the weights were trained on, e.g. "openai"
    pub datasource: String,

    /// Compute device: "auto", "cpu" or "cuda"
    pub device: DevicePreference,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backbone: "ViT-B-32".to_string(),
            datasource: "openai".to_string(),
            device: DevicePreference::Auto,
        }
    }
}

/// FairFace dataset location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Dataset root. `FAIRFACE_PATH` takes precedence when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Default split
    pub split: Split,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: None,
            split: Split::Train,
        }
    }
}

/// Zero-shot classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Multiplier applied to cosine similarities before softmax
    pub logit_scale: f32,

    /// Default label set
    pub labels: LabelSet,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            logit_scale: 100.0,
            labels: LabelSet::RawRace,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

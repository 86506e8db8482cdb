//! Error types for fairclip.
//!
//! Errors are organized by concern so messages carry the context a user needs
//! to fix the problem (file paths, model pairs, manifest rows).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for fairclip operations.
#[derive(Error, Debug)]
pub enum FairclipError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unknown pretrained model
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Model loading or inference errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// FairFace dataset errors
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Embedding store errors
    #[error("Embedding store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pretrained registry errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The (backbone, datasource) pair is not a known pretrained model
    #[error(
        "({backbone}, {datasource}) not found in the pretrained registry. \
         Run `fairclip models list` to see available pairs."
    )]
    UnknownModel {
        backbone: String,
        datasource: String,
    },
}

/// Model loading and inference errors.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A required model file is missing
    #[error("Model file not found at {path}. Run `fairclip models download` first.")]
    NotFound { path: PathBuf },

    /// ONNX Runtime or tokenizer failure
    #[error("{message}")]
    Runtime { message: String },

    /// Image could not be opened or decoded
    #[error("Failed to decode image {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

/// FairFace dataset errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Neither FAIRFACE_PATH nor `dataset.root` is set
    #[error("FAIRFACE_PATH is not set and no dataset.root is configured")]
    RootNotSet,

    /// Manifest CSV could not be read or parsed
    #[error("Failed to read manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// Requested image index is past the end of the split
    #[error("Image index {index} out of range for {split} split ({len} images)")]
    IndexOutOfRange {
        index: usize,
        split: String,
        len: usize,
    },

    /// Unrecognized split or label-set name
    #[error("Unknown {kind}: {value}")]
    UnknownName { kind: &'static str, value: String },
}

/// Embedding store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing an embedding file failed
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a supported `.npy` array
    #[error("Invalid npy file {path}: {message}")]
    Format { path: PathBuf, message: String },
}

/// Convenience type alias for fairclip results.
pub type Result<T> = std::result::Result<T, FairclipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_message_names_pair() {
        let err = FairclipError::from(RegistryError::UnknownModel {
            backbone: "ViT-X".to_string(),
            datasource: "nowhere".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("(ViT-X, nowhere)"), "{msg}");
    }
}

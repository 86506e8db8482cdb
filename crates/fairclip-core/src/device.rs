//! Compute device selection for ONNX Runtime sessions.

use std::fmt;
use std::path::Path;

use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::session::Session;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Device preference from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// CUDA when available, CPU otherwise
    #[default]
    Auto,
    Cpu,
    Cuda,
}

/// The device a session actually runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

fn cuda_available() -> bool {
    CUDAExecutionProvider::default()
        .is_available()
        .unwrap_or(false)
}

/// Resolve a preference to a concrete device.
pub fn select(preference: DevicePreference) -> Device {
    match preference {
        DevicePreference::Cpu => Device::Cpu,
        _ => resolve(preference, cuda_available()),
    }
}

fn resolve(preference: DevicePreference, cuda: bool) -> Device {
    match (preference, cuda) {
        (DevicePreference::Cpu, _) => Device::Cpu,
        (_, true) => Device::Cuda,
        (DevicePreference::Cuda, false) => {
            tracing::warn!("CUDA requested but not available, falling back to cpu");
            Device::Cpu
        }
        (DevicePreference::Auto, false) => Device::Cpu,
    }
}

/// Build an ONNX Runtime session for `model_path` on `device`.
pub(crate) fn load_session(model_path: &Path, device: Device) -> Result<Session, ModelError> {
    if !model_path.exists() {
        return Err(ModelError::NotFound {
            path: model_path.to_path_buf(),
        });
    }

    let mut builder = Session::builder().map_err(|e| ModelError::Runtime {
        message: format!("Failed to create ONNX session builder: {e}"),
    })?;

    if device == Device::Cuda {
        builder = builder
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .map_err(|e| ModelError::Runtime {
                message: format!("Failed to register CUDA execution provider: {e}"),
            })?;
    }

    builder
        .commit_from_file(model_path)
        .map_err(|e| ModelError::Runtime {
            message: format!("Failed to load ONNX model {}: {e}", model_path.display()),
        })
}

//! CLIP vision tower session management and inference.
//!
//! Loads a CLIP vision model exported to ONNX (with projection head) and runs
//! inference to produce image embedding vectors.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::device::{self, Device};
use crate::error::ModelError;

/// Name of the projected embedding output.
const IMAGE_EMBEDS: &str = "image_embeds";

/// Wraps an ONNX Runtime session for the CLIP vision tower.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct VisionSession {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl VisionSession {
    /// Load a CLIP vision tower from an ONNX file.
    pub fn load(model_path: &Path, device: Device) -> Result<Self, ModelError> {
        let session = device::load_session(model_path, device)?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "Loaded vision model from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Run inference on a preprocessed image tensor and return the raw
    /// (unnormalized) projected embedding.
    ///
    /// Input shape: \[1, 3, image_size, image_size\].
    pub fn embed(&self, preprocessed: &Array4<f32>) -> Result<Vec<f32>, ModelError> {
        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data)).map_err(|e| ModelError::Runtime {
            message: format!("Failed to create input tensor: {e}"),
        })?;

        let mut session = self.session.lock().map_err(|e| ModelError::Runtime {
            message: format!("Vision session lock poisoned: {e}"),
        })?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|e| ModelError::Runtime {
                message: format!("Vision inference failed: {e}"),
            })?;

        let image_embeds = outputs
            .iter()
            .find(|(name, _)| *name == IMAGE_EMBEDS)
            .ok_or_else(|| ModelError::Runtime {
                message: format!("Vision model did not produce {IMAGE_EMBEDS}"),
            })?;

        let (shape, data) =
            image_embeds
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| ModelError::Runtime {
                    message: format!("Failed to extract {IMAGE_EMBEDS} tensor: {e}"),
                })?;

        // image_embeds is [1, dim]
        match shape.len() {
            1 => Ok(data.to_vec()),
            2 => {
                let dim = shape[1] as usize;
                Ok(data[..dim].to_vec())
            }
            _ => Err(ModelError::Runtime {
                message: format!("Unexpected {IMAGE_EMBEDS} shape: {:?}", shape),
            }),
        }
    }
}

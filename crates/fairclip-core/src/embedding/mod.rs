//! CLIP image embedding generation.
//!
//! Converts images into L2-normalized embedding vectors using a CLIP vision
//! tower running locally via ONNX Runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fairclip_core::embedding::ImageEncoder;
//!
//! let pretrained = fairclip_core::registry::lookup("ViT-B-32", "openai")?;
//! let engine = ImageEncoder::load(pretrained, &model_dir, Device::Cpu)?;
//! let embedding = engine.encode_path(Path::new("face.jpg"))?;
//! ```

pub(crate) mod preprocess;
pub(crate) mod vision;

use std::path::Path;

use image::DynamicImage;

use crate::device::Device;
use crate::error::ModelError;
use crate::registry::Pretrained;

pub use self::preprocess::{preprocess, PreprocessSpec};
use self::vision::VisionSession;

/// The vision tower ONNX model filename.
pub const VISION_MODEL_FILENAME: &str = "vision_model.onnx";

/// Engine for generating image embeddings.
pub struct ImageEncoder {
    session: VisionSession,
    spec: PreprocessSpec,
}

impl ImageEncoder {
    /// Load the vision tower from a checkpoint directory.
    ///
    /// Expects the ONNX model at `{model_dir}/vision_model.onnx`.
    pub fn load(
        pretrained: &Pretrained,
        model_dir: &Path,
        device: Device,
    ) -> Result<Self, ModelError> {
        let model_path = model_dir.join(VISION_MODEL_FILENAME);
        let session = VisionSession::load(&model_path, device)?;

        Ok(Self {
            session,
            spec: PreprocessSpec {
                image_size: pretrained.image_size,
                mean: pretrained.mean,
                std: pretrained.std,
            },
        })
    }

    /// Generate a normalized embedding for a decoded image.
    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<f32>, ModelError> {
        let tensor = preprocess(image, &self.spec);
        let mut embedding = self.session.embed(&tensor)?;
        crate::math::l2_normalize_in_place(&mut embedding);
        Ok(embedding)
    }

    /// Open, decode and embed an image file.
    pub fn encode_path(&self, path: &Path) -> Result<Vec<f32>, ModelError> {
        let image = image::open(path).map_err(|e| ModelError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.encode(&image)
    }

    /// Check whether the vision model exists in a checkpoint directory.
    pub fn model_exists(model_dir: &Path) -> bool {
        model_dir.join(VISION_MODEL_FILENAME).exists()
    }
}

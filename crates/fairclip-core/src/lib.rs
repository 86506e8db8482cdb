//! fairclip core - CLIP embeddings and zero-shot fairness metrics for FairFace.
//!
//! Encodes FairFace face images with a pretrained CLIP checkpoint running
//! locally on ONNX Runtime, classifies the stored embeddings against race or
//! gender text prompts, and measures the accuracy gap between race groups.
//!
//! # Architecture
//!
//! ```text
//! fface_{split}.csv → image paths → CLIP vision tower → .npy store
//!                                                          ↓
//!               label prompts → CLIP text tower → softmax logits → per-race accuracy → gap
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use fairclip_core::{ClipEncoder, Classifier, Config, EmbeddingStore, LabelSet, Split};
//!
//! let config = Config::load()?;
//! let encoder = ClipEncoder::new("ViT-B-32", "openai", &config)?;
//! let root = fairclip_core::fairface::dataset_root(None, &config)?;
//!
//! let store = EmbeddingStore::new(&root, Split::Val, encoder.backbone(), encoder.datasource());
//! let images = fairclip_core::fairface::get_img_list(&root, Split::Val)?;
//! encoder.batch_encode_imgs(&images, &store, false, |_| {})?;
//!
//! let classifier = Classifier::new(&encoder, LabelSet::RawRace, 100.0)?;
//! let rows = fairclip_core::fairface::load_manifest(&root, Split::Val)?;
//! let report = fairclip_core::classifier::evaluate(&classifier, &rows, &root, &store)?;
//! println!("race gap: {}", report.race_gap);
//! ```

#[cfg(target_os = "macos")]
extern crate blas_src;

pub mod classifier;
pub mod config;
pub mod device;
pub mod embedding;
pub mod encoder;
pub mod error;
pub mod fairface;
pub mod labels;
pub mod math;
pub mod metrics;
pub mod registry;
pub mod store;
pub mod text;

pub use classifier::{Classifier, EvaluationReport, Prediction};
pub use config::Config;
pub use encoder::{ClipEncoder, EncodeStats};
pub use error::{FairclipError, Result};
pub use fairface::Split;
pub use labels::LabelSet;
pub use metrics::measure_race_gap;
pub use store::EmbeddingStore;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

//! CLIP encoder: one pretrained checkpoint's vision and text towers.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::device;
use crate::embedding::ImageEncoder;
use crate::error::Result;
use crate::registry::{self, Pretrained};
use crate::store::{self, EmbeddingStore};
use crate::text::TextEncoder;

/// Directory holding a checkpoint's ONNX files: `{model_dir}/{backbone}/{datasource}`.
pub fn checkpoint_dir(model_dir: &Path, pretrained: &Pretrained) -> PathBuf {
    model_dir
        .join(pretrained.backbone)
        .join(pretrained.datasource)
}

/// Counts from a batch encoding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub encoded: usize,
    pub skipped: usize,
}

/// Loaded CLIP model with its preprocessing, tokenizer and device.
pub struct ClipEncoder {
    pretrained: &'static Pretrained,
    image: ImageEncoder,
    text: TextEncoder,
}

impl ClipEncoder {
    /// Resolve and load a pretrained checkpoint.
    ///
    /// The (backbone, datasource) pair is checked against the registry before
    /// anything is read from disk.
    pub fn new(backbone: &str, datasource: &str, config: &Config) -> Result<Self> {
        let pretrained = registry::lookup(backbone, datasource)?;
        tracing::info!("Loading model: {}", pretrained.pair());

        let device = device::select(config.model.device);
        let dir = checkpoint_dir(&config.model_dir(), pretrained);

        let image = ImageEncoder::load(pretrained, &dir, device)?;
        let text = TextEncoder::load(
            &dir,
            device,
            pretrained.context_length,
            pretrained.pad_token_id,
        )?;

        tracing::info!("Done! {} loaded to {} device", pretrained.pair(), device);

        Ok(Self {
            pretrained,
            image,
            text,
        })
    }

    pub fn backbone(&self) -> &'static str {
        self.pretrained.backbone
    }

    pub fn datasource(&self) -> &'static str {
        self.pretrained.datasource
    }

    /// Encode text strings to normalized embeddings.
    pub fn encode_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(self.text.encode_batch(texts)?)
    }

    /// Encode an image file to a normalized embedding.
    pub fn encode_image(&self, path: &Path) -> Result<Vec<f32>> {
        Ok(self.image.encode_path(path)?)
    }

    /// Encode images one at a time and write each embedding to `store`.
    ///
    /// With `skip_existing`, images that already have an embedding file are
    /// left untouched. `on_progress` is called once per image.
    pub fn batch_encode_imgs(
        &self,
        images: &[PathBuf],
        store: &EmbeddingStore,
        skip_existing: bool,
        on_progress: impl FnMut(&Path),
    ) -> Result<EncodeStats> {
        encode_into_store(
            images,
            store,
            skip_existing,
            |path| self.encode_image(path),
            on_progress,
        )
    }

    /// Read a stored embedding.
    pub fn load_embeddings(path: &Path) -> Result<Vec<f32>> {
        Ok(store::npy::read(path)?)
    }
}

/// Batch loop behind [`ClipEncoder::batch_encode_imgs`], generic over the
/// image encoder.
pub fn encode_into_store(
    images: &[PathBuf],
    store: &EmbeddingStore,
    skip_existing: bool,
    mut encode: impl FnMut(&Path) -> Result<Vec<f32>>,
    mut on_progress: impl FnMut(&Path),
) -> Result<EncodeStats> {
    store.prepare()?;
    tracing::info!("Encoding {} images into {:?}", images.len(), store.dir());

    let mut stats = EncodeStats::default();
    for path in images {
        if skip_existing && store.exists(path) {
            stats.skipped += 1;
        } else {
            let embedding = encode(path)?;
            store.save(path, &embedding)?;
            stats.encoded += 1;
        }
        on_progress(path);
    }

    tracing::info!(
        "Encoded {} images ({} already present)",
        stats.encoded,
        stats.skipped
    );
    Ok(stats)
}

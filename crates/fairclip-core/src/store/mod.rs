//! On-disk embedding store.
//!
//! One `.npy` file per image under
//! `{root}/embeddings/{split}/{backbone}/{datasource}/{imagename}.npy`.

pub mod npy;

use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::fairface::Split;

/// Create a directory and its parents. Succeeds if it already exists.
pub fn prep_folders(path: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Image name used as the embedding file stem: the file name up to its first `.`.
///
/// `train/1.jpg` → `1`, `val/12.face.png` → `12`.
pub fn image_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => file_name,
    }
}

/// Embeddings for one (split, backbone, datasource) combination.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    dir: PathBuf,
}

impl EmbeddingStore {
    /// Store rooted at the dataset root.
    pub fn new(root: &Path, split: Split, backbone: &str, datasource: &str) -> Self {
        Self {
            dir: root
                .join("embeddings")
                .join(split.as_str())
                .join(backbone)
                .join(datasource),
        }
    }

    /// Directory holding the embedding files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the store directory.
    pub fn prepare(&self) -> Result<(), StoreError> {
        prep_folders(&self.dir)
    }

    /// Embedding file path for an image path.
    pub fn path_for(&self, image: &Path) -> PathBuf {
        self.dir.join(format!("{}.npy", image_name(image)))
    }

    /// Whether an embedding has already been written for an image.
    pub fn exists(&self, image: &Path) -> bool {
        self.path_for(image).exists()
    }

    /// Write an image's embedding.
    pub fn save(&self, image: &Path, embedding: &[f32]) -> Result<PathBuf, StoreError> {
        let path = self.path_for(image);
        npy::write(&path, embedding)?;
        Ok(path)
    }

    /// Read an image's embedding.
    pub fn load(&self, image: &Path) -> Result<Vec<f32>, StoreError> {
        npy::read(&self.path_for(image))
    }
}

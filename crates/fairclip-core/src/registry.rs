//! Registry of known pretrained (backbone, datasource) pairs.
//!
//! Each entry points at an ONNX export of the CLIP vision and text towers on
//! the HuggingFace hub and records the preprocessing constants the weights
//! were trained with.

use crate::error::RegistryError;

/// CLIP image normalization mean (per-channel, RGB).
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP image normalization std (per-channel, RGB).
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// CLIP text context length.
const CONTEXT_LENGTH: usize = 77;

/// `<|endoftext|>` id in the OpenAI BPE vocabulary.
const OPENAI_PAD_TOKEN: u32 = 49407;

/// A pretrained CLIP checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Pretrained {
    /// Architecture identifier, e.g. "ViT-B-32"
    pub backbone: &'static str,
    /// Checkpoint source, e.g. "openai"
    pub datasource: &'static str,
    /// HuggingFace repo holding the ONNX export
    pub repo: &'static str,
    /// Square input resolution of the vision tower
    pub image_size: u32,
    /// Token sequence length of the text tower
    pub context_length: usize,
    /// Per-channel normalization mean
    pub mean: [f32; 3],
    /// Per-channel normalization std
    pub std: [f32; 3],
    /// Token id used to pad text sequences
    pub pad_token_id: u32,
}

impl Pretrained {
    /// Display form used in log and error messages: `(backbone, datasource)`.
    pub fn pair(&self) -> String {
        format!("({}, {})", self.backbone, self.datasource)
    }
}

const PRETRAINED: &[Pretrained] = &[
    Pretrained {
        backbone: "ViT-B-32",
        datasource: "openai",
        repo: "Xenova/clip-vit-base-patch32",
        image_size: 224,
        context_length: CONTEXT_LENGTH,
        mean: CLIP_MEAN,
        std: CLIP_STD,
        pad_token_id: OPENAI_PAD_TOKEN,
    },
    Pretrained {
        backbone: "ViT-B-16",
        datasource: "openai",
        repo: "Xenova/clip-vit-base-patch16",
        image_size: 224,
        context_length: CONTEXT_LENGTH,
        mean: CLIP_MEAN,
        std: CLIP_STD,
        pad_token_id: OPENAI_PAD_TOKEN,
    },
    Pretrained {
        backbone: "ViT-L-14",
        datasource: "openai",
        repo: "Xenova/clip-vit-large-patch14",
        image_size: 224,
        context_length: CONTEXT_LENGTH,
        mean: CLIP_MEAN,
        std: CLIP_STD,
        pad_token_id: OPENAI_PAD_TOKEN,
    },
    Pretrained {
        backbone: "ViT-L-14-336",
        datasource: "openai",
        repo: "Xenova/clip-vit-large-patch14-336",
        image_size: 336,
        context_length: CONTEXT_LENGTH,
        mean: CLIP_MEAN,
        std: CLIP_STD,
        pad_token_id: OPENAI_PAD_TOKEN,
    },
    // open_clip tokenizers pad with 0
    Pretrained {
        backbone: "ViT-B-32",
        datasource: "laion2b_s34b_b79k",
        repo: "Xenova/CLIP-ViT-B-32-laion2B-s34B-b79K",
        image_size: 224,
        context_length: CONTEXT_LENGTH,
        mean: CLIP_MEAN,
        std: CLIP_STD,
        pad_token_id: 0,
    },
];

/// All known pretrained pairs.
pub fn list_pretrained() -> &'static [Pretrained] {
    PRETRAINED
}

/// Resolve a (backbone, datasource) pair.
pub fn lookup(backbone: &str, datasource: &str) -> Result<&'static Pretrained, RegistryError> {
    PRETRAINED
        .iter()
        .find(|p| p.backbone == backbone && p.datasource == datasource)
        .ok_or_else(|| RegistryError::UnknownModel {
            backbone: backbone.to_string(),
            datasource: datasource.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_listed_pair_resolves() {
        for p in list_pretrained() {
            let found = lookup(p.backbone, p.datasource).unwrap();
            assert_eq!(found, p);
        }
    }

    #[test]
    fn test_pairs_are_unique() {
        let pairs: HashSet<_> = list_pretrained()
            .iter()
            .map(|p| (p.backbone, p.datasource))
            .collect();
        assert_eq!(pairs.len(), list_pretrained().len());
    }

    #[test]
    fn test_unknown_pair_is_rejected() {
        let err = lookup("ViT-B-32", "imagenet").unwrap_err();
        assert!(err.to_string().contains("(ViT-B-32, imagenet)"));

        // Lookup is exact, no case folding
        assert!(lookup("vit-b-32", "openai").is_err());
    }

    #[test]
    fn test_pair_display() {
        let p = lookup("ViT-B-16", "openai").unwrap();
        assert_eq!(p.pair(), "(ViT-B-16, openai)");
        assert_eq!(p.image_size, 224);
    }
}

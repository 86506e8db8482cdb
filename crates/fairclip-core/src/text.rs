//! CLIP text tower for encoding label prompts.
//!
//! Loads the text ONNX model and its tokenizer, and encodes strings into
//! vectors in the same space as the vision tower's embeddings.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::device::{self, Device};
use crate::error::ModelError;

/// The text tower ONNX model filename.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";

/// The HuggingFace tokenizer filename.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Name of the projected embedding output.
const TEXT_EMBEDS: &str = "text_embeds";

/// CLIP text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the vision tower.
pub struct TextEncoder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    context_length: usize,
    pad_token_id: u32,
    /// Whether the exported graph declares an `attention_mask` input.
    wants_attention_mask: bool,
}

impl TextEncoder {
    /// Load the text encoder from a checkpoint directory.
    ///
    /// Expects `text_model.onnx` and `tokenizer.json` in `model_dir`.
    pub fn load(
        model_dir: &Path,
        device: Device,
        context_length: usize,
        pad_token_id: u32,
    ) -> Result<Self, ModelError> {
        let tokenizer_path = model_dir.join(TOKENIZER_FILENAME);
        if !tokenizer_path.exists() {
            return Err(ModelError::NotFound {
                path: tokenizer_path,
            });
        }

        let session = device::load_session(&model_dir.join(TEXT_MODEL_FILENAME), device)?;

        let mut tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            ModelError::Runtime {
                message: format!("Failed to load tokenizer: {e}"),
            }
        })?;
        // Padding and truncation to context_length happen in pack_tokens.
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(None)
            .map_err(|e| ModelError::Runtime {
                message: format!("Failed to configure tokenizer: {e}"),
            })?;

        let wants_attention_mask = session
            .inputs()
            .iter()
            .any(|i| i.name() == "attention_mask");

        tracing::debug!(
            "Loaded text encoder (inputs: {:?}, outputs: {:?})",
            session
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>(),
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            context_length,
            pad_token_id,
            wants_attention_mask,
        })
    }

    /// Encode a batch of text strings to normalized embeddings.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ModelError::Runtime {
                message: format!("Tokenization failed: {e}"),
            })?;

        let (input_ids, attention_mask) = pack_tokens(
            encodings.iter().map(|e| e.get_ids()),
            self.context_length,
            self.pad_token_id,
        );
        let shape = vec![batch_size as i64, self.context_length as i64];

        let input_ids_value =
            Value::from_array((shape.clone(), input_ids)).map_err(|e| ModelError::Runtime {
                message: format!("Failed to create input_ids tensor: {e}"),
            })?;

        let mut session = self.session.lock().map_err(|e| ModelError::Runtime {
            message: format!("Text encoder lock poisoned: {e}"),
        })?;

        let run_result = if self.wants_attention_mask {
            let mask_value =
                Value::from_array((shape, attention_mask)).map_err(|e| ModelError::Runtime {
                    message: format!("Failed to create attention_mask tensor: {e}"),
                })?;
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => mask_value
            ])
        } else {
            session.run(ort::inputs!["input_ids" => input_ids_value])
        };
        let outputs = run_result.map_err(|e| ModelError::Runtime {
            message: format!("Text encoder inference failed: {e}"),
        })?;

        let text_embeds = outputs
            .iter()
            .find(|(name, _)| *name == TEXT_EMBEDS)
            .ok_or_else(|| ModelError::Runtime {
                message: format!("Text encoder did not produce {TEXT_EMBEDS}"),
            })?;

        let (shape, data) =
            text_embeds
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| ModelError::Runtime {
                    message: format!("Failed to extract {TEXT_EMBEDS}: {e}"),
                })?;

        let dim = match shape.len() {
            2 => shape[1] as usize,
            _ => {
                return Err(ModelError::Runtime {
                    message: format!("Unexpected {TEXT_EMBEDS} shape: {:?}", shape),
                })
            }
        };

        Ok(data
            .chunks(dim)
            .take(batch_size)
            .map(crate::math::l2_normalize)
            .collect())
    }

    /// Check whether the text encoder files exist.
    pub fn model_exists(model_dir: &Path) -> bool {
        model_dir.join(TEXT_MODEL_FILENAME).exists() && model_dir.join(TOKENIZER_FILENAME).exists()
    }
}

/// Pack token id sequences into flat `[batch, context_length]` buffers.
///
/// Sequences are right-padded with `pad_id`. Overlong sequences are cut to
/// `context_length` with their final (end-of-text) token kept in the last slot.
fn pack_tokens<'a>(
    sequences: impl Iterator<Item = &'a [u32]>,
    context_length: usize,
    pad_id: u32,
) -> (Vec<i64>, Vec<i64>) {
    let mut ids = Vec::new();
    let mut mask = Vec::new();

    for seq in sequences {
        let mut row = vec![pad_id as i64; context_length];
        let mut row_mask = vec![0i64; context_length];
        let len = seq.len().min(context_length);
        for (j, &id) in seq.iter().take(len).enumerate() {
            row[j] = id as i64;
            row_mask[j] = 1;
        }
        if seq.len() > context_length && context_length > 0 {
            if let Some(&eot) = seq.last() {
                row[context_length - 1] = eot as i64;
            }
        }
        ids.extend(row);
        mask.extend(row_mask);
    }

    (ids, mask)
}

//! Zero-shot classification of image embeddings against label prompts.
//!
//! Both image and prompt embeddings are L2-normalized, so the dot product is
//! the cosine similarity. Similarities are scaled and softmaxed over prompts,
//! then prompt probabilities are summed per class.

use std::path::Path;

use ndarray::{Array2, ArrayView1};
use serde::Serialize;

use crate::encoder::ClipEncoder;
use crate::error::{ModelError, Result};
use crate::fairface::{self, get_race_dict, ManifestRow, Split};
use crate::labels::{LabelSet, Prompt, Target};
use crate::math::{argmax, softmax};
use crate::metrics::{measure_race_gap, round_to};
use crate::store::EmbeddingStore;

/// Multiplier applied to cosine similarities before softmax.
pub const DEFAULT_LOGIT_SCALE: f32 = 100.0;

/// `softmax(scale · txt · img)`: one probability per text row.
pub fn logits(
    image: &[f32],
    text: &Array2<f32>,
    scale: f32,
) -> std::result::Result<Vec<f32>, ModelError> {
    if text.ncols() != image.len() {
        return Err(ModelError::Runtime {
            message: format!(
                "Embedding dimension mismatch: image has {}, prompts have {}",
                image.len(),
                text.ncols()
            ),
        });
    }
    let sims = text.dot(&ArrayView1::from(image));
    let scaled: Vec<f32> = sims.iter().map(|s| s * scale).collect();
    Ok(softmax(&scaled))
}

/// Probability assigned to one prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptScore {
    pub prompt: String,
    pub class: String,
    pub probability: f32,
}

/// Classification of one image.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Winning class label
    pub class: usize,
    /// Winning class name
    pub class_name: String,
    /// Probability per class, summed over that class's prompts
    pub class_probabilities: Vec<f32>,
    /// Probability per prompt
    pub prompts: Vec<PromptScore>,
}

/// Scores image embeddings against a label set's prompt embeddings.
pub struct Classifier {
    labels: LabelSet,
    prompts: Vec<Prompt>,
    classes: Vec<&'static str>,
    /// Prompt embeddings, one normalized row per prompt.
    text: Array2<f32>,
    logit_scale: f32,
}

impl Classifier {
    /// Encode the label set's prompts with the text tower.
    pub fn new(encoder: &ClipEncoder, labels: LabelSet, logit_scale: f32) -> Result<Self> {
        let prompts = labels.prompts();
        let texts: Vec<String> = prompts.iter().map(|p| p.text.clone()).collect();
        tracing::debug!("Encoding {} prompts for {}", texts.len(), labels);
        let embeddings = encoder.encode_text(&texts)?;
        Self::from_embeddings(labels, embeddings, logit_scale)
    }

    /// Build a classifier from precomputed prompt embeddings (in `labels.prompts()` order).
    pub fn from_embeddings(
        labels: LabelSet,
        embeddings: Vec<Vec<f32>>,
        logit_scale: f32,
    ) -> Result<Self> {
        let prompts = labels.prompts();
        if embeddings.len() != prompts.len() {
            return Err(ModelError::Runtime {
                message: format!(
                    "Expected {} prompt embeddings for {labels}, got {}",
                    prompts.len(),
                    embeddings.len()
                ),
            }
            .into());
        }
        let dim = embeddings.first().map_or(0, Vec::len);
        let flat: Vec<f32> = embeddings.into_iter().flatten().collect();
        let text = Array2::from_shape_vec((prompts.len(), dim), flat).map_err(|e| {
            ModelError::Runtime {
                message: format!("Prompt embeddings have inconsistent dimensions: {e}"),
            }
        })?;

        Ok(Self {
            labels,
            prompts,
            classes: labels.classes(),
            text,
            logit_scale,
        })
    }

    pub fn labels(&self) -> LabelSet {
        self.labels
    }

    /// Classify one normalized image embedding.
    pub fn predict(&self, image: &[f32]) -> Result<Prediction> {
        let probs = logits(image, &self.text, self.logit_scale)?;

        let mut class_probabilities = vec![0f32; self.classes.len()];
        for (prompt, p) in self.prompts.iter().zip(&probs) {
            class_probabilities[prompt.class] += p;
        }
        let class = argmax(&class_probabilities).unwrap_or(0);

        Ok(Prediction {
            class,
            class_name: self.classes[class].to_string(),
            prompts: self
                .prompts
                .iter()
                .zip(probs)
                .map(|(prompt, probability)| PromptScore {
                    prompt: prompt.text.clone(),
                    class: self.classes[prompt.class].to_string(),
                    probability,
                })
                .collect(),
            class_probabilities,
        })
    }
}

/// Classify the image at zero-based `img_number` of a split from its stored
/// embedding.
pub fn run(
    encoder: &ClipEncoder,
    root: &Path,
    split: Split,
    img_number: usize,
    labels: LabelSet,
    logit_scale: f32,
) -> Result<Prediction> {
    let image = fairface::image_at(root, split, img_number)?;

    let store = EmbeddingStore::new(root, split, encoder.backbone(), encoder.datasource());
    let embedding = store.load(&image)?;
    tracing::debug!("Classifying {:?} with {}", image, labels);

    Classifier::new(encoder, labels, logit_scale)?.predict(&embedding)
}

/// Accuracy within one race group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupAccuracy {
    pub race: String,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

/// Result of classifying a whole split.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub labels: LabelSet,
    pub target: Target,
    /// Images classified and compared with ground truth
    pub evaluated: usize,
    /// Rows without a stored embedding
    pub missing_embeddings: usize,
    /// Rows without a usable ground-truth label
    pub unlabelled: usize,
    pub accuracy: f64,
    /// Per-race accuracy, in race-label order; groups with no images are omitted
    pub per_race: Vec<GroupAccuracy>,
    /// Mean minus worst per-race accuracy
    pub race_gap: f64,
}

/// Classify every labelled row that has a stored embedding.
///
/// Accuracy is always grouped by race, whatever attribute the label set predicts.
pub fn evaluate(
    classifier: &Classifier,
    rows: &[ManifestRow],
    root: &Path,
    store: &EmbeddingStore,
) -> Result<EvaluationReport> {
    let races = get_race_dict();
    let mut correct = vec![0usize; races.len()];
    let mut total = vec![0usize; races.len()];
    let mut missing_embeddings = 0;
    let mut unlabelled = 0;

    for row in rows {
        let truth = classifier.labels().truth(row);
        let race = row.race.as_deref().and_then(fairface::race_label);
        let (Some(truth), Some(race)) = (truth, race) else {
            unlabelled += 1;
            continue;
        };

        let image = row.path(root);
        if !store.exists(&image) {
            missing_embeddings += 1;
            continue;
        }

        let embedding = store.load(&image)?;
        let prediction = classifier.predict(&embedding)?;
        total[race] += 1;
        if prediction.class == truth {
            correct[race] += 1;
        }
    }

    if missing_embeddings > 0 {
        tracing::warn!("{missing_embeddings} images have no stored embedding and were skipped");
    }

    let per_race: Vec<GroupAccuracy> = races
        .iter()
        .filter(|&&(_, label)| total[label] > 0)
        .map(|&(name, label)| GroupAccuracy {
            race: name.to_string(),
            correct: correct[label],
            total: total[label],
            accuracy: round_to(correct[label] as f64 / total[label] as f64, 4),
        })
        .collect();

    let evaluated: usize = total.iter().sum();
    let accuracy = if evaluated > 0 {
        round_to(correct.iter().sum::<usize>() as f64 / evaluated as f64, 4)
    } else {
        0.0
    };
    let group_accuracies: Vec<f64> = per_race.iter().map(|g| g.accuracy).collect();

    Ok(EvaluationReport {
        labels: classifier.labels(),
        target: classifier.labels().target(),
        evaluated,
        missing_embeddings,
        unlabelled,
        accuracy,
        race_gap: measure_race_gap(&group_accuracies),
        per_race,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EmbeddingStore;

    /// One-hot prompt embeddings: prompt i points along axis i.
    fn one_hot_classifier(labels: LabelSet) -> Classifier {
        let n = labels.prompts().len();
        let embeddings = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Classifier::from_embeddings(labels, embeddings, DEFAULT_LOGIT_SCALE).unwrap()
    }

    fn axis(n: usize, i: usize) -> Vec<f32> {
        (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_logits_sum_to_one_and_pick_most_similar() {
        let text = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let probs = logits(&[0.6, 0.8], &text, DEFAULT_LOGIT_SCALE).unwrap();
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(probs[1] > probs[0]);
    }

    #[test]
    fn test_logits_dimension_mismatch() {
        let text = Array2::<f32>::zeros((3, 4));
        assert!(logits(&[1.0, 0.0], &text, 1.0).is_err());
    }

    #[test]
    fn test_predict_raw_race() {
        let classifier = one_hot_classifier(LabelSet::RawRace);
        let prediction = classifier.predict(&axis(7, 4)).unwrap();
        assert_eq!(prediction.class, 4);
        assert_eq!(prediction.class_name, "Southeast Asian");
        assert_eq!(prediction.prompts.len(), 7);
    }

    #[test]
    fn test_predict_argp_sums_prompts_per_class() {
        let classifier = one_hot_classifier(LabelSet::Argp);
        // Halfway between "Indian man" (10) and "Indian woman" (11)
        let mut image = vec![0.0; 14];
        image[10] = std::f32::consts::FRAC_1_SQRT_2;
        image[11] = std::f32::consts::FRAC_1_SQRT_2;

        let prediction = classifier.predict(&image).unwrap();
        assert_eq!(prediction.class_name, "Indian");
        assert_eq!(prediction.class_probabilities.len(), 7);
        assert!(prediction.class_probabilities[5] > 0.99);
    }

    #[test]
    fn test_from_embeddings_wrong_count() {
        let result = Classifier::from_embeddings(LabelSet::RawGender, vec![vec![1.0]], 100.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_evaluate_groups_by_race() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let store = EmbeddingStore::new(root, Split::Val, "ViT-B-32", "openai");
        store.prepare().unwrap();

        let row = |file: &str, race: &str| ManifestRow {
            file: file.to_string(),
            age: None,
            gender: Some("Male".into()),
            race: Some(race.to_string()),
        };
        let rows = vec![
            row("val/1.jpg", "White"),
            row("val/2.jpg", "White"),
            row("val/3.jpg", "Black"),
            row("val/4.jpg", "Black"),
            // no embedding on disk
            row("val/5.jpg", "Indian"),
            ManifestRow {
                file: "val/6.jpg".into(),
                age: None,
                gender: None,
                race: None,
            },
        ];

        // White images classified correctly; one Black image misclassified as White.
        store.save(&root.join("val/1.jpg"), &axis(7, 0)).unwrap();
        store.save(&root.join("val/2.jpg"), &axis(7, 0)).unwrap();
        store.save(&root.join("val/3.jpg"), &axis(7, 1)).unwrap();
        store.save(&root.join("val/4.jpg"), &axis(7, 0)).unwrap();

        let classifier = one_hot_classifier(LabelSet::RawRace);
        let report = evaluate(&classifier, &rows, root, &store).unwrap();

        assert_eq!(report.evaluated, 4);
        assert_eq!(report.missing_embeddings, 1);
        assert_eq!(report.unlabelled, 1);
        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.per_race.len(), 2);
        assert_eq!(report.per_race[0].race, "White");
        assert_eq!(report.per_race[0].accuracy, 1.0);
        assert_eq!(report.per_race[1].accuracy, 0.5);
        // mean 0.75, min 0.5
        assert_eq!(report.race_gap, 0.25);
    }
}

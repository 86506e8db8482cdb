//! CLI enum types and shared argument groups.

use clap::{Args, ValueEnum};
use fairclip_core::{Config, LabelSet, Split};

/// Dataset split.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SplitArg {
    Train,
    Val,
}

impl From<SplitArg> for Split {
    fn from(arg: SplitArg) -> Self {
        match arg {
            SplitArg::Train => Split::Train,
            SplitArg::Val => Split::Val,
        }
    }
}

/// Prompt set used for zero-shot classification.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LabelsArg {
    /// Gender names ("Male", "Female")
    #[value(name = "raw_gender")]
    RawGender,
    /// Race names as they appear in the manifest
    #[value(name = "raw_race")]
    RawRace,
    /// "a photo of a {race} person"
    #[value(name = "original_clip")]
    OriginalClip,
    /// "a photo of a {race} man/woman", scored per race
    #[value(name = "ARGP")]
    Argp,
}

impl From<LabelsArg> for LabelSet {
    fn from(arg: LabelsArg) -> Self {
        match arg {
            LabelsArg::RawGender => LabelSet::RawGender,
            LabelsArg::RawRace => LabelSet::RawRace,
            LabelsArg::OriginalClip => LabelSet::OriginalClip,
            LabelsArg::Argp => LabelSet::Argp,
        }
    }
}

/// Pretrained model selection. Unset values fall back to `[model]` in config.
#[derive(Args, Debug, Default, Clone)]
pub struct ModelArgs {
    /// Model architecture, e.g. ViT-B-32
    #[arg(long)]
    pub backbone: Option<String>,

    /// Checkpoint source the weights were trained on, e.g. openai
    #[arg(long)]
    pub datasource: Option<String>,
}

impl ModelArgs {
    /// Resolved (backbone, datasource) pair.
    pub fn resolve(&self, config: &Config) -> (String, String) {
        (
            self.backbone
                .clone()
                .unwrap_or_else(|| config.model.backbone.clone()),
            self.datasource
                .clone()
                .unwrap_or_else(|| config.model.datasource.clone()),
        )
    }
}

/// Split and prompt selection. Unset values fall back to config.
#[derive(Args, Debug, Default, Clone)]
pub struct DataArgs {
    /// Dataset split
    #[arg(long, value_enum)]
    pub split: Option<SplitArg>,

    /// Prompt set for classification
    #[arg(long, value_enum)]
    pub labels: Option<LabelsArg>,

    /// FairFace dataset root (overrides FAIRFACE_PATH)
    #[arg(long = "fairface_path")]
    pub fairface_path: Option<std::path::PathBuf>,
}

impl DataArgs {
    pub fn split(&self, config: &Config) -> Split {
        self.split.map(Split::from).unwrap_or(config.dataset.split)
    }

    pub fn labels(&self, config: &Config) -> LabelSet {
        self.labels
            .map(LabelSet::from)
            .unwrap_or(config.classify.labels)
    }
}

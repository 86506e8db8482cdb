//! Text prompt sets for zero-shot classification.
//!
//! A label set turns the FairFace categories into text prompts. Each prompt
//! votes for one class; several prompts may share a class.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::fairface::{get_gender_dict, get_race_dict, ManifestRow};

/// Available prompt sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelSet {
    /// Gender names verbatim
    #[serde(rename = "raw_gender")]
    RawGender,
    /// Race names verbatim
    #[serde(rename = "raw_race")]
    RawRace,
    /// "a photo of a {race} person"
    #[serde(rename = "original_clip")]
    OriginalClip,
    /// One prompt per race and gender, scored per race
    #[serde(rename = "ARGP")]
    Argp,
}

/// Manifest attribute a label set predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Race,
    Gender,
}

/// A text prompt and the class it votes for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub text: String,
    pub class: usize,
}

impl LabelSet {
    pub const ALL: [LabelSet; 4] = [
        LabelSet::RawGender,
        LabelSet::RawRace,
        LabelSet::OriginalClip,
        LabelSet::Argp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSet::RawGender => "raw_gender",
            LabelSet::RawRace => "raw_race",
            LabelSet::OriginalClip => "original_clip",
            LabelSet::Argp => "ARGP",
        }
    }

    pub fn target(&self) -> Target {
        match self {
            LabelSet::RawGender => Target::Gender,
            _ => Target::Race,
        }
    }

    /// Class names, indexed by class label.
    pub fn classes(&self) -> Vec<&'static str> {
        let dict = match self.target() {
            Target::Race => get_race_dict(),
            Target::Gender => get_gender_dict(),
        };
        dict.iter().map(|&(name, _)| name).collect()
    }

    /// Text prompts in scoring order.
    pub fn prompts(&self) -> Vec<Prompt> {
        match self {
            LabelSet::RawGender => get_gender_dict()
                .iter()
                .map(|&(name, class)| Prompt {
                    text: name.to_string(),
                    class,
                })
                .collect(),
            LabelSet::RawRace => get_race_dict()
                .iter()
                .map(|&(name, class)| Prompt {
                    text: name.to_string(),
                    class,
                })
                .collect(),
            LabelSet::OriginalClip => get_race_dict()
                .iter()
                .map(|&(name, class)| {
                    let race = humanize(name);
                    Prompt {
                        text: format!("a photo of {} {race} person", article(&race)),
                        class,
                    }
                })
                .collect(),
            LabelSet::Argp => get_race_dict()
                .iter()
                .flat_map(|&(name, class)| {
                    let race = humanize(name);
                    ["man", "woman"].into_iter().map(move |noun| Prompt {
                        text: format!("a photo of {} {race} {noun}", article(&race)),
                        class,
                    })
                })
                .collect(),
        }
    }

    /// Ground-truth class of a manifest row, if the row is labelled.
    pub fn truth(&self, row: &ManifestRow) -> Option<usize> {
        match self.target() {
            Target::Race => row
                .race
                .as_deref()
                .and_then(crate::fairface::race_label),
            Target::Gender => row
                .gender
                .as_deref()
                .and_then(crate::fairface::gender_label),
        }
    }
}

/// Race names as they read in a sentence.
fn humanize(name: &str) -> String {
    name.replace('_', "/")
}

fn article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelSet {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabelSet::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| DatasetError::UnknownName {
                kind: "label set",
                value: s.to_string(),
            })
    }
}

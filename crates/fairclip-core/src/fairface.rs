//! FairFace dataset access: splits, manifests and label dictionaries.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::DatasetError;

/// Environment variable locating the dataset root.
pub const FAIRFACE_PATH_ENV: &str = "FAIRFACE_PATH";

/// Race categories and their integer labels.
const RACES: &[(&str, usize)] = &[
    ("White", 0),
    ("Black", 1),
    ("Latino_Hispanic", 2),
    ("East Asian", 3),
    ("Southeast Asian", 4),
    ("Indian", 5),
    ("Middle Eastern", 6),
];

/// Gender categories and their integer labels.
const GENDERS: &[(&str, usize)] = &[("Male", 0), ("Female", 1)];

/// Race name → label mapping, in label order.
pub fn get_race_dict() -> &'static [(&'static str, usize)] {
    RACES
}

/// Gender name → label mapping, in label order.
pub fn get_gender_dict() -> &'static [(&'static str, usize)] {
    GENDERS
}

/// Label for a race name.
pub fn race_label(name: &str) -> Option<usize> {
    lookup(RACES, name)
}

/// Label for a gender name.
pub fn gender_label(name: &str) -> Option<usize> {
    lookup(GENDERS, name)
}

fn lookup(dict: &[(&str, usize)], name: &str) -> Option<usize> {
    dict.iter().find(|(n, _)| *n == name).map(|&(_, label)| label)
}

/// Dataset split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Split::Train),
            "val" => Ok(Split::Val),
            other => Err(DatasetError::UnknownName {
                kind: "split",
                value: other.to_string(),
            }),
        }
    }
}

/// One row of `fface_{split}.csv`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestRow {
    /// Image path relative to the dataset root, e.g. `train/1.jpg`
    pub file: String,

    #[serde(default)]
    pub age: Option<String>,

    #[serde(default)]
    pub gender: Option<String>,

    #[serde(default)]
    pub race: Option<String>,
}

impl ManifestRow {
    /// Absolute image path under `root`.
    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(&self.file)
    }
}

/// Path of a split's manifest.
pub fn manifest_path(root: &Path, split: Split) -> PathBuf {
    root.join(format!("fface_{}.csv", split))
}

/// Load every row of a split's manifest.
pub fn load_manifest(root: &Path, split: Split) -> Result<Vec<ManifestRow>, DatasetError> {
    let path = manifest_path(root, split);
    let manifest_err = |message: String| DatasetError::Manifest {
        path: path.clone(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|e| manifest_err(e.to_string()))?;

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<ManifestRow>, _>>()
        .map_err(|e| manifest_err(e.to_string()))?;

    tracing::debug!("Loaded {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Image paths of a split, in manifest order.
pub fn get_img_list(root: &Path, split: Split) -> Result<Vec<PathBuf>, DatasetError> {
    Ok(load_manifest(root, split)?
        .iter()
        .map(|row| row.path(root))
        .collect())
}

/// Path of the image at zero-based `index` in a split's manifest.
pub fn image_at(root: &Path, split: Split, index: usize) -> Result<PathBuf, DatasetError> {
    let mut images = get_img_list(root, split)?;
    let len = images.len();
    if index >= len {
        return Err(DatasetError::IndexOutOfRange {
            index,
            split: split.to_string(),
            len,
        });
    }
    Ok(images.swap_remove(index))
}

/// Resolve the dataset root.
///
/// Precedence: explicit path, then `FAIRFACE_PATH`, then `dataset.root` in config.
pub fn dataset_root(explicit: Option<&Path>, config: &Config) -> Result<PathBuf, DatasetError> {
    resolve_root(
        explicit,
        std::env::var(FAIRFACE_PATH_ENV).ok(),
        config.dataset.root.as_deref(),
    )
}

fn resolve_root(
    explicit: Option<&Path>,
    env: Option<String>,
    configured: Option<&Path>,
) -> Result<PathBuf, DatasetError> {
    let raw = explicit
        .map(|p| p.to_string_lossy().into_owned())
        .or(env.filter(|v| !v.trim().is_empty()))
        .or_else(|| configured.map(|p| p.to_string_lossy().into_owned()))
        .ok_or(DatasetError::RootNotSet)?;

    Ok(PathBuf::from(shellexpand::tilde(&raw).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(root: &Path, split: Split, body: &str) {
        std::fs::write(manifest_path(root, split), body).unwrap();
    }

    #[test]
    fn test_get_img_list_joins_root() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            Split::Train,
            "file,age,gender,race,service_test\n\
             train/1.jpg,50-59,Male,East Asian,True\n\
             train/2.jpg,30-39,Female,Indian,False\n",
        );

        let list = get_img_list(dir.path(), Split::Train).unwrap();
        assert_eq!(
            list,
            vec![dir.path().join("train/1.jpg"), dir.path().join("train/2.jpg")]
        );
    }

    #[test]
    fn test_manifest_with_only_file_column() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), Split::Val, "file\nval/1.jpg\n");

        let rows = load_manifest(dir.path(), Split::Val).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file, "val/1.jpg");
        assert_eq!(rows[0].race, None);
    }

    #[test]
    fn test_manifest_parses_labels() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            Split::Val,
            "file,age,gender,race\nval/5.jpg,20-29,Female,Latino_Hispanic\n",
        );

        let rows = load_manifest(dir.path(), Split::Val).unwrap();
        assert_eq!(rows[0].gender.as_deref(), Some("Female"));
        assert_eq!(race_label(rows[0].race.as_deref().unwrap()), Some(2));
    }

    #[test]
    fn test_missing_manifest_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = get_img_list(dir.path(), Split::Val).unwrap_err();
        assert!(err.to_string().contains("fface_val.csv"));
    }

    #[test]
    fn test_race_dict_order() {
        let dict = get_race_dict();
        assert_eq!(dict.len(), 7);
        for (i, (_, label)) in dict.iter().enumerate() {
            assert_eq!(*label, i);
        }
        assert_eq!(race_label("Middle Eastern"), Some(6));
        assert_eq!(race_label("Martian"), None);
        assert_eq!(gender_label("Male"), Some(0));
    }

    #[test]
    fn test_split_parse() {
        assert_eq!("train".parse::<Split>().unwrap(), Split::Train);
        assert_eq!("val".parse::<Split>().unwrap(), Split::Val);
        assert!("test".parse::<Split>().is_err());
        assert_eq!(Split::Val.to_string(), "val");
    }

    #[test]
    fn test_resolve_root_precedence() {
        let explicit = Path::new("/explicit");
        let configured = Path::new("/configured");

        assert_eq!(
            resolve_root(Some(explicit), Some("/env".into()), Some(configured)).unwrap(),
            PathBuf::from("/explicit")
        );
        assert_eq!(
            resolve_root(None, Some("/env".into()), Some(configured)).unwrap(),
            PathBuf::from("/env")
        );
        assert_eq!(
            resolve_root(None, Some("  ".into()), Some(configured)).unwrap(),
            PathBuf::from("/configured")
        );
        assert!(matches!(
            resolve_root(None, None, None),
            Err(DatasetError::RootNotSet)
        ));
    }

    #[test]
    fn test_image_at_is_zero_based() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            Split::Val,
            "file,age,gender,race,service_test\n\
             val/1.jpg,3-9,Male,East Asian,False\n\
             val/2.jpg,50-59,Female,East Asian,True\n",
        );

        assert_eq!(
            image_at(dir.path(), Split::Val, 0).unwrap(),
            dir.path().join("val/1.jpg")
        );
        assert_eq!(
            image_at(dir.path(), Split::Val, 1).unwrap(),
            dir.path().join("val/2.jpg")
        );
    }

    #[test]
    fn test_image_at_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            Split::Val,
            "file,age,gender,race,service_test\nval/1.jpg,3-9,Male,White,False\n",
        );

        let err = image_at(dir.path(), Split::Val, 1).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::IndexOutOfRange { index: 1, len: 1, .. }
        ));
        assert!(err.to_string().contains("val"), "{err}");
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use crate::features::prepare::{FeatureLayout, PrepareOptions};

/// Run settings, read from a JSON file. Every field is optional.
///
/// ```json
/// { "data_dir": "data", "target": ["Survived"], "scale": true }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root holding one directory per dataset.
    pub data_dir: PathBuf,
    pub dataset: String,
    /// Cleaned train+test table inside the dataset directory.
    pub combined_file: String,
    pub target: Vec<String>,
    pub drop: Vec<String>,
    pub scale: bool,
    pub layout: FeatureLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            dataset: "titanic".to_string(),
            combined_file: "all_data_clean.csv".to_string(),
            target: vec!["Survived".to_string()],
            drop: vec!["Name".to_string(), "Sex".to_string()],
            scale: true,
            layout: FeatureLayout::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.data_dir.join(&self.dataset)
    }

    pub fn combined_path(&self) -> PathBuf {
        self.dataset_dir().join(&self.combined_file)
    }

    /// The target is the first label column, used to split the combined table.
    pub fn split_column(&self) -> Option<&str> {
        self.target.first().map(String::as_str)
    }

    pub fn prepare_options(&self) -> PrepareOptions {
        PrepareOptions {
            scale: self.scale,
            drop: (!self.drop.is_empty()).then(|| self.drop.clone()),
            target: Some(self.target.clone()),
            layout: self.layout.clone(),
        }
    }
}

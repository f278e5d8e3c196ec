//! Persisted model bundle
//!
//! Six JSON files in one directory, always written and read together:
//!
//! | file | content |
//! |---|---|
//! | `model.json` | voting ensemble |
//! | `num_imputer.json` | numeric imputer |
//! | `bin_imputer.json` | binary imputer |
//! | `scaler.json` | standard scaler |
//! | `pca.json` | PCA projection |
//! | `features.json` | feature names, numeric first |

use crate::ensemble::VotingRegressor;
use crate::error::{PredictorError, Result};
use crate::preprocessing::{FeaturePreprocessor, FeatureSet, Imputer, Pca, StandardScaler};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const MODEL_FILE: &str = "model.json";
pub const NUM_IMPUTER_FILE: &str = "num_imputer.json";
pub const BIN_IMPUTER_FILE: &str = "bin_imputer.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const PCA_FILE: &str = "pca.json";
pub const FEATURES_FILE: &str = "features.json";

/// Every file a complete bundle consists of
pub const BUNDLE_FILES: [&str; 6] = [
    MODEL_FILE,
    NUM_IMPUTER_FILE,
    BIN_IMPUTER_FILE,
    SCALER_FILE,
    PCA_FILE,
    FEATURES_FILE,
];

/// All fitted artifacts of one training run
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub model: VotingRegressor,
    pub numeric_imputer: Imputer,
    pub binary_imputer: Imputer,
    pub scaler: StandardScaler,
    pub pca: Pca,
    /// All feature names, numeric block first
    pub features: Vec<String>,
}

impl ModelBundle {
    pub fn new(preprocessor: &FeaturePreprocessor, model: VotingRegressor) -> Self {
        Self {
            model,
            numeric_imputer: preprocessor.numeric_imputer().clone(),
            binary_imputer: preprocessor.binary_imputer().clone(),
            scaler: preprocessor.scaler().clone(),
            pca: preprocessor.pca().clone(),
            features: preprocessor.feature_set().all_features(),
        }
    }

    /// Bundle files absent from `dir`
    pub fn missing_files(dir: &Path) -> Vec<String> {
        BUNDLE_FILES
            .iter()
            .filter(|name| !dir.join(name).is_file())
            .map(|name| name.to_string())
            .collect()
    }

    /// True only when every bundle file is present
    pub fn exists(dir: &Path) -> bool {
        Self::missing_files(dir).is_empty()
    }

    /// Write all six files, creating `dir` if needed
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        write_json(dir, MODEL_FILE, &self.model)?;
        write_json(dir, NUM_IMPUTER_FILE, &self.numeric_imputer)?;
        write_json(dir, BIN_IMPUTER_FILE, &self.binary_imputer)?;
        write_json(dir, SCALER_FILE, &self.scaler)?;
        write_json(dir, PCA_FILE, &self.pca)?;
        write_json(dir, FEATURES_FILE, &self.features)?;

        info!(dir = %dir.display(), "Saved model bundle");
        Ok(())
    }

    /// Read all six files; any missing file fails the whole load
    pub fn load(dir: &Path) -> Result<Self> {
        let missing = Self::missing_files(dir);
        if !missing.is_empty() {
            return Err(PredictorError::BundleIncomplete(missing));
        }

        let bundle = Self {
            model: read_json(dir, MODEL_FILE)?,
            numeric_imputer: read_json(dir, NUM_IMPUTER_FILE)?,
            binary_imputer: read_json(dir, BIN_IMPUTER_FILE)?,
            scaler: read_json(dir, SCALER_FILE)?,
            pca: read_json(dir, PCA_FILE)?,
            features: read_json(dir, FEATURES_FILE)?,
        };

        info!(dir = %dir.display(), features = bundle.features.len(), "Loaded model bundle");
        Ok(bundle)
    }

    /// Reassemble the preprocessing chain and the ensemble
    pub fn into_parts(self) -> Result<(FeaturePreprocessor, VotingRegressor)> {
        let n_num = self.numeric_imputer.n_features();
        if n_num > self.features.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("at least {} feature names", n_num),
                actual: format!("{} feature names", self.features.len()),
            });
        }

        let feature_set = FeatureSet::new(self.features[..n_num].to_vec(), self.features[n_num..].to_vec())?;
        let preprocessor = FeaturePreprocessor::from_parts(
            feature_set,
            self.numeric_imputer,
            self.binary_imputer,
            self.scaler,
            self.pca,
        )?;

        Ok((preprocessor, self.model))
    }
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(dir.join(name), json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let path = dir.join(name);
    let json = fs::read_to_string(&path)?;
    serde_json::from_str(&json)
        .map_err(|e| PredictorError::SerializationError(format!("{}: {}", path.display(), e)))
}

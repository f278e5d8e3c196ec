//! Feature preprocessing
//!
//! Turns raw property rows into the numeric vectors the ensemble consumes:
//! - Missing value imputation (median for numeric, most frequent for binary)
//! - Standard scaling of the numeric block
//! - Variance-retaining PCA over the concatenated feature vector

mod config;
mod imputer;
mod scaler;
mod pca;
mod pipeline;

pub use config::PreprocessingConfig;
pub use imputer::{Imputer, ImputeStrategy};
pub use scaler::StandardScaler;
pub use pca::{Pca, PcaComponents};
pub use pipeline::FeaturePreprocessor;

use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Numeric columns of the housing dataset, in the order they are fed to the pipeline
pub const NUMERICAL_FEATURES: [&str; 4] = ["Area", "No. of Bedrooms", "Latitude", "Longitude"];

/// A single raw input row: feature name to value.
///
/// `None` marks an explicitly missing value (imputed later); a feature that
/// is absent from the map defaults to `0.0`.
pub type FeatureRow = HashMap<String, Option<f64>>;

/// Ordered feature layout, numeric block first, binary indicators after
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    numerical: Vec<String>,
    binary: Vec<String>,
}

impl FeatureSet {
    /// Create a feature set from explicit numeric and binary column lists
    pub fn new(numerical: Vec<String>, binary: Vec<String>) -> Result<Self> {
        if numerical.is_empty() {
            return Err(PredictorError::ValidationError(
                "Feature set needs at least one numerical feature".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in numerical.iter().chain(binary.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(PredictorError::ValidationError(format!(
                    "Duplicate feature name: {}",
                    name
                )));
            }
        }

        Ok(Self { numerical, binary })
    }

    /// Derive the feature set from dataset columns.
    ///
    /// Every name in `numerical` must be present. Columns listed in
    /// `excluded` are dropped; everything else becomes a binary indicator,
    /// keeping dataset column order.
    pub fn from_columns(columns: &[String], numerical: &[String], excluded: &[String]) -> Result<Self> {
        for name in numerical {
            if !columns.contains(name) {
                return Err(PredictorError::FeatureNotFound(name.clone()));
            }
        }

        let binary: Vec<String> = columns
            .iter()
            .filter(|c| !excluded.contains(*c) && !numerical.contains(*c))
            .cloned()
            .collect();

        Self::new(numerical.to_vec(), binary)
    }

    /// Rebuild the layout from a persisted `all_features` list
    pub fn from_all_features(all_features: &[String], numerical: &[String]) -> Result<Self> {
        Self::from_columns(all_features, numerical, &[])
    }

    pub fn numerical(&self) -> &[String] {
        &self.numerical
    }

    pub fn binary(&self) -> &[String] {
        &self.binary
    }

    /// All feature names, numeric first
    pub fn all_features(&self) -> Vec<String> {
        self.numerical.iter().chain(self.binary.iter()).cloned().collect()
    }

    pub fn n_numerical(&self) -> usize {
        self.numerical.len()
    }

    pub fn n_binary(&self) -> usize {
        self.binary.len()
    }

    pub fn len(&self) -> usize {
        self.numerical.len() + self.binary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lay a raw row out as a 1 x n matrix in feature order.
    ///
    /// Absent features become `0.0`, explicit `None` becomes `NaN`.
    /// Keys that are not part of the feature set are ignored.
    pub fn row_to_matrix(&self, row: &FeatureRow) -> Array2<f64> {
        let values: Vec<f64> = self
            .numerical
            .iter()
            .chain(self.binary.iter())
            .map(|name| match row.get(name) {
                Some(Some(v)) => *v,
                Some(None) => f64::NAN,
                None => 0.0,
            })
            .collect();

        Array1::from_vec(values).insert_axis(Axis(0))
    }
}

/// The default numeric column names as owned strings
pub fn default_numerical_features() -> Vec<String> {
    NUMERICAL_FEATURES.iter().map(|s| s.to_string()).collect()
}

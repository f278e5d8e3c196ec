//! Training configuration and hyperparameter grids

use crate::preprocessing::{default_numerical_features, PreprocessingConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Anything that expands into a list of candidate parameter sets
pub trait ParamGrid {
    type Params: Clone + Send + Sync + std::fmt::Debug;

    /// Cartesian product of the value lists, first field varying slowest
    fn candidates(&self) -> Vec<Self::Params>;
}

/// One random forest configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
}

/// Random forest search space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<usize>,
}

impl Default for RandomForestGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100],
            max_depth: vec![10],
        }
    }
}

impl ParamGrid for RandomForestGrid {
    type Params = RandomForestParams;

    fn candidates(&self) -> Vec<RandomForestParams> {
        self.n_estimators
            .iter()
            .flat_map(|&n_estimators| {
                self.max_depth
                    .iter()
                    .map(move |&max_depth| RandomForestParams { n_estimators, max_depth })
            })
            .collect()
    }
}

/// One boosted-trees configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
}

/// Boosted-trees search space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<usize>,
    pub learning_rate: Vec<f64>,
}

impl Default for BoostingGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100],
            max_depth: vec![5],
            learning_rate: vec![0.1],
        }
    }
}

impl ParamGrid for BoostingGrid {
    type Params = BoostingParams;

    fn candidates(&self) -> Vec<BoostingParams> {
        let mut out = Vec::new();
        for &n_estimators in &self.n_estimators {
            for &max_depth in &self.max_depth {
                for &learning_rate in &self.learning_rate {
                    out.push(BoostingParams {
                        n_estimators,
                        max_depth,
                        learning_rate,
                    });
                }
            }
        }
        out
    }
}

/// Configuration for a full training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// CSV dataset location
    pub dataset_path: PathBuf,
    /// Directory the fitted bundle is written to
    pub model_dir: PathBuf,
    /// Target column
    pub target_column: String,
    /// Identifier column, never a feature
    pub id_column: String,
    /// Categorical location columns, never features
    pub location_columns: Vec<String>,
    /// Numeric feature columns, in pipeline order
    pub numerical_features: Vec<String>,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the split and every estimator
    pub random_state: u64,
    /// Folds for grid-search cross-validation
    pub cv_folds: usize,
    pub random_forest_grid: RandomForestGrid,
    pub boosting_grid: BoostingGrid,
    pub preprocessing: PreprocessingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("dataset.csv"),
            model_dir: PathBuf::from("model"),
            target_column: "Price".to_string(),
            id_column: "Id".to_string(),
            location_columns: vec!["Location".to_string(), "City".to_string()],
            numerical_features: default_numerical_features(),
            test_size: 0.2,
            random_state: 42,
            cv_folds: 3,
            random_forest_grid: RandomForestGrid::default(),
            boosting_grid: BoostingGrid::default(),
            preprocessing: PreprocessingConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    pub fn with_numerical_features(mut self, features: Vec<String>) -> Self {
        self.numerical_features = features;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_random_forest_grid(mut self, grid: RandomForestGrid) -> Self {
        self.random_forest_grid = grid;
        self
    }

    pub fn with_boosting_grid(mut self, grid: BoostingGrid) -> Self {
        self.boosting_grid = grid;
        self
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    /// Columns that never become features
    pub fn excluded_columns(&self) -> Vec<String> {
        let mut excluded = vec![self.id_column.clone(), self.target_column.clone()];
        excluded.extend(self.location_columns.iter().cloned());
        excluded
    }
}

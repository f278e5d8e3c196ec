//! Training engine: dataset to fitted preprocessing chain and ensemble

use super::config::{BoostingParams, ParamGrid, RandomForestParams, TrainingConfig};
use super::cross_validation::CrossValidator;
use super::gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
use super::grid_search::GridSearch;
use super::linear_models::LinearRegression;
use super::models::ModelMetrics;
use super::random_forest::RandomForestRegressor;
use crate::ensemble::{RegressorModel, VotingRegressor};
use crate::error::{PredictorError, Result};
use crate::preprocessing::{FeaturePreprocessor, FeatureSet};
use crate::utils::data_loader::{column_names, column_to_array1, columns_to_array2};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::DataFrame;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Summary of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    pub n_components: usize,
    pub random_forest_params: RandomForestParams,
    pub random_forest_cv_r2: f64,
    pub boosting_params: BoostingParams,
    pub boosting_cv_r2: f64,
    /// Ensemble metrics on the held-out partition
    pub metrics: ModelMetrics,
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainedPipeline {
    pub preprocessor: FeaturePreprocessor,
    pub model: VotingRegressor,
    pub report: TrainingReport,
}

/// Main training engine
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run the full procedure on a loaded dataset
    pub fn fit(&self, df: &DataFrame) -> Result<TrainedPipeline> {
        let start = Instant::now();

        let (feature_set, x, y) = self.prepare_data(df)?;
        let (train_idx, test_idx) = self.train_test_split(x.nrows())?;

        let x_train = x.select(Axis(0), &train_idx);
        let y_train = y.select(Axis(0), &train_idx);
        let x_test = x.select(Axis(0), &test_idx);
        let y_test = y.select(Axis(0), &test_idx);

        info!(
            rows = x.nrows(),
            train = train_idx.len(),
            test = test_idx.len(),
            numerical = feature_set.n_numerical(),
            binary = feature_set.n_binary(),
            "Prepared dataset"
        );

        let n_features = feature_set.len();
        let (preprocessor, x_train_p) =
            FeaturePreprocessor::fit_transform(&self.config.preprocessing, feature_set, x_train.view())?;
        let x_test_p = preprocessor.transform(x_test.view())?;

        info!(components = preprocessor.n_output_features(), "Fitted preprocessing");

        let search = GridSearch::new(CrossValidator::k_fold(self.config.cv_folds));
        let seed = self.config.random_state;

        let rf_search = search.search(
            &self.config.random_forest_grid.candidates(),
            |p: &RandomForestParams| {
                RandomForestRegressor::new(p.n_estimators)
                    .with_max_depth(p.max_depth)
                    .with_random_state(seed)
            },
            &x_train_p,
            &y_train,
        )?;

        let gb_search = search.search(
            &self.config.boosting_grid.candidates(),
            |p: &BoostingParams| {
                GradientBoostingRegressor::new(
                    GradientBoostingConfig::default()
                        .with_n_estimators(p.n_estimators)
                        .with_max_depth(p.max_depth)
                        .with_learning_rate(p.learning_rate)
                        .with_random_state(seed),
                )
            },
            &x_train_p,
            &y_train,
        )?;

        // Grid search already refit both winners on the whole training partition
        let mut linear = LinearRegression::new();
        linear.fit(&x_train_p, &y_train)?;

        let model = VotingRegressor::new(vec![
            RegressorModel::RandomForest(rf_search.best_estimator),
            RegressorModel::GradientBoosting(gb_search.best_estimator),
            RegressorModel::Linear(linear),
        ]);

        let y_pred = model.predict(&x_test_p)?;
        let metrics = ModelMetrics::compute_regression(&y_test, &y_pred)
            .with_training_time(start.elapsed().as_secs_f64());

        info!(
            mse = metrics.mse,
            rmse = metrics.rmse,
            mae = metrics.mae,
            r2 = metrics.r2,
            secs = metrics.training_time_secs,
            "Evaluated ensemble on held-out rows"
        );

        let report = TrainingReport {
            n_rows: x.nrows(),
            n_train: train_idx.len(),
            n_test: test_idx.len(),
            n_features,
            n_components: preprocessor.n_output_features(),
            random_forest_params: rf_search.best_params,
            random_forest_cv_r2: rf_search.best_score,
            boosting_params: gb_search.best_params,
            boosting_cv_r2: gb_search.best_score,
            metrics,
        };

        Ok(TrainedPipeline {
            preprocessor,
            model,
            report,
        })
    }

    /// Derive the feature layout and pull the feature matrix and target.
    ///
    /// Rows whose target is missing are dropped.
    pub fn prepare_data(&self, df: &DataFrame) -> Result<(FeatureSet, Array2<f64>, Array1<f64>)> {
        let columns = column_names(df);
        if !columns.contains(&self.config.target_column) {
            return Err(PredictorError::FeatureNotFound(self.config.target_column.clone()));
        }

        let feature_set = FeatureSet::from_columns(
            &columns,
            &self.config.numerical_features,
            &self.config.excluded_columns(),
        )?;

        let x = columns_to_array2(df, &feature_set.all_features())?;
        let y = column_to_array1(df, &self.config.target_column)?;

        let keep: Vec<usize> = y
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, _)| i)
            .collect();

        if keep.len() < y.len() {
            warn!(dropped = y.len() - keep.len(), "Dropping rows without a target value");
            return Ok((feature_set, x.select(Axis(0), &keep), y.select(Axis(0), &keep)));
        }

        Ok((feature_set, x, y))
    }

    /// Shuffle row indices with the configured seed; the first
    /// `ceil(test_size * n)` become the test partition.
    pub fn train_test_split(&self, n_samples: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        let test_size = self.config.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PredictorError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }

        let n_test = (test_size * n_samples as f64).ceil() as usize;
        if n_test == 0 || n_test >= n_samples || n_samples - n_test < 2 {
            return Err(PredictorError::DataError(format!(
                "Not enough rows ({}) to hold out {:.0}% for testing",
                n_samples,
                test_size * 100.0
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        indices.shuffle(&mut rng);

        let train = indices.split_off(n_test);
        Ok((train, indices))
    }
}

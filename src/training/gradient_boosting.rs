//! Gradient boosted regression trees
//!
//! Squared-error boosting: start from the target mean and fit each tree to
//! the current residuals, shrunk by the learning rate. Leaves carry L2
//! shrinkage in the style of XGBoost.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTreeRegressor;
use super::models::Regressor;
use crate::error::{PredictorError, Result};

/// Gradient Boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Subsample ratio for each tree
    pub subsample: f64,
    /// Column subsample ratio
    pub colsample_bytree: f64,
    /// L2 regularization
    pub reg_lambda: f64,
    /// Random seed
    pub random_state: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            reg_lambda: 1.0,
            random_state: 42,
        }
    }
}

impl GradientBoostingConfig {
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_subsample(mut self, ratio: f64) -> Self {
        self.subsample = ratio;
        self
    }

    pub fn with_colsample_bytree(mut self, ratio: f64) -> Self {
        self.colsample_bytree = ratio;
        self
    }

    pub fn with_reg_lambda(mut self, reg_lambda: f64) -> Self {
        self.reg_lambda = reg_lambda;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        let ratio_ok = |r: f64| r > 0.0 && r <= 1.0;
        if self.n_estimators == 0 {
            return Err(PredictorError::ConfigError("n_estimators must be positive".to_string()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(PredictorError::ConfigError(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !ratio_ok(self.subsample) || !ratio_ok(self.colsample_bytree) {
            return Err(PredictorError::ConfigError(
                "subsample and colsample_bytree must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTreeRegressor>,
    col_indices_per_tree: Vec<Vec<usize>>,
    initial_prediction: f64,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            col_indices_per_tree: Vec::new(),
            initial_prediction: 0.0,
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    /// Fit the gradient boosting model
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        self.config.validate()?;
        if n_samples != y.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        self.initial_prediction = y
            .mean()
            .ok_or_else(|| PredictorError::TrainingError("Cannot boost on zero samples".to_string()))?;
        self.trees.clear();
        self.col_indices_per_tree.clear();

        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);

        for round in 0..self.config.n_estimators {
            let residuals = y - &predictions;

            let sample_indices = self.sample_indices(n_samples, self.config.subsample, &mut rng);
            let col_indices = self.sample_indices(n_features, self.config.colsample_bytree, &mut rng);

            let x_cols = x.select(Axis(1), &col_indices);
            let x_sub = x_cols.select(Axis(0), &sample_indices);
            let y_sub = residuals.select(Axis(0), &sample_indices);

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_reg_lambda(self.config.reg_lambda)
                .with_random_state(self.config.random_state.wrapping_add(round as u64));
            tree.fit(&x_sub, &y_sub)?;

            // Every row moves, including those left out of the subsample
            let update = tree.predict(&x_cols)?;
            predictions.scaled_add(self.config.learning_rate, &update);

            self.trees.push(tree);
            self.col_indices_per_tree.push(col_indices);
        }

        Ok(())
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PredictorError::ModelNotFitted);
        }

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for (tree, col_indices) in self.trees.iter().zip(self.col_indices_per_tree.iter()) {
            let x_sub = x.select(Axis(1), col_indices);
            let tree_pred = tree.predict(&x_sub)?;
            predictions.scaled_add(self.config.learning_rate, &tree_pred);
        }

        Ok(predictions)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn sample_indices(&self, n: usize, ratio: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        if ratio >= 1.0 {
            return (0..n).collect();
        }
        let sample_size = ((n as f64) * ratio).ceil().max(1.0) as usize;
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        indices.truncate(sample_size);
        indices.sort_unstable();
        indices
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        GradientBoostingRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        GradientBoostingRegressor::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn quadratic_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((50, 1), |(i, _)| i as f64 / 10.0);
        let y = x.column(0).mapv(|v| v * v);
        (x, y)
    }

    #[test]
    fn test_boosting_reduces_error() {
        let (x, y) = quadratic_data();
        let mut few = GradientBoostingRegressor::new(
            GradientBoostingConfig::default().with_n_estimators(2).with_max_depth(3),
        );
        let mut many = GradientBoostingRegressor::new(
            GradientBoostingConfig::default().with_n_estimators(100).with_max_depth(3),
        );
        few.fit(&x, &y).unwrap();
        many.fit(&x, &y).unwrap();

        let few_r2 = few.score(&x, &y).unwrap();
        let many_r2 = many.score(&x, &y).unwrap();
        assert!(many_r2 > few_r2);
        assert!(many_r2 > 0.95);
    }

    #[test]
    fn test_subsampled_is_deterministic() {
        let (x, y) = quadratic_data();
        let config = GradientBoostingConfig::default()
            .with_n_estimators(20)
            .with_subsample(0.7)
            .with_random_state(9);

        let mut a = GradientBoostingRegressor::new(config.clone());
        let mut b = GradientBoostingRegressor::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_constant_target() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![4.0, 4.0, 4.0];
        let mut gb = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_n_estimators(5));
        gb.fit(&x, &y).unwrap();
        for p in gb.predict(&x).unwrap().iter() {
            assert!((p - 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_config() {
        let (x, y) = quadratic_data();
        let mut gb = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_learning_rate(0.0));
        assert!(matches!(gb.fit(&x, &y), Err(PredictorError::ConfigError(_))));
    }

    #[test]
    fn test_not_fitted() {
        let gb = GradientBoostingRegressor::default();
        assert!(gb.predict(&array![[1.0]]).is_err());
    }
}

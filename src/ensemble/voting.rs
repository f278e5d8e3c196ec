//! Averaging voting regressor

use crate::error::{PredictorError, Result};
use crate::training::{GradientBoostingRegressor, LinearRegression, RandomForestRegressor, Regressor};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A concrete ensemble member
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "model")]
pub enum RegressorModel {
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
    Linear(LinearRegression),
}

impl RegressorModel {
    pub fn name(&self) -> &'static str {
        match self {
            RegressorModel::RandomForest(_) => "random_forest",
            RegressorModel::GradientBoosting(_) => "gradient_boosting",
            RegressorModel::Linear(_) => "linear_regression",
        }
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            RegressorModel::RandomForest(m) => m,
            RegressorModel::GradientBoosting(m) => m,
            RegressorModel::Linear(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            RegressorModel::RandomForest(m) => m,
            RegressorModel::GradientBoosting(m) => m,
            RegressorModel::Linear(m) => m,
        }
    }
}

impl Regressor for RegressorModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_regressor().predict(x)
    }

    fn is_fitted(&self) -> bool {
        self.as_regressor().is_fitted()
    }
}

/// Voting regressor ensemble: weighted mean of member predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingRegressor {
    estimators: Vec<RegressorModel>,
    /// Weights for each model; `None` averages uniformly
    weights: Option<Vec<f64>>,
}

impl VotingRegressor {
    /// Create a new voting regressor over the given members
    pub fn new(estimators: Vec<RegressorModel>) -> Self {
        Self {
            estimators,
            weights: None,
        }
    }

    /// Set model weights
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn estimators(&self) -> &[RegressorModel] {
        &self.estimators
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Fit every member on the same data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.validate()?;
        self.estimators
            .par_iter_mut()
            .try_for_each(|model| {
                debug!(model = model.name(), "Fitting ensemble member");
                model.fit(x, y)
            })
    }

    /// Average member predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.estimators.is_empty() {
            return Err(PredictorError::ValidationError("No models provided".to_string()));
        }

        let predictions = self
            .estimators
            .iter()
            .map(|m| m.predict(x))
            .collect::<Result<Vec<Array1<f64>>>>()?;

        self.predict_from_predictions(&predictions)
    }

    /// Combine precomputed member predictions with the configured weights
    pub fn predict_from_predictions(&self, predictions: &[Array1<f64>]) -> Result<Array1<f64>> {
        if predictions.is_empty() {
            return Err(PredictorError::ValidationError("No predictions provided".to_string()));
        }

        let n_samples = predictions[0].len();
        let n_models = predictions.len();
        if predictions.iter().any(|p| p.len() != n_samples) {
            return Err(PredictorError::ShapeError {
                expected: format!("{} predictions per model", n_samples),
                actual: "ragged predictions".to_string(),
            });
        }

        let weights = self.normalized_weights(n_models)?;

        let mut result = Array1::<f64>::zeros(n_samples);
        for (pred, &weight) in predictions.iter().zip(weights.iter()) {
            result.scaled_add(weight, pred);
        }
        Ok(result)
    }

    fn normalized_weights(&self, n_models: usize) -> Result<Vec<f64>> {
        let weights = match &self.weights {
            Some(w) if w.len() != n_models => {
                return Err(PredictorError::ValidationError(format!(
                    "Expected {} weights, got {}",
                    n_models,
                    w.len()
                )));
            }
            Some(w) => w.clone(),
            None => vec![1.0; n_models],
        };

        let weight_sum: f64 = weights.iter().sum();
        if !(weight_sum > 0.0) {
            return Err(PredictorError::ValidationError(
                "Ensemble weights must sum to a positive value".to_string(),
            ));
        }
        Ok(weights.iter().map(|w| w / weight_sum).collect())
    }

    fn validate(&self) -> Result<()> {
        if self.estimators.is_empty() {
            return Err(PredictorError::ValidationError("No models provided".to_string()));
        }
        self.normalized_weights(self.estimators.len()).map(|_| ())
    }
}

impl Regressor for VotingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        VotingRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        VotingRegressor::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        !self.estimators.is_empty() && self.estimators.iter().all(|m| m.is_fitted())
    }
}

//! Regressor trait and evaluation metrics

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Metrics for held-out regression evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared
    pub r2: f64,
    /// Training time in seconds
    pub training_time_secs: f64,
    /// Number of evaluated samples
    pub n_samples: usize,
}

impl ModelMetrics {
    /// Compute regression metrics
    pub fn compute_regression(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len().max(1) as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2: r2_score(y_true, y_pred),
            training_time_secs: 0.0,
            n_samples: y_true.len(),
        }
    }

    pub fn with_training_time(mut self, secs: f64) -> Self {
        self.training_time_secs = secs;
        self
    }
}

/// Coefficient of determination; a constant target scores 0
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len();
    if n == 0 {
        return 0.0;
    }
    let y_mean = y_true.sum() / n as f64;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    }
}

/// Common interface of every estimator the ensemble can hold
pub trait Regressor: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Whether `fit` has completed
    fn is_fitted(&self) -> bool;

    /// R² on the given data
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        Ok(r2_score(y, &y_pred))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.0, 2.9, 4.1, 5.0];

        let metrics = ModelMetrics::compute_regression(&y_true, &y_pred);

        assert!((metrics.mse - 0.006).abs() < 1e-12);
        assert!((metrics.rmse - 0.006f64.sqrt()).abs() < 1e-12);
        assert!((metrics.mae - 0.06).abs() < 1e-12);
        assert!(metrics.r2 > 0.99);
        assert_eq!(metrics.n_samples, 5);
    }

    #[test]
    fn test_r2_constant_target() {
        let y = array![3.0, 3.0, 3.0];
        assert_eq!(r2_score(&y, &array![1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_r2_mean_prediction_is_zero() {
        let y = array![1.0, 2.0, 3.0];
        assert!(r2_score(&y, &array![2.0, 2.0, 2.0]).abs() < 1e-12);
    }
}

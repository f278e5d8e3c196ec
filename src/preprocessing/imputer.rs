//! Missing value imputation strategies
//!
//! Missing entries are `NaN`. An [`Imputer`] only exists in fitted form:
//! [`Imputer::fit`] learns one fill value per column and
//! [`Imputer::transform`] applies them without touching the learned state.

use crate::error::{PredictorError, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with column mean
    Mean,
    /// Replace with column median
    Median,
    /// Replace with the most frequent value (smallest value wins ties)
    MostFrequent,
    /// Replace with a constant value
    Constant(f64),
}

/// Fitted imputer holding one fill value per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    statistics: Vec<f64>,
}

impl Imputer {
    /// Learn fill values from the non-missing entries of each column
    pub fn fit(strategy: ImputeStrategy, x: ArrayView2<'_, f64>) -> Result<Self> {
        let statistics = x
            .axis_iter(Axis(1))
            .enumerate()
            .map(|(col_idx, column)| {
                Self::compute_fill_value(&strategy, column).ok_or_else(|| {
                    PredictorError::PreprocessingError(format!(
                        "Cannot impute column {} with {:?}: no observed values",
                        col_idx, strategy
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Self { strategy, statistics })
    }

    /// Replace missing entries with the learned fill values
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.statistics.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} columns", self.statistics.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut result = x.to_owned();
        for (mut column, &fill) in result.axis_iter_mut(Axis(1)).zip(self.statistics.iter()) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(strategy: ImputeStrategy, x: ArrayView2<'_, f64>) -> Result<(Self, Array2<f64>)> {
        let imputer = Self::fit(strategy, x)?;
        let transformed = imputer.transform(x)?;
        Ok((imputer, transformed))
    }

    /// Learned fill value per column
    pub fn statistics(&self) -> &[f64] {
        &self.statistics
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    pub fn n_features(&self) -> usize {
        self.statistics.len()
    }

    fn compute_fill_value(strategy: &ImputeStrategy, column: ArrayView1<'_, f64>) -> Option<f64> {
        if let ImputeStrategy::Constant(val) = strategy {
            return Some(*val);
        }

        let mut observed: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
        if observed.is_empty() {
            return None;
        }

        match strategy {
            ImputeStrategy::Mean => Some(observed.iter().sum::<f64>() / observed.len() as f64),
            ImputeStrategy::Median => {
                observed.sort_by(|a, b| a.total_cmp(b));
                let mid = observed.len() / 2;
                if observed.len() % 2 == 0 {
                    Some((observed[mid - 1] + observed[mid]) / 2.0)
                } else {
                    Some(observed[mid])
                }
            }
            ImputeStrategy::MostFrequent => {
                observed.sort_by(|a, b| a.total_cmp(b));
                let mut best = observed[0];
                let mut best_count = 0usize;
                let mut run_start = 0usize;
                // Runs are visited in ascending order, so strict `>` keeps the smallest on ties
                for i in 1..=observed.len() {
                    if i == observed.len() || observed[i] != observed[run_start] {
                        let count = i - run_start;
                        if count > best_count {
                            best_count = count;
                            best = observed[run_start];
                        }
                        run_start = i;
                    }
                }
                Some(best)
            }
            ImputeStrategy::Constant(val) => Some(*val),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_median_imputation() {
        let x = array![[1.0, 10.0], [f64::NAN, 20.0], [3.0, f64::NAN], [4.0, 40.0]];
        let (imputer, result) = Imputer::fit_transform(ImputeStrategy::Median, x.view()).unwrap();

        assert_eq!(imputer.statistics(), &[3.0, 20.0]);
        assert_eq!(result[[1, 0]], 3.0);
        assert_eq!(result[[2, 1]], 20.0);
        assert_eq!(result[[0, 0]], 1.0);
    }

    #[test]
    fn test_median_even_count() {
        let x = array![[1.0], [2.0], [3.0], [10.0]];
        let imputer = Imputer::fit(ImputeStrategy::Median, x.view()).unwrap();
        assert_eq!(imputer.statistics(), &[2.5]);
    }

    #[test]
    fn test_most_frequent_prefers_smallest_on_tie() {
        let x = array![[1.0], [0.0], [1.0], [0.0], [f64::NAN]];
        let imputer = Imputer::fit(ImputeStrategy::MostFrequent, x.view()).unwrap();
        assert_eq!(imputer.statistics(), &[0.0]);

        let x = array![[1.0], [1.0], [0.0]];
        let imputer = Imputer::fit(ImputeStrategy::MostFrequent, x.view()).unwrap();
        assert_eq!(imputer.statistics(), &[1.0]);
    }

    #[test]
    fn test_mean_imputation() {
        let x = array![[1.0], [f64::NAN], [3.0], [4.0]];
        let (_, result) = Imputer::fit_transform(ImputeStrategy::Mean, x.view()).unwrap();
        // Mean of [1, 3, 4] = 8/3
        assert!((result[[1, 0]] - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_missing_column_fails() {
        let x = array![[f64::NAN], [f64::NAN]];
        assert!(Imputer::fit(ImputeStrategy::Median, x.view()).is_err());
        assert!(Imputer::fit(ImputeStrategy::Constant(0.0), x.view()).is_ok());
    }

    #[test]
    fn test_column_mismatch() {
        let x = array![[1.0, 2.0]];
        let imputer = Imputer::fit(ImputeStrategy::Median, x.view()).unwrap();
        let err = imputer.transform(array![[1.0]].view()).unwrap_err();
        assert!(matches!(err, PredictorError::ShapeError { .. }));
    }

    #[test]
    fn test_impute_strategy_serialize() {
        let json = serde_json::to_string(&ImputeStrategy::Constant(5.0)).unwrap();
        assert!(json.contains("Constant"));
        assert!(json.contains('5'));
    }
}

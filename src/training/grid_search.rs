//! Exhaustive hyperparameter search scored by cross-validated R²

use super::cross_validation::{CVResults, CrossValidator};
use super::models::Regressor;
use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use tracing::{debug, info};

/// Outcome of a grid search
#[derive(Debug, Clone)]
pub struct GridSearchResult<P, M> {
    pub best_params: P,
    /// Mean cross-validated R² of the winner
    pub best_score: f64,
    /// Every candidate with its fold scores, in candidate order
    pub cv_results: Vec<(P, CVResults)>,
    /// Winner refit on the full data
    pub best_estimator: M,
}

/// Grid search over a fixed candidate list
#[derive(Debug, Clone)]
pub struct GridSearch {
    cv: CrossValidator,
}

impl GridSearch {
    pub fn new(cv: CrossValidator) -> Self {
        Self { cv }
    }

    /// Score every candidate with k-fold CV, then refit the best on all of `x`.
    ///
    /// Candidate×fold fits run in parallel. The highest mean R² wins; on a
    /// tie the earlier candidate is kept.
    pub fn search<P, M, F>(
        &self,
        candidates: &[P],
        build: F,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<GridSearchResult<P, M>>
    where
        P: Clone + Send + Sync + std::fmt::Debug,
        M: Regressor,
        F: Fn(&P) -> M + Sync,
    {
        if candidates.is_empty() {
            return Err(PredictorError::ValidationError(
                "Grid search needs at least one candidate".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let splits = self.cv.split(x.nrows())?;
        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..splits.len()).map(move |f| (c, f)))
            .collect();

        let scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| -> Result<f64> {
                let split = &splits[f];
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = y.select(Axis(0), &split.train_indices);
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test = y.select(Axis(0), &split.test_indices);

                let mut model = build(&candidates[c]);
                model.fit(&x_train, &y_train)?;
                model.score(&x_test, &y_test)
            })
            .collect::<Result<Vec<_>>>()?;

        let n_folds = splits.len();
        let cv_results: Vec<(P, CVResults)> = candidates
            .iter()
            .enumerate()
            .map(|(c, params)| {
                let fold_scores = scores[c * n_folds..(c + 1) * n_folds].to_vec();
                (params.clone(), CVResults::from_scores(fold_scores))
            })
            .collect();

        let mut best_idx = 0;
        for (idx, (params, result)) in cv_results.iter().enumerate() {
            debug!(?params, mean_r2 = result.mean_score, std_r2 = result.std_score, "Candidate scored");
            if result.mean_score > cv_results[best_idx].1.mean_score {
                best_idx = idx;
            }
        }

        let best_params = cv_results[best_idx].0.clone();
        let best_score = cv_results[best_idx].1.mean_score;
        info!(params = ?best_params, mean_r2 = best_score, "Grid search selected candidate");

        let mut best_estimator = build(&best_params);
        best_estimator.fit(x, y)?;

        Ok(GridSearchResult {
            best_params,
            best_score,
            cv_results,
            best_estimator,
        })
    }
}

//! Principal component analysis for the preprocessing chain
//!
//! Variance-retaining linear reduction. Fits the full eigen-decomposition of
//! the sample covariance matrix with cyclic Jacobi rotations, then keeps the
//! leading components.

use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// How many components to keep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PcaComponents {
    /// Smallest count whose cumulative explained variance ratio exceeds the fraction
    VarianceRatio(f64),
    /// Fixed number of components
    Fixed(usize),
}

/// Fitted PCA projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pca {
    mean: Array1<f64>,
    /// n_components x n_features, rows are unit-length principal axes
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    explained_variance_ratio: Array1<f64>,
}

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOL: f64 = 1e-12;

impl Pca {
    /// Fit the projection on `x` (rows are samples)
    pub fn fit(components: PcaComponents, x: ArrayView2<'_, f64>) -> Result<Self> {
        let n = x.nrows();
        let d = x.ncols();
        if n < 2 {
            return Err(PredictorError::PreprocessingError(
                "PCA requires at least 2 samples".to_string(),
            ));
        }
        if d < 1 {
            return Err(PredictorError::PreprocessingError(
                "PCA requires at least 1 feature".to_string(),
            ));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(PredictorError::PreprocessingError(
                "PCA input contains non-finite values".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PredictorError::PreprocessingError("Empty input".to_string()))?;
        let centered = &x - &mean;
        let cov = centered.t().dot(&centered) / (n as f64 - 1.0);

        let (eigenvalues, eigenvectors) = jacobi_eigen(&cov);

        // Sort descending by eigenvalue
        let mut order: Vec<usize> = (0..d).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

        let sorted_values: Vec<f64> = order.iter().map(|&i| eigenvalues[i].max(0.0)).collect();
        let total_variance: f64 = sorted_values.iter().sum();

        let max_components = d.min(n);
        let n_components = match components {
            PcaComponents::Fixed(k) => {
                if k == 0 || k > max_components {
                    return Err(PredictorError::InvalidInput(format!(
                        "n_components must be in 1..={}, got {}",
                        max_components, k
                    )));
                }
                k
            }
            PcaComponents::VarianceRatio(ratio) => {
                if !(ratio > 0.0 && ratio < 1.0) {
                    return Err(PredictorError::InvalidInput(format!(
                        "variance ratio must be in (0, 1), got {}",
                        ratio
                    )));
                }
                Self::components_for_ratio(&sorted_values, total_variance, ratio, max_components)
            }
        };

        let mut basis = Array2::zeros((n_components, d));
        for (row, &src) in order.iter().take(n_components).enumerate() {
            let mut axis = eigenvectors.column(src).to_owned();
            // Deterministic sign: largest-magnitude loading is positive
            let pivot = axis
                .iter()
                .copied()
                .fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                axis.mapv_inplace(|v| -v);
            }
            basis.row_mut(row).assign(&axis);
        }

        let explained_variance = Array1::from_vec(sorted_values[..n_components].to_vec());
        let explained_variance_ratio = if total_variance > 0.0 {
            explained_variance.mapv(|v| v / total_variance)
        } else {
            Array1::zeros(n_components)
        };

        Ok(Self {
            mean,
            components: basis,
            explained_variance,
            explained_variance_ratio,
        })
    }

    /// Project rows onto the fitted principal axes
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} columns", self.mean.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let centered = &x - &self.mean;
        Ok(centered.dot(&self.components.t()))
    }

    /// Fit and project in one step
    pub fn fit_transform(components: PcaComponents, x: ArrayView2<'_, f64>) -> Result<(Self, Array2<f64>)> {
        let pca = Self::fit(components, x)?;
        let projected = pca.transform(x)?;
        Ok((pca, projected))
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> &Array1<f64> {
        &self.explained_variance_ratio
    }

    fn components_for_ratio(sorted: &[f64], total: f64, ratio: f64, max_components: usize) -> usize {
        if total <= 0.0 {
            return 1;
        }
        let mut cumulative = 0.0;
        for (i, v) in sorted.iter().enumerate().take(max_components) {
            cumulative += v / total;
            if cumulative > ratio {
                return i + 1;
            }
        }
        max_components
    }
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues and a matrix whose columns are the matching eigenvectors.
fn jacobi_eigen(matrix: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let d = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(d);

    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt().max(1e-300);

    for _sweep in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..d)
            .flat_map(|i| (0..d).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[[i, j]] * a[[i, j]])
            .sum::<f64>()
            .sqrt();
        if off <= JACOBI_TOL * scale {
            break;
        }

        for p in 0..d {
            for q in (p + 1)..d {
                let apq = a[[p, q]];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..d {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..d {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..d {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

//! Ordinary least squares regression

use super::models::Regressor;
use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Lower-triangular factor `L` with `A = L Lᵀ`, or `None` if `A` is not positive definite
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                // Relative floor treats numerically rank-deficient systems as singular
                if diag <= 1e-12 * a[[i, i]].abs() || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(l)
}

/// Solve `L Lᵀ x = b` by forward then backward substitution
fn cholesky_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    x
}

/// Gauss-Jordan solve with partial pivoting
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = Array2::<f64>::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| aug[[r1, col]].abs().total_cmp(&aug[[r2, col]].abs()))?;
        if aug[[pivot_row, col]].abs() < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for j in 0..=n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        aug.row_mut(col).mapv_inplace(|v| v / pivot);

        let pivot_vals = aug.row(col).to_owned();
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    aug.row_mut(row).scaled_add(-factor, &pivot_vals);
                }
            }
        }
    }

    Some(aug.column(n).to_owned())
}

/// Solve the normal equations `(XᵀX) w = Xᵀy`.
///
/// Tries Cholesky, then Cholesky with a small ridge on the diagonal, then
/// Gauss-Jordan elimination.
fn solve_normal_equations(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);
    let n = xtx.nrows();

    if let Some(l) = cholesky(&xtx) {
        return Some(cholesky_substitute(&l, &xty));
    }

    let ridge = 1e-8 * xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    if ridge > 0.0 {
        let mut nudged = xtx.clone();
        nudged.diag_mut().mapv_inplace(|v| v + ridge);
        if let Some(l) = cholesky(&nudged) {
            return Some(cholesky_substitute(&l, &xty));
        }
    }

    gauss_jordan_solve(&xtx, &xty)
}

/// Linear regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: f64,
    /// Whether to fit intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PredictorError::TrainingError(
                "Cannot fit linear regression on zero samples".to_string(),
            ));
        }

        // Centering absorbs the intercept
        let (x_mean, y_mean) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| PredictorError::TrainingError("Empty input".to_string()))?;
            (x_mean, y.mean().unwrap_or(0.0))
        } else {
            (Array1::zeros(x.ncols()), 0.0)
        };

        let x_centered = x - &x_mean;
        let y_centered = y - y_mean;

        let coefficients = solve_normal_equations(&x_centered, &y_centered).ok_or_else(|| {
            PredictorError::TrainingError("Matrix is singular, cannot solve least squares".to_string())
        })?;

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);

        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(PredictorError::ModelNotFitted)?;

        if x.ncols() != coefficients.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.dot(coefficients) + self.intercept)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LinearRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression() {
        let x = array![[1.0, 0.5], [2.0, 1.5], [3.0, 0.0], [4.0, 2.0], [5.0, 1.0]];
        let y = x.column(0).mapv(|v| 2.0 * v) + &x.column(1).mapv(|v| -3.0 * v) + 1.0;

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-8);
        assert!((coef[1] + 3.0).abs() < 1e-8);
        assert!((model.intercept - 1.0).abs() < 1e-8);
        assert!(model.score(&x, &y).unwrap() > 0.999_999);
    }

    #[test]
    fn test_collinear_features_still_solve() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let y = array![3.0, 5.0, 7.0, 9.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-3);
        }
    }

    #[test]
    fn test_gauss_jordan() {
        let a = array![[0.0, 2.0], [3.0, 1.0]];
        let b = array![4.0, 5.0];
        let x = gauss_jordan_solve(&a, &b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_not_fitted() {
        let model = LinearRegression::new();
        assert!(matches!(model.predict(&array![[1.0]]), Err(PredictorError::ModelNotFitted)));
    }
}

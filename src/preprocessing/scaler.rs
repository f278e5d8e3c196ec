//! Standard scaling of numeric features

use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Fitted z-score scaler: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    /// Population variance per column
    var: Array1<f64>,
    /// Standard deviation, with zero replaced by 1
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Learn per-column mean and standard deviation
    pub fn fit(x: ArrayView2<'_, f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(PredictorError::PreprocessingError(
                "Cannot fit scaler on zero rows".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PredictorError::PreprocessingError("Empty input".to_string()))?;
        let var = x.var_axis(Axis(0), 0.0);
        let scale = var.mapv(|v| {
            let std = v.sqrt();
            if std == 0.0 || !std.is_finite() { 1.0 } else { std }
        });

        Ok(Self { mean, var, scale })
    }

    /// Scale with the fitted statistics
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        Ok((&x - &self.mean) / &self.scale)
    }

    /// Fit and transform in one step
    pub fn fit_transform(x: ArrayView2<'_, f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }

    /// Map scaled values back to the original units
    pub fn inverse_transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        Ok(&x * &self.scale + &self.mean)
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn var(&self) -> &Array1<f64> {
        &self.var
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn check_width(&self, ncols: usize) -> Result<()> {
        if ncols != self.mean.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} columns", self.mean.len()),
                actual: format!("{} columns", ncols),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0], [5.0, 5.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(x.view()).unwrap();

        let col = scaled.column(0);
        assert!(col.mean().unwrap().abs() < 1e-10); // Mean should be ~0
        let var = col.var(0.0);
        assert!((var - 1.0).abs() < 1e-10);

        // Constant column: scale falls back to 1, values become 0
        assert_eq!(scaler.scale()[1], 1.0);
        assert!(scaled.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(x.view()).unwrap();
        let restored = scaler.inverse_transform(scaled.view()).unwrap();

        for (o, r) in x.iter().zip(restored.iter()) {
            assert!((o - r).abs() < 1e-10);
        }
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = StandardScaler::fit(array![[1.0, 2.0], [3.0, 4.0]].view()).unwrap();
        assert!(scaler.transform(array![[1.0]].view()).is_err());
    }
}

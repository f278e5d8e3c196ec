//! Fitted preprocessing chain
//!
//! Impute numeric and binary blocks separately, standardize the numeric
//! block, concatenate numeric-first, then project through PCA.

use super::{FeatureSet, Imputer, Pca, PreprocessingConfig, StandardScaler};
use crate::error::{PredictorError, Result};
use ndarray::{concatenate, s, Array2, ArrayView2, Axis};
use tracing::debug;

/// The complete set of fitted preprocessing artifacts
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePreprocessor {
    feature_set: FeatureSet,
    numeric_imputer: Imputer,
    binary_imputer: Imputer,
    scaler: StandardScaler,
    pca: Pca,
}

impl FeaturePreprocessor {
    /// Fit every stage on the training matrix.
    ///
    /// `x` columns must follow `feature_set` order (numeric block first).
    pub fn fit_transform(
        config: &PreprocessingConfig,
        feature_set: FeatureSet,
        x: ArrayView2<'_, f64>,
    ) -> Result<(Self, Array2<f64>)> {
        Self::check_width(&feature_set, x.ncols())?;
        let n_num = feature_set.n_numerical();

        let (numeric_imputer, numeric) =
            Imputer::fit_transform(config.numeric_impute_strategy.clone(), x.slice(s![.., ..n_num]))?;
        let (binary_imputer, binary) =
            Imputer::fit_transform(config.binary_impute_strategy.clone(), x.slice(s![.., n_num..]))?;
        let (scaler, scaled) = StandardScaler::fit_transform(numeric.view())?;

        let combined = concatenate(Axis(1), &[scaled.view(), binary.view()])?;
        let (pca, projected) = Pca::fit_transform(config.pca_components, combined.view())?;

        debug!(
            rows = x.nrows(),
            features = feature_set.len(),
            components = pca.n_components(),
            "Fitted preprocessing chain"
        );

        let preprocessor = Self {
            feature_set,
            numeric_imputer,
            binary_imputer,
            scaler,
            pca,
        };
        Ok((preprocessor, projected))
    }

    /// Apply the fitted chain; fit parameters are never touched
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        Self::check_width(&self.feature_set, x.ncols())?;
        let n_num = self.feature_set.n_numerical();

        let numeric = self.numeric_imputer.transform(x.slice(s![.., ..n_num]))?;
        let binary = self.binary_imputer.transform(x.slice(s![.., n_num..]))?;
        let scaled = self.scaler.transform(numeric.view())?;

        let combined = concatenate(Axis(1), &[scaled.view(), binary.view()])?;
        self.pca.transform(combined.view())
    }

    /// Reassemble a preprocessor from persisted artifacts
    pub fn from_parts(
        feature_set: FeatureSet,
        numeric_imputer: Imputer,
        binary_imputer: Imputer,
        scaler: StandardScaler,
        pca: Pca,
    ) -> Result<Self> {
        let n_num = feature_set.n_numerical();
        let n_bin = feature_set.n_binary();

        let mismatch = |what: &str, expected: usize, actual: usize| PredictorError::ShapeError {
            expected: format!("{} with {} features", what, expected),
            actual: format!("{} features", actual),
        };

        if numeric_imputer.n_features() != n_num {
            return Err(mismatch("numeric imputer", n_num, numeric_imputer.n_features()));
        }
        if binary_imputer.n_features() != n_bin {
            return Err(mismatch("binary imputer", n_bin, binary_imputer.n_features()));
        }
        if scaler.n_features() != n_num {
            return Err(mismatch("scaler", n_num, scaler.n_features()));
        }
        if pca.n_features() != n_num + n_bin {
            return Err(mismatch("pca", n_num + n_bin, pca.n_features()));
        }

        Ok(Self {
            feature_set,
            numeric_imputer,
            binary_imputer,
            scaler,
            pca,
        })
    }

    pub fn feature_set(&self) -> &FeatureSet {
        &self.feature_set
    }

    pub fn numeric_imputer(&self) -> &Imputer {
        &self.numeric_imputer
    }

    pub fn binary_imputer(&self) -> &Imputer {
        &self.binary_imputer
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn pca(&self) -> &Pca {
        &self.pca
    }

    /// Width of the vectors handed to the model
    pub fn n_output_features(&self) -> usize {
        self.pca.n_components()
    }

    fn check_width(feature_set: &FeatureSet, ncols: usize) -> Result<()> {
        if ncols != feature_set.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} columns", feature_set.len()),
                actual: format!("{} columns", ncols),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{FeatureRow, ImputeStrategy, PcaComponents};
    use ndarray::array;

    fn feature_set() -> FeatureSet {
        FeatureSet::new(
            vec!["a".to_string(), "b".to_string()],
            vec!["gym".to_string(), "lift".to_string()],
        )
        .unwrap()
    }

    fn training_matrix() -> Array2<f64> {
        array![
            [100.0, 2.0, 1.0, 0.0],
            [150.0, 3.0, f64::NAN, 1.0],
            [200.0, f64::NAN, 1.0, 1.0],
            [120.0, 2.0, 0.0, 0.0],
            [f64::NAN, 4.0, 1.0, 1.0],
            [300.0, 5.0, 0.0, 1.0],
        ]
    }

    #[test]
    fn test_fit_transform_matches_transform() {
        let x = training_matrix();
        let (pre, fitted) =
            FeaturePreprocessor::fit_transform(&PreprocessingConfig::default(), feature_set(), x.view()).unwrap();
        let again = pre.transform(x.view()).unwrap();

        assert_eq!(fitted.shape(), again.shape());
        for (a, b) in fitted.iter().zip(again.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
        assert!(fitted.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_transform_does_not_change_state() {
        let x = training_matrix();
        let (pre, _) =
            FeaturePreprocessor::fit_transform(&PreprocessingConfig::default(), feature_set(), x.view()).unwrap();
        let snapshot = pre.clone();

        let row = array![[f64::NAN, f64::NAN, f64::NAN, f64::NAN]];
        let first = pre.transform(row.view()).unwrap();
        let second = pre.transform(row.view()).unwrap();

        assert_eq!(first, second);
        assert_eq!(pre, snapshot);
    }

    #[test]
    fn test_uses_learned_statistics() {
        let x = training_matrix();
        let config = PreprocessingConfig::default().with_pca_components(PcaComponents::Fixed(4));
        let (pre, _) = FeaturePreprocessor::fit_transform(&config, feature_set(), x.view()).unwrap();

        // Median of [100, 150, 200, 120, 300] = 150
        assert_eq!(pre.numeric_imputer().statistics()[0], 150.0);
        // Mode of [1, 1, 0, 1, 0] = 1
        assert_eq!(pre.binary_imputer().statistics()[0], 1.0);
        assert_eq!(pre.n_output_features(), 4);
    }

    #[test]
    fn test_wrong_width_rejected() {
        let x = training_matrix();
        let (pre, _) =
            FeaturePreprocessor::fit_transform(&PreprocessingConfig::default(), feature_set(), x.view()).unwrap();
        let err = pre.transform(array![[1.0, 2.0]].view()).unwrap_err();
        assert!(matches!(err, PredictorError::ShapeError { .. }));
    }

    #[test]
    fn test_from_parts_roundtrip_and_validation() {
        let x = training_matrix();
        let config = PreprocessingConfig::default().with_numeric_impute(ImputeStrategy::Mean);
        let (pre, _) = FeaturePreprocessor::fit_transform(&config, feature_set(), x.view()).unwrap();

        let rebuilt = FeaturePreprocessor::from_parts(
            pre.feature_set().clone(),
            pre.numeric_imputer().clone(),
            pre.binary_imputer().clone(),
            pre.scaler().clone(),
            pre.pca().clone(),
        )
        .unwrap();
        assert_eq!(rebuilt, pre);

        // Swapped imputers no longer match the layout
        let narrow = FeatureSet::new(vec!["a".to_string()], vec!["gym".to_string()]).unwrap();
        let err = FeaturePreprocessor::from_parts(
            narrow,
            pre.numeric_imputer().clone(),
            pre.binary_imputer().clone(),
            pre.scaler().clone(),
            pre.pca().clone(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_row_pipeline() {
        let x = training_matrix();
        let set = feature_set();
        let (pre, _) =
            FeaturePreprocessor::fit_transform(&PreprocessingConfig::default(), set.clone(), x.view()).unwrap();

        let mut row = FeatureRow::new();
        row.insert("a".to_string(), Some(180.0));
        row.insert("b".to_string(), Some(3.0));
        let out = pre.transform(set.row_to_matrix(&row).view()).unwrap();
        assert_eq!(out.nrows(), 1);
        assert!(out.iter().all(|v| v.is_finite()));
    }
}

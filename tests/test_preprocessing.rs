//! Integration tests for the preprocessing chain

use estate_predictor::preprocessing::{
    default_numerical_features, FeaturePreprocessor, FeatureRow, FeatureSet, ImputeStrategy, Imputer, Pca,
    PcaComponents, PreprocessingConfig, StandardScaler,
};
use ndarray::{array, Array2, Axis};

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn sample_matrix() -> Array2<f64> {
    array![
        [1000.0, 2.0, 19.10, 72.85, 1.0, 0.0],
        [1500.0, 3.0, 19.12, 72.86, 0.0, 1.0],
        [f64::NAN, 2.0, 19.05, 72.90, 1.0, 1.0],
        [2200.0, 4.0, 19.20, 72.88, f64::NAN, 0.0],
        [800.0, 1.0, 19.01, 72.83, 1.0, f64::NAN],
        [1250.0, 2.0, 19.15, 72.87, 1.0, 0.0],
    ]
}

fn sample_features() -> FeatureSet {
    FeatureSet::new(default_numerical_features(), names(&["Gymnasium", "Lift"])).unwrap()
}

#[test]
fn test_imputer_strategies() {
    let x = array![[1.0, 0.0], [f64::NAN, 1.0], [3.0, 1.0], [10.0, f64::NAN]];

    let median = Imputer::fit(ImputeStrategy::Median, x.view()).unwrap();
    assert_eq!(median.statistics()[0], 3.0);

    let frequent = Imputer::fit(ImputeStrategy::MostFrequent, x.view()).unwrap();
    assert_eq!(frequent.statistics()[1], 1.0);

    let filled = frequent.transform(x.view()).unwrap();
    assert!(filled.iter().all(|v| v.is_finite()));
    assert_eq!(filled[[3, 1]], 1.0);
}

#[test]
fn test_imputer_all_missing_column_fails() {
    let x = array![[1.0, f64::NAN], [2.0, f64::NAN]];
    assert!(Imputer::fit(ImputeStrategy::Median, x.view()).is_err());
}

#[test]
fn test_scaler_standardizes_training_data() {
    let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
    let (scaler, scaled) = StandardScaler::fit_transform(x.view()).unwrap();

    for col in scaled.axis_iter(Axis(1)) {
        let mean = col.sum() / col.len() as f64;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / col.len() as f64;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-9);
    }
    assert_eq!(scaler.n_features(), 2);
}

#[test]
fn test_pca_retains_variance_threshold() {
    let x = array![
        [1.0, 2.0, 0.1],
        [2.0, 4.1, 0.0],
        [3.0, 6.0, 0.2],
        [4.0, 8.2, 0.1],
        [5.0, 9.9, 0.0],
    ];

    let pca = Pca::fit(PcaComponents::VarianceRatio(0.95), x.view()).unwrap();
    let retained: f64 = pca.explained_variance_ratio().sum();
    assert!(retained > 0.95);
    assert_eq!(pca.n_components(), 1);

    let full = Pca::fit(PcaComponents::Fixed(3), x.view()).unwrap();
    assert!((full.explained_variance_ratio().sum() - 1.0).abs() < 1e-9);
}

#[test]
fn test_pipeline_fit_then_transform_is_stable() {
    let x = sample_matrix();
    let (pre, fitted) = FeaturePreprocessor::fit_transform(&PreprocessingConfig::default(), sample_features(), x.view()).unwrap();
    let snapshot = pre.clone();

    let again = pre.transform(x.view()).unwrap();
    let third = pre.transform(x.view()).unwrap();

    assert_eq!(pre, snapshot);
    assert_eq!(again, third);
    for (a, b) in fitted.iter().zip(again.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
    assert_eq!(fitted.ncols(), pre.n_output_features());
    assert!(pre.n_output_features() <= x.ncols());
}

#[test]
fn test_pipeline_handles_sparse_rows() {
    let x = sample_matrix();
    let (pre, _) = FeaturePreprocessor::fit_transform(&PreprocessingConfig::default(), sample_features(), x.view()).unwrap();

    let mut row = FeatureRow::new();
    row.insert("Area".to_string(), Some(1400.0));
    row.insert("Gymnasium".to_string(), None);
    row.insert("Unknown".to_string(), Some(1.0));

    let m = pre.feature_set().row_to_matrix(&row);
    let out = pre.transform(m.view()).unwrap();
    assert_eq!(out.nrows(), 1);
    assert!(out.iter().all(|v| v.is_finite()));
}

#[test]
fn test_pipeline_rejects_wrong_width() {
    let x = sample_matrix();
    let (pre, _) = FeaturePreprocessor::fit_transform(&PreprocessingConfig::default(), sample_features(), x.view()).unwrap();
    let narrow = Array2::<f64>::zeros((2, 3));
    assert!(pre.transform(narrow.view()).is_err());
}

#[test]
fn test_fixed_component_count() {
    let config = PreprocessingConfig::default().with_pca_components(PcaComponents::Fixed(2));
    let (pre, out) = FeaturePreprocessor::fit_transform(&config, sample_features(), sample_matrix().view()).unwrap();
    assert_eq!(out.ncols(), 2);
    assert_eq!(pre.pca().n_components(), 2);
}

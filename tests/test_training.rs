//! Integration tests for estimators, search and the training engine

mod common;

use estate_predictor::ensemble::{RegressorModel, VotingRegressor};
use estate_predictor::training::{
    r2_score, BoostingGrid, BoostingParams, CrossValidator, DecisionTreeRegressor, GradientBoostingConfig,
    GradientBoostingRegressor, GridSearch, LinearRegression, ParamGrid, RandomForestGrid, RandomForestParams,
    RandomForestRegressor, TrainEngine,
};
use ndarray::{Array1, Array2};

fn linear_data(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 3), |(i, j)| ((i * (j + 3)) % 17) as f64 + 0.1 * j as f64);
    let y = x.rows().into_iter().map(|r| 3.0 * r[0] - 2.0 * r[1] + 0.5 * r[2] + 7.0).collect();
    (x, y)
}

#[test]
fn test_linear_regression_recovers_coefficients() {
    let (x, y) = linear_data(50);
    let mut model = LinearRegression::new();
    model.fit(&x, &y).unwrap();

    let pred = model.predict(&x).unwrap();
    assert!(r2_score(&y, &pred) > 0.999_999);
}

#[test]
fn test_tree_models_fit_signal() {
    let (x, y) = linear_data(120);

    let mut tree = DecisionTreeRegressor::new().with_max_depth(8);
    tree.fit(&x, &y).unwrap();
    assert!(r2_score(&y, &tree.predict(&x).unwrap()) > 0.9);

    let mut forest = RandomForestRegressor::new(25).with_max_depth(8).with_random_state(1);
    forest.fit(&x, &y).unwrap();
    assert!(r2_score(&y, &forest.predict(&x).unwrap()) > 0.8);

    let mut boosting = GradientBoostingRegressor::new(
        GradientBoostingConfig::default().with_n_estimators(60).with_max_depth(3),
    );
    boosting.fit(&x, &y).unwrap();
    assert!(r2_score(&y, &boosting.predict(&x).unwrap()) > 0.9);
}

#[test]
fn test_forest_is_reproducible_with_seed() {
    let (x, y) = linear_data(80);
    let fit = |seed| {
        let mut f = RandomForestRegressor::new(10).with_max_depth(5).with_random_state(seed);
        f.fit(&x, &y).unwrap();
        f.predict(&x).unwrap()
    };
    assert_eq!(fit(3), fit(3));
}

#[test]
fn test_grid_search_prefers_deeper_trees() {
    let (x, y) = linear_data(90);
    let grid = RandomForestGrid {
        n_estimators: vec![15],
        max_depth: vec![1, 8],
    };

    let result = GridSearch::new(CrossValidator::k_fold(3))
        .search(
            &grid.candidates(),
            |p: &RandomForestParams| {
                RandomForestRegressor::new(p.n_estimators)
                    .with_max_depth(p.max_depth)
                    .with_random_state(42)
            },
            &x,
            &y,
        )
        .unwrap();

    assert_eq!(result.best_params.max_depth, 8);
    assert_eq!(result.cv_results.len(), 2);
    assert_eq!(result.cv_results[0].1.fold_scores.len(), 3);
    assert!(result.best_estimator.predict(&x).is_ok());
}

#[test]
fn test_grid_search_rejects_empty_grid() {
    let (x, y) = linear_data(30);
    let empty: Vec<BoostingParams> = Vec::new();
    let result = GridSearch::new(CrossValidator::k_fold(3)).search(
        &empty,
        |_: &BoostingParams| GradientBoostingRegressor::new(GradientBoostingConfig::default()),
        &x,
        &y,
    );
    assert!(result.is_err());
}

#[test]
fn test_boosting_grid_cartesian_product() {
    let grid = BoostingGrid {
        n_estimators: vec![50, 100],
        max_depth: vec![3, 5],
        learning_rate: vec![0.05, 0.1],
    };
    let candidates = grid.candidates();
    assert_eq!(candidates.len(), 8);
    assert_eq!(
        candidates[0],
        BoostingParams {
            n_estimators: 50,
            max_depth: 3,
            learning_rate: 0.05
        }
    );
}

#[test]
fn test_voting_regressor_averages_members() {
    let (x, y) = linear_data(60);
    let mut ensemble = VotingRegressor::new(vec![
        RegressorModel::Linear(LinearRegression::new()),
        RegressorModel::RandomForest(RandomForestRegressor::new(10).with_max_depth(6)),
    ]);
    ensemble.fit(&x, &y).unwrap();

    let members: Vec<Array1<f64>> = ensemble
        .estimators()
        .iter()
        .map(|m| match m {
            RegressorModel::Linear(l) => l.predict(&x).unwrap(),
            RegressorModel::RandomForest(f) => f.predict(&x).unwrap(),
            RegressorModel::GradientBoosting(g) => g.predict(&x).unwrap(),
        })
        .collect();
    let averaged = ensemble.predict(&x).unwrap();

    for i in 0..x.nrows() {
        let expected = (members[0][i] + members[1][i]) / 2.0;
        assert!((averaged[i] - expected).abs() < 1e-9);
    }
}

#[test]
fn test_engine_synthetic_dataset_r2() {
    let dir = tempfile::tempdir().unwrap();
    let engine = TrainEngine::new(common::fast_config(dir.path()));
    let trained = engine.fit(&common::housing_frame(100, 7)).unwrap();

    assert_eq!(trained.report.n_rows, 100);
    assert_eq!(trained.report.n_test, 20);
    assert!(trained.report.metrics.r2 > 0.5, "held-out r2 = {}", trained.report.metrics.r2);
}

#[test]
fn test_engine_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::fast_config(dir.path()).with_random_forest_grid(RandomForestGrid {
        n_estimators: vec![10, 20],
        max_depth: vec![3, 6],
    });
    let df = common::housing_frame(100, 11);

    let a = TrainEngine::new(config.clone()).fit(&df).unwrap();
    let b = TrainEngine::new(config).fit(&df).unwrap();

    assert_eq!(a.report.random_forest_params, b.report.random_forest_params);
    assert_eq!(a.report.boosting_params, b.report.boosting_params);
    assert!((a.report.metrics.r2 - b.report.metrics.r2).abs() < 1e-9);
}

//! Model training module
//!
//! Provides the estimators behind the price ensemble and the procedure that
//! tunes and fits them:
//! - Decision trees, Random Forests and gradient boosted trees
//! - Ordinary least squares
//! - K-fold cross-validation and grid search
//! - The training engine tying preprocessing, search and evaluation together

mod config;
mod engine;
mod models;
pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod grid_search;
pub mod linear_models;
pub mod random_forest;

pub use config::{BoostingGrid, BoostingParams, ParamGrid, RandomForestGrid, RandomForestParams, TrainingConfig};
pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{DecisionTreeRegressor, TreeNode};
pub use engine::{TrainEngine, TrainedPipeline, TrainingReport};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use grid_search::{GridSearch, GridSearchResult};
pub use linear_models::LinearRegression;
pub use models::{r2_score, ModelMetrics, Regressor};
pub use random_forest::{MaxFeatures, RandomForestRegressor};

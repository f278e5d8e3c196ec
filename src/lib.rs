//! Estate Predictor - real-estate price prediction
//!
//! Trains an averaging ensemble (random forest, gradient boosted trees and
//! linear regression) on a housing dataset and answers single-property price
//! queries.
//!
//! # Modules
//!
//! - [`preprocessing`] - Imputation, scaling and PCA over the feature vector
//! - [`training`] - Estimators, cross-validated grid search, training engine
//! - [`ensemble`] - Averaging ensemble over the tuned estimators
//! - [`bundle`] - The persisted six-file model bundle
//! - [`predictor`] - Loaded prediction context
//! - [`server`] - HTTP adapter
//! - [`cli`] - Command-line interface
//! - [`utils`] - Dataset loading

pub mod error;

pub mod preprocessing;
pub mod training;
pub mod ensemble;

pub mod bundle;
pub mod predictor;
pub mod utils;

pub mod server;
pub mod cli;

pub use error::{PredictorError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{PredictorError, Result};

    pub use crate::preprocessing::{FeaturePreprocessor, FeatureRow, FeatureSet, PreprocessingConfig};

    pub use crate::training::{Regressor, TrainEngine, TrainingConfig, TrainingReport};

    pub use crate::ensemble::{RegressorModel, VotingRegressor};

    pub use crate::bundle::ModelBundle;
    pub use crate::predictor::Predictor;

    pub use crate::server::{create_router, AppState, ServerConfig};

    pub use crate::utils::DataLoader;
}

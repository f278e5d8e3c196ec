//! Loaded prediction context
//!
//! A [`Predictor`] owns the fitted preprocessing chain and the ensemble. It
//! can only be built from a complete bundle or a finished training run, so
//! a value of this type is always ready to answer.

use crate::bundle::ModelBundle;
use crate::ensemble::VotingRegressor;
use crate::error::{PredictorError, Result};
use crate::preprocessing::{FeaturePreprocessor, FeatureRow, FeatureSet};
use crate::training::{TrainEngine, TrainingConfig, TrainingReport};
use crate::utils::DataLoader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Fitted preprocessing and ensemble, shared read-only after construction
#[derive(Debug, Clone)]
pub struct Predictor {
    preprocessor: FeaturePreprocessor,
    model: VotingRegressor,
    /// Present only when this instance was trained in-process
    report: Option<TrainingReport>,
}

impl Predictor {
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self> {
        let (preprocessor, model) = bundle.into_parts()?;
        Ok(Self {
            preprocessor,
            model,
            report: None,
        })
    }

    /// Load a previously saved bundle
    pub fn load(dir: &Path) -> Result<Self> {
        Self::from_bundle(ModelBundle::load(dir)?)
    }

    /// Train from the configured dataset and persist the bundle
    pub fn train(config: &TrainingConfig) -> Result<Self> {
        info!(path = %config.dataset_path.display(), "Training from dataset");

        let df = DataLoader::new().load_csv(&config.dataset_path)?;
        let trained = TrainEngine::new(config.clone()).fit(&df)?;

        ModelBundle::new(&trained.preprocessor, trained.model.clone()).save(&config.model_dir)?;

        Ok(Self {
            preprocessor: trained.preprocessor,
            model: trained.model,
            report: Some(trained.report),
        })
    }

    /// Load the bundle when all of it is present, otherwise retrain
    pub fn load_or_train(config: &TrainingConfig) -> Result<Self> {
        let missing = ModelBundle::missing_files(&config.model_dir);

        if missing.is_empty() {
            return Self::load(&config.model_dir);
        }

        if missing.len() < crate::bundle::BUNDLE_FILES.len() {
            warn!(missing = ?missing, "Model bundle is incomplete, retraining");
        } else {
            info!(dir = %config.model_dir.display(), "No saved model, training");
        }

        Self::train(config)
    }

    /// Predict the price of a single property.
    ///
    /// Absent features count as `0.0`; `None` values are imputed.
    pub fn predict(&self, row: &FeatureRow) -> Result<f64> {
        let x = self.preprocessor.feature_set().row_to_matrix(row);
        let x = self.preprocessor.transform(x.view())?;
        let prediction = self.model.predict(&x)?;

        let price = prediction
            .first()
            .copied()
            .ok_or_else(|| PredictorError::InferenceError("Ensemble returned no prediction".to_string()))?;

        if !price.is_finite() {
            return Err(PredictorError::InferenceError(format!(
                "Prediction is not a finite number: {}",
                price
            )));
        }

        debug!(inputs = row.len(), "Predicted row");
        info!(price, "Predicted price");
        Ok(price)
    }

    /// Snapshot the fitted state as a bundle
    pub fn to_bundle(&self) -> ModelBundle {
        ModelBundle::new(&self.preprocessor, self.model.clone())
    }

    pub fn feature_set(&self) -> &FeatureSet {
        self.preprocessor.feature_set()
    }

    pub fn preprocessor(&self) -> &FeaturePreprocessor {
        &self.preprocessor
    }

    pub fn model(&self) -> &VotingRegressor {
        &self.model
    }

    pub fn report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }
}

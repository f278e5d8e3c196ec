//! Preprocessing configuration

use serde::{Deserialize, Serialize};
use super::{ImputeStrategy, PcaComponents};

/// Configuration for the feature preprocessing chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Strategy for missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for missing binary indicator values
    pub binary_impute_strategy: ImputeStrategy,

    /// How many principal components to keep
    pub pca_components: PcaComponents,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            numeric_impute_strategy: ImputeStrategy::Median,
            binary_impute_strategy: ImputeStrategy::MostFrequent,
            pca_components: PcaComponents::VarianceRatio(0.95),
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set numeric impute strategy
    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute_strategy = strategy;
        self
    }

    /// Builder method to set binary impute strategy
    pub fn with_binary_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.binary_impute_strategy = strategy;
        self
    }

    /// Builder method to set the PCA component selection
    pub fn with_pca_components(mut self, components: PcaComponents) -> Self {
        self.pca_components = components;
        self
    }
}

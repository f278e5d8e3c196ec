//! K-fold cross-validation

use crate::error::{PredictorError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 3, shuffle: false }
    }
}

/// A single train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Per-fold scores of one evaluated configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

impl CVResults {
    pub fn from_scores(fold_scores: Vec<f64>) -> Self {
        let n = fold_scores.len().max(1) as f64;
        let mean_score = fold_scores.iter().sum::<f64>() / n;
        let std_score = (fold_scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n).sqrt();
        Self {
            fold_scores,
            mean_score,
            std_score,
        }
    }
}

/// Cross-validation splitter
#[derive(Debug, Clone)]
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Unshuffled k-fold
    pub fn k_fold(n_splits: usize) -> Self {
        Self::new(CVStrategy::KFold { n_splits, shuffle: false })
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn n_splits(&self) -> usize {
        match self.strategy {
            CVStrategy::KFold { n_splits, .. } => n_splits,
        }
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => self.k_fold_split(n_samples, *n_splits, *shuffle),
        }
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Result<Vec<CVSplit>> {
        if n_splits < 2 {
            return Err(PredictorError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(PredictorError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
            indices.shuffle(&mut rng);
        }

        // The first n_samples % n_splits folds take one extra sample
        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;
        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let test_indices = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
            current += fold_size;
        }

        Ok(splits)
    }
}

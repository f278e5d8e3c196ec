//! CART regression tree

use super::models::Regressor;
use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Regression tree minimizing squared error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features sampled per node; `None` scans all of them
    pub max_features: Option<usize>,
    /// L2 shrinkage of leaf values: `mean * n / (n + lambda)`
    pub reg_lambda: f64,
    /// Seed for per-node feature sampling
    pub random_state: Option<u64>,
    n_features: usize,
}

/// Best split found for one feature: (feature, threshold, sse reduction)
type SplitCandidate = (usize, f64, f64);

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            reg_lambda: 0.0,
            random_state: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Limit the number of features examined at each node
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set L2 leaf regularization
    pub fn with_reg_lambda(mut self, reg_lambda: f64) -> Self {
        self.reg_lambda = reg_lambda.max(0.0);
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
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
                "Cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut rng));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let sq_sum: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_sse = sse(n_samples, sum, sq_sum);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || parent_sse <= f64::EPSILON * sq_sum.max(1.0);

        if should_stop {
            return self.leaf(n_samples, sum);
        }

        let features = self.candidate_features(rng);
        match self.find_best_split(x, y, indices, &features, parent_sse) {
            Some((feature_idx, threshold, _gain)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng));
                let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng));

                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    n_samples,
                    impurity: parent_sse / n_samples as f64,
                }
            }
            None => self.leaf(n_samples, sum),
        }
    }

    fn leaf(&self, n_samples: usize, sum: f64) -> TreeNode {
        let n = n_samples as f64;
        let value = if n_samples == 0 {
            0.0
        } else {
            // mean * n / (n + lambda)
            sum / (n + self.reg_lambda)
        };
        TreeNode::Leaf { value, n_samples }
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < self.n_features => {
                let mut chosen = rand::seq::index::sample(rng, self.n_features, k).into_vec();
                chosen.sort_unstable();
                chosen
            }
            _ => (0..self.n_features).collect(),
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        parent_sse: f64,
    ) -> Option<SplitCandidate> {
        let min_leaf = self.min_samples_leaf;
        let n = indices.len();

        // Each feature sweeps its sorted values once with running sums
        let per_feature: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                let mut pairs: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i]))
                    .collect();
                pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

                let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
                let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();

                let mut left_sum = 0.0;
                let mut left_sq = 0.0;
                let mut best: Option<SplitCandidate> = None;

                for i in 0..n - 1 {
                    let (value, target) = pairs[i];
                    left_sum += target;
                    left_sq += target * target;

                    let left_count = i + 1;
                    let right_count = n - left_count;
                    if left_count < min_leaf || right_count < min_leaf {
                        continue;
                    }
                    let next_value = pairs[i + 1].0;
                    if next_value <= value {
                        continue;
                    }

                    let child_sse = sse(left_count, left_sum, left_sq)
                        + sse(right_count, total_sum - left_sum, total_sq - left_sq);
                    let gain = parent_sse - child_sse;

                    if gain > 0.0 && best.map_or(true, |b| gain > b.2) {
                        best = Some((feature_idx, (value + next_value) / 2.0, gain));
                    }
                }

                best
            })
            .collect();

        // First feature wins on equal gain
        per_feature
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate>, cand| match best {
                Some(b) if b.2 >= cand.2 => Some(b),
                _ => Some(cand),
            })
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(PredictorError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(PredictorError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|sample| Self::predict_sample(root, sample))
            .collect())
    }

    fn predict_sample(node: &TreeNode, sample: ArrayView1<'_, f64>) -> f64 {
        let mut node = node;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if sample[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Sum of squared deviations from the mean
fn sse(count: usize, sum: f64, sq_sum: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sq_sum - sum * sum / count as f64).max(0.0)
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTreeRegressor::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTreeRegressor::predict(self, x)
    }

    fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

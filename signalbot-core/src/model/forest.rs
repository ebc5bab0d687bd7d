//! Random forest of bootstrapped classification trees.
//!
//! Trees are grown in parallel with rayon. Tree `i` draws its bootstrap sample and
//! its per-split feature subsets from `StdRng::seed_from_u64(seed + i)`, so the
//! fitted forest depends only on the data and the seed, not on thread scheduling.

use super::tree::{DecisionTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features per split; `None` means ceil(sqrt(width)).
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    width: usize,
}

impl RandomForest {
    /// Fit on a non-empty matrix `x` with binary labels `y`.
    pub fn fit(x: &[Vec<f64>], y: &[u8], config: &ForestConfig) -> Self {
        let n = x.len();
        let width = x.first().map_or(0, |r| r.len());
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config
                .max_features
                .unwrap_or_else(|| (width as f64).sqrt().ceil() as usize),
        };

        let trees = (0..config.n_trees.max(1))
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let samples: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(x, y, &samples, &params, &mut rng)
            })
            .collect();

        Self { trees, width }
    }

    /// Mean of the per-tree leaf probabilities.
    pub fn predict_proba(&self, row: &[f64]) -> [f64; 2] {
        let mut sum = [0.0; 2];
        for tree in &self.trees {
            let p = tree.predict_proba(row);
            sum[0] += p[0];
            sum[1] += p[1];
        }
        let k = self.trees.len().max(1) as f64;
        [sum[0] / k, sum[1] / k]
    }

    /// Normalized mean impurity decrease per feature; sums to 1 unless no tree split.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.width];
        for tree in &self.trees {
            let imp = tree.importances();
            let sum: f64 = imp.iter().sum();
            if sum > 0.0 {
                for (t, v) in total.iter_mut().zip(imp) {
                    *t += v / sum;
                }
            }
        }
        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for t in &mut total {
                *t /= sum;
            }
        }
        total
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

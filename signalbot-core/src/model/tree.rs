//! Binary classification tree (CART, Gini impurity).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features examined per split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        /// `[p(down), p(up)]` among the training samples that reached this leaf.
        probabilities: [f64; 2],
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
    /// Unnormalized impurity decrease per feature (weighted by node size).
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    /// Grow a tree over `samples` (row indices into `x`/`y`, repeats allowed).
    pub fn fit(
        x: &[Vec<f64>],
        y: &[u8],
        samples: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let width = x.first().map_or(0, |r| r.len());
        let mut importances = vec![0.0; width];
        let mut samples = samples.to_vec();
        let root = grow(x, y, &mut samples, 0, params, rng, &mut importances);
        Self { root, importances }
    }

    pub fn predict_proba(&self, row: &[f64]) -> [f64; 2] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { probabilities, .. } => return *probabilities,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }

    pub fn leaf_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => count(left) + count(right),
            }
        }
        count(&self.root)
    }
}

fn class_counts(y: &[u8], samples: &[usize]) -> [usize; 2] {
    let up = samples.iter().filter(|&&i| y[i] == 1).count();
    [samples.len() - up, up]
}

fn gini(counts: [usize; 2]) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

fn leaf(counts: [usize; 2]) -> Node {
    let n = (counts[0] + counts[1]).max(1) as f64;
    Node::Leaf {
        probabilities: [counts[0] as f64 / n, counts[1] as f64 / n],
        samples: counts[0] + counts[1],
    }
}

fn grow(
    x: &[Vec<f64>],
    y: &[u8],
    samples: &mut [usize],
    depth: usize,
    params: &TreeParams,
    rng: &mut StdRng,
    importances: &mut [f64],
) -> Node {
    let counts = class_counts(y, samples);
    let impurity = gini(counts);

    if depth >= params.max_depth
        || samples.len() < params.min_samples_split
        || samples.len() < 2 * params.min_samples_leaf
        || impurity == 0.0
    {
        return leaf(counts);
    }

    let Some(best) = best_split(x, y, samples, counts, impurity, params, rng) else {
        return leaf(counts);
    };

    importances[best.feature] += best.gain * samples.len() as f64;

    // Partition in place: rows going left first.
    let mut boundary = 0;
    for i in 0..samples.len() {
        if x[samples[i]][best.feature] <= best.threshold {
            samples.swap(i, boundary);
            boundary += 1;
        }
    }
    let (left, right) = samples.split_at_mut(boundary);

    Node::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(grow(x, y, left, depth + 1, params, rng, importances)),
        right: Box::new(grow(x, y, right, depth + 1, params, rng, importances)),
    }
}

/// Sort-and-sweep search over a random subset of features.
fn best_split(
    x: &[Vec<f64>],
    y: &[u8],
    samples: &[usize],
    total: [usize; 2],
    parent_impurity: f64,
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let width = x[samples[0]].len();
    let mut features: Vec<usize> = (0..width).collect();
    features.shuffle(rng);
    features.truncate(params.max_features.clamp(1, width.max(1)));

    let n = samples.len();
    let mut order = samples.to_vec();
    let mut best: Option<SplitCandidate> = None;

    for &feature in &features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left = [0usize; 2];
        for pos in 0..n - 1 {
            left[y[order[pos]] as usize] += 1;
            let here = x[order[pos]][feature];
            let next = x[order[pos + 1]][feature];
            if here == next {
                continue;
            }
            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < params.min_samples_leaf || n_right < params.min_samples_leaf {
                continue;
            }
            let right = [total[0] - left[0], total[1] - left[1]];
            let weighted =
                (n_left as f64 * gini(left) + n_right as f64 * gini(right)) / n as f64;
            let gain = parent_impurity - weighted;
            if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: here + (next - here) / 2.0,
                    gain,
                });
            }
        }
    }

    best
}

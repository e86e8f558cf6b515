//! CART classification tree with Gini impurity, used as the forest's base learner.
//!
//! Leaves store the fraction of active samples that reached them, so a
//! single tree already yields a probability.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of non-constant features examined per split
    pub max_features: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: usize::MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: TreeNode,
}

struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    weighted_impurity: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `indices` (duplicates allowed, as
    /// produced by bootstrap sampling).
    pub fn fit(
        x: &Array2<f64>,
        y: &[bool],
        indices: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let root = build_node(x, y, indices, 0, params, rng);
        DecisionTree { root }
    }

    /// Probability that `row` is active.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

fn build_node(
    x: &Array2<f64>,
    y: &[bool],
    indices: &[usize],
    depth: usize,
    params: &TreeParams,
    rng: &mut StdRng,
) -> TreeNode {
    let n_samples = indices.len();
    let positives = indices.iter().filter(|&&i| y[i]).count();
    let value = if n_samples == 0 {
        0.0
    } else {
        positives as f64 / n_samples as f64
    };

    let should_stop = n_samples < params.min_samples_split
        || n_samples < 2 * params.min_samples_leaf
        || params.max_depth.map_or(false, |d| depth >= d)
        || positives == 0
        || positives == n_samples;

    if should_stop {
        return TreeNode::Leaf { value };
    }

    match find_best_split(x, y, indices, params, rng) {
        Some(split) => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);
            let left = Box::new(build_node(x, y, &left_idx, depth + 1, params, rng));
            let right = Box::new(build_node(x, y, &right_idx, depth + 1, params, rng));
            TreeNode::Split {
                feature_idx: split.feature_idx,
                threshold: split.threshold,
                left,
                right,
            }
        }
        None => TreeNode::Leaf { value },
    }
}

/// Visit features in random order until `max_features` non-constant ones
/// have been examined; keep the split with the lowest weighted child impurity.
fn find_best_split(
    x: &Array2<f64>,
    y: &[bool],
    indices: &[usize],
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let total_pos = indices.iter().filter(|&&i| y[i]).count();
    let mut features: Vec<usize> = (0..x.ncols()).collect();
    features.shuffle(rng);

    let mut best: Option<SplitCandidate> = None;
    let mut visited = 0usize;
    let mut column: Vec<(f64, bool)> = Vec::with_capacity(n);

    for feature_idx in features {
        if visited >= params.max_features {
            break;
        }
        column.clear();
        column.extend(indices.iter().map(|&i| (x[[i, feature_idx]], y[i])));
        column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        if column[0].0 >= column[n - 1].0 {
            continue;
        }
        visited += 1;

        let mut left_pos = 0usize;
        for i in 0..n - 1 {
            if column[i].1 {
                left_pos += 1;
            }
            let left_n = i + 1;
            let right_n = n - left_n;
            if column[i].0 >= column[i + 1].0 {
                continue;
            }
            if left_n < params.min_samples_leaf || right_n < params.min_samples_leaf {
                continue;
            }
            let weighted = (left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(total_pos - left_pos, right_n))
                / n as f64;
            if best
                .as_ref()
                .map_or(true, |b| weighted < b.weighted_impurity)
            {
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold: (column[i].0 + column[i + 1].0) / 2.0,
                    weighted_impurity: weighted,
                });
            }
        }
    }

    best
}

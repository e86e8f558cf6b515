//! Stratified splitting: K-fold for the hyperparameter search and a single
//! hold-out split for evaluation. Both preserve the active/inactive ratio
//! and are reproducible for a given seed.
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};

/// A single train/test split of row indices.
#[derive(Debug, Clone, PartialEq)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        StratifiedKFold {
            n_splits,
            shuffle: true,
            seed,
        }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Generate the folds for labels `y`.
    ///
    /// Samples of each class are dealt round-robin over the folds, continuing
    /// the rotation from one class to the next so fold sizes differ by at
    /// most one.
    pub fn split(&self, y: &Array1<bool>) -> Result<Vec<CvSplit>> {
        if self.n_splits < 2 {
            return Err(PipelineError::Config(format!(
                "n_splits must be at least 2, got {}",
                self.n_splits
            )));
        }
        if y.len() < self.n_splits {
            return Err(PipelineError::Data(format!(
                "cannot make {} folds from {} samples",
                self.n_splits,
                y.len()
            )));
        }

        let mut by_class = class_indices(y);
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            for indices in by_class.iter_mut() {
                indices.shuffle(&mut rng);
            }
        }

        let smallest = by_class.iter().map(Vec::len).min().unwrap_or(0);
        if smallest < self.n_splits {
            log::warn!(
                "The least populated class has only {} members, fewer than {} folds",
                smallest,
                self.n_splits
            );
        }

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for (position, &idx) in by_class.iter().flatten().enumerate() {
            folds[position % self.n_splits].push(idx);
        }

        let splits = (0..self.n_splits)
            .map(|fold_idx| {
                let mut test_indices = folds[fold_idx].clone();
                test_indices.sort_unstable();
                let mut train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                train_indices.sort_unstable();
                log::trace!(
                    "Fold {}: {} training samples, {} test samples",
                    fold_idx,
                    train_indices.len(),
                    test_indices.len()
                );
                CvSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Stratified hold-out split returning sorted (train, test) row indices.
///
/// Each class contributes `round(n_class * test_fraction)` rows to the test
/// side, clamped so that a class with at least two members appears on both
/// sides.
pub fn stratified_train_test_split(
    y: &Array1<bool>,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::Config(format!(
            "test_fraction must lie in (0, 1), got {}",
            test_fraction
        )));
    }
    if y.len() < 2 {
        return Err(PipelineError::Data(format!(
            "cannot split {} samples into train and test",
            y.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(y.len());
    let mut test = Vec::new();

    for mut indices in class_indices(y) {
        if indices.is_empty() {
            continue;
        }
        indices.shuffle(&mut rng);
        let n = indices.len();
        let mut n_test = (n as f64 * test_fraction).round() as usize;
        if n >= 2 {
            n_test = n_test.clamp(1, n - 1);
        }
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Row indices of (inactive, active) samples.
fn class_indices(y: &Array1<bool>) -> [Vec<usize>; 2] {
    let mut negatives = Vec::new();
    let mut positives = Vec::new();
    for (i, &label) in y.iter().enumerate() {
        if label {
            positives.push(i);
        } else {
            negatives.push(i);
        }
    }
    [negatives, positives]
}

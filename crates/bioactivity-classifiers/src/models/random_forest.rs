//! Random Forest classifier: bootstrap-aggregated CART trees.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::ModelFamily;
use crate::error::Result;
use crate::models::classifier_trait::{
    check_training_input, check_width, ClassifierModel, FitOutcome, FittedClassifier,
};
use crate::models::decision_tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    /// Base seed; tree `i` uses `seed + i`
    pub seed: u64,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        RandomForestClassifier {
            n_estimators,
            max_depth: None,
            min_samples_leaf: 1,
            bootstrap: true,
            seed,
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf.max(1);
        self
    }

    /// floor(sqrt(n_features)), at least one.
    fn max_features(n_features: usize) -> usize {
        ((n_features as f64).sqrt().floor() as usize).max(1)
    }
}

impl ClassifierModel for RandomForestClassifier {
    fn family(&self) -> ModelFamily {
        ModelFamily::RandomForest
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<bool>) -> Result<FitOutcome> {
        check_training_input(x, y)?;
        let n_samples = x.nrows();
        let labels = y.to_vec();
        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_split: 2,
            min_samples_leaf: self.min_samples_leaf,
            max_features: Self::max_features(x.ncols()),
        };

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));
                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit(x, &labels, &sample_indices, &params, &mut rng)
            })
            .collect();

        log::trace!(
            "Grew {} trees, deepest at depth {}",
            trees.len(),
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );

        Ok(FitOutcome::new(Box::new(FittedRandomForest {
            trees,
            n_features: x.ncols(),
        })))
    }
}

pub struct FittedRandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl FittedClassifier for FittedRandomForest {
    fn family(&self) -> ModelFamily {
        ModelFamily::RandomForest
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean of the per-tree leaf probabilities.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_width(self.n_features, x)?;
        let n_trees = self.trees.len().max(1) as f64;
        Ok(x
            .outer_iter()
            .map(|row| {
                self.trees
                    .iter()
                    .map(|tree| tree.predict_row(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn blobs() -> (Array2<f64>, Array1<bool>) {
        let n = 40;
        let x = Array2::from_shape_fn((n, 3), |(i, j)| {
            let shift = if i < n / 2 { -2.0 } else { 2.0 };
            shift + ((i * 7 + j * 3) % 5) as f64 * 0.1
        });
        let y = (0..n).map(|i| i >= n / 2).collect();
        (x, y)
    }

    #[test]
    fn forest_fits_separable_blobs() {
        let (x, y) = blobs();
        let outcome = RandomForestClassifier::new(25, 1).fit(&x, &y).unwrap();
        assert!(outcome.warnings.is_empty());
        let proba = outcome.model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
        let labels = outcome.model.predict(&x).unwrap();
        assert_eq!(labels, y);
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = blobs();
        let a = RandomForestClassifier::new(10, 9).fit(&x, &y).unwrap();
        let b = RandomForestClassifier::new(10, 9).fit(&x, &y).unwrap();
        assert_eq!(
            a.model.predict_proba(&x).unwrap(),
            b.model.predict_proba(&x).unwrap()
        );
    }

    #[test]
    fn wrong_width_is_a_shape_error() {
        let (x, y) = blobs();
        let outcome = RandomForestClassifier::new(5, 1).fit(&x, &y).unwrap();
        let narrow = Array2::zeros((2, 2));
        assert!(matches!(
            outcome.model.predict_proba(&narrow),
            Err(crate::error::PipelineError::Shape {
                expected: 3,
                actual: 2
            })
        ));
    }
}

#![allow(dead_code)]

use bioactivity_classifiers::data_handling::{Dataset, PredictionSet};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Two well separated classes: actives centred at +2, inactives at -2 on
/// every feature, with uniform noise in [-1, 1].
pub fn separable(n_samples: usize, n_features: usize, seed: u64) -> (Array2<f64>, Array1<bool>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let y: Array1<bool> = (0..n_samples).map(|i| i % 2 == 0).collect();
    let x = Array2::from_shape_fn((n_samples, n_features), |(i, _)| {
        let centre = if y[i] { 2.0 } else { -2.0 };
        centre + rng.gen_range(-1.0..1.0)
    });
    (x, y)
}

pub fn separable_dataset(n_samples: usize, n_features: usize, seed: u64) -> Dataset {
    let (x, y) = separable(n_samples, n_features, seed);
    let ids = (0..n_samples).map(|i| format!("CHEMBL{}", 1000 + i)).collect();
    let names = (0..n_features).map(|j| format!("desc_{}", j)).collect();
    Dataset::new("Molecule_ID", ids, names, x, y).unwrap()
}

pub fn prediction_set(n_samples: usize, n_features: usize, seed: u64) -> PredictionSet {
    let (x, _) = separable(n_samples, n_features, seed);
    let ids = (0..n_samples).map(|i| format!("EXT{}", i)).collect();
    PredictionSet::new("Molecule_ID", ids, x).unwrap()
}

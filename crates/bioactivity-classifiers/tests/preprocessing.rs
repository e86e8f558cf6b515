mod common;

use bioactivity_classifiers::config::ZeroVariancePolicy;
use bioactivity_classifiers::preprocessing::Standardizer;
use bioactivity_classifiers::PipelineError;
use ndarray::{Array2, Axis};

#[test]
fn test_training_columns_have_zero_mean_and_unit_variance() {
    let (x, _) = common::separable(50, 6, 11);
    let (_, z) = Standardizer::fit_transform(&x, ZeroVariancePolicy::UnitScale).unwrap();

    for column in z.axis_iter(Axis(1)) {
        let n = column.len() as f64;
        let mean = column.sum() / n;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-6);
        assert!((var - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_refitting_on_standardized_data_is_identity() {
    let (x, _) = common::separable(30, 4, 2);
    let (_, z) = Standardizer::fit_transform(&x, ZeroVariancePolicy::UnitScale).unwrap();
    let (_, zz) = Standardizer::fit_transform(&z, ZeroVariancePolicy::UnitScale).unwrap();
    assert!(z.iter().zip(zz.iter()).all(|(a, b)| (a - b).abs() < 1e-9));
}

#[test]
fn test_transform_is_pure() {
    let (x, _) = common::separable(20, 3, 4);
    let standardizer = Standardizer::fit(&x, ZeroVariancePolicy::UnitScale).unwrap();
    let before = standardizer.clone();
    let (other, _) = common::separable(7, 3, 99);
    let first = standardizer.transform(&other).unwrap();
    let second = standardizer.transform(&other).unwrap();
    assert_eq!(first, second);
    assert_eq!(standardizer, before);
}

#[test]
fn test_zero_variance_policies() {
    let mut x = Array2::from_shape_fn((5, 3), |(i, j)| (i * (j + 1)) as f64);
    x.column_mut(1).fill(4.0);

    let standardizer = Standardizer::fit(&x, ZeroVariancePolicy::UnitScale).unwrap();
    assert_eq!(standardizer.constant_columns(), &[1]);
    let z = standardizer.transform(&x).unwrap();
    assert!(z.column(1).iter().all(|&v| v == 0.0));

    assert!(matches!(
        Standardizer::fit(&x, ZeroVariancePolicy::Reject),
        Err(PipelineError::Data(_))
    ));
}

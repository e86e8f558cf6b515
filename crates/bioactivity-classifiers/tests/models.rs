mod common;

use bioactivity_classifiers::config::{EstimatorOptions, HyperParams, ModelFamily};
use bioactivity_classifiers::models::classifier_trait::DECISION_THRESHOLD;
use bioactivity_classifiers::models::factory::build_model;
use bioactivity_classifiers::registry::default_registry;

// ---------------------------------------------------------------------------
// Every family through the factory
// ---------------------------------------------------------------------------

#[test]
fn test_factory_builds_and_predicts() {
    let (x, y) = common::separable(60, 4, 5);
    let options = EstimatorOptions::default();

    for spec in default_registry() {
        let model = build_model(&spec.fixed, &options, 42);
        assert_eq!(model.family(), spec.family);

        let outcome = model.fit(&x, &y).unwrap();
        let fitted = outcome.model;
        assert_eq!(fitted.n_features(), 4);

        let proba = fitted.predict_proba(&x).unwrap();
        assert_eq!(proba.len(), 60);
        assert!(
            proba.iter().all(|&p| (0.0..=1.0).contains(&p)),
            "{} produced a probability outside [0, 1]",
            spec.family
        );

        let labels = fitted.predict(&x).unwrap();
        for (&p, &label) in proba.iter().zip(labels.iter()) {
            assert_eq!(label, p >= DECISION_THRESHOLD);
        }
    }
}

#[test]
fn test_wrong_width_is_rejected_by_every_family() {
    let (x, y) = common::separable(40, 3, 9);
    let (narrow, _) = common::separable(5, 2, 9);
    let options = EstimatorOptions::default();

    for spec in default_registry() {
        let fitted = build_model(&spec.fixed, &options, 1).fit(&x, &y).unwrap().model;
        assert!(fitted.predict_proba(&narrow).is_err(), "{}", spec.family);
    }
}

#[test]
fn test_single_class_training_is_a_data_error() {
    let (x, _) = common::separable(10, 2, 3);
    let y = ndarray::Array1::from_elem(10, true);
    let model = build_model(
        &HyperParams::LogisticRegression { c: 1.0 },
        &EstimatorOptions::default(),
        0,
    );
    let err = model.fit(&x, &y).err().unwrap();
    assert!(matches!(err, bioactivity_classifiers::PipelineError::Data(_)));
    assert_eq!(model.family(), ModelFamily::LogisticRegression);
}

mod common;

use bioactivity_classifiers::config::{EstimatorOptions, HyperParams, ZeroVariancePolicy};
use bioactivity_classifiers::data_handling::PredictionSet;
use bioactivity_classifiers::models::factory::build_model;
use bioactivity_classifiers::preprocessing::Standardizer;
use bioactivity_classifiers::scoring::Scorer;
use bioactivity_classifiers::search::TrainedModel;
use bioactivity_classifiers::PipelineError;
use ndarray::Array2;

#[test]
fn test_scorer_rejects_neighbouring_widths() {
    let (x, y) = common::separable(40, 1024, 8);
    let (standardizer, z) = Standardizer::fit_transform(&x, ZeroVariancePolicy::UnitScale).unwrap();
    let params = HyperParams::RandomForest { n_estimators: 5 };
    let fitted = build_model(&params, &EstimatorOptions::default(), 0)
        .fit(&z, &y)
        .unwrap();
    let models = vec![TrainedModel {
        family: params.family(),
        params,
        model: fitted.model,
        cv_score: None,
        candidates: Vec::new(),
        warnings: fitted.warnings,
    }];
    let scorer = Scorer::new(&standardizer);

    for width in [1023usize, 1025] {
        let set = PredictionSet::new("ID", vec!["a".into(), "b".into()], Array2::zeros((2, width)))
            .unwrap();
        let err = scorer.score(&models, &set).unwrap_err();
        assert_eq!(err, PipelineError::Shape { expected: 1024, actual: width });
    }

    let set = common::prediction_set(3, 1024, 21);
    let output = scorer.score(&models, &set).unwrap();
    assert_eq!(output.table.probabilities.dim(), (3, 1));
}

use crate::config::{EstimatorOptions, HyperParams};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::gbdt::GBDTClassifier;
use crate::models::logistic::LogisticRegressionClassifier;
use crate::models::random_forest::RandomForestClassifier;
use crate::models::svm::SVMClassifier;

/// Build a boxed, unfitted classifier from one hyperparameter assignment.
///
/// `options` carries the settings that are never searched over; `seed` drives
/// every random choice the estimator makes.
pub fn build_model(
    params: &HyperParams,
    options: &EstimatorOptions,
    seed: u64,
) -> Box<dyn ClassifierModel> {
    match *params {
        HyperParams::RandomForest { n_estimators } => Box::new(
            RandomForestClassifier::new(n_estimators, seed)
                .with_max_depth(options.forest_max_depth)
                .with_min_samples_leaf(options.forest_min_samples_leaf),
        ),
        HyperParams::GradientBoosting {
            n_estimators,
            learning_rate,
        } => Box::new(GBDTClassifier::new(
            n_estimators,
            learning_rate,
            options.gbdt_max_depth,
        )),
        HyperParams::LogisticRegression { c } => Box::new(LogisticRegressionClassifier::new(
            c,
            logistic_iteration_cap(options.logistic_max_iter),
            options.logistic_tol,
        )),
        HyperParams::Svm { c, kernel } => Box::new(SVMClassifier::new(c, kernel, options.svm_eps)),
    }
}

fn logistic_iteration_cap(requested: usize) -> usize {
    if requested < EstimatorOptions::MIN_LOGISTIC_ITER {
        log::warn!(
            "logistic_max_iter={} is below the minimum of {}; using {}",
            requested,
            EstimatorOptions::MIN_LOGISTIC_ITER,
            EstimatorOptions::MIN_LOGISTIC_ITER
        );
        EstimatorOptions::MIN_LOGISTIC_ITER
    } else {
        requested
    }
}

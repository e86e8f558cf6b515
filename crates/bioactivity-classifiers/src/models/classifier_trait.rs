use ndarray::{Array1, Array2};

use crate::config::ModelFamily;
use crate::error::{PipelineError, Result};

/// Probability at or above which a compound is labeled active.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// An unfitted estimator: a family plus its full configuration.
///
/// Fitting never mutates the estimator, so one configuration can be fitted
/// concurrently on several cross-validation folds.
pub trait ClassifierModel: Send + Sync {
    fn family(&self) -> ModelFamily;

    /// Fit on `x` (rows are samples) and boolean labels (`true` = active).
    fn fit(&self, x: &Array2<f64>, y: &Array1<bool>) -> Result<FitOutcome>;
}

/// A trained estimator. Immutable once built.
pub trait FittedClassifier: Send + Sync {
    fn family(&self) -> ModelFamily;

    /// Feature width the model was trained on.
    fn n_features(&self) -> usize;

    /// Positive-class probability for every row, each in [0, 1].
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Labels obtained by thresholding `predict_proba` at [`DECISION_THRESHOLD`].
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<bool>> {
        Ok(self.predict_proba(x)?.mapv(|p| p >= DECISION_THRESHOLD))
    }
}

/// Result of a fit: the model plus non-fatal problems such as non-convergence.
pub struct FitOutcome {
    pub model: Box<dyn FittedClassifier>,
    pub warnings: Vec<PipelineError>,
}

impl FitOutcome {
    pub fn new(model: Box<dyn FittedClassifier>) -> Self {
        FitOutcome {
            model,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: PipelineError) -> Self {
        self.warnings.push(warning);
        self
    }
}

/// Shared input validation for all estimators.
pub(crate) fn check_training_input(x: &Array2<f64>, y: &Array1<bool>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::Data(format!(
            "feature matrix has {} rows but {} labels were given",
            x.nrows(),
            y.len()
        )));
    }
    if x.ncols() == 0 {
        return Err(PipelineError::Data("feature matrix has no columns".to_string()));
    }
    let positives = y.iter().filter(|&&v| v).count();
    if positives == 0 || positives == y.len() {
        return Err(PipelineError::Data(format!(
            "training labels contain a single class ({} samples)",
            y.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_width(expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(PipelineError::shape(expected, x.ncols()));
    }
    Ok(())
}

/// Numerically stable logistic function.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

use ndarray::{Array1, Array2};

use crate::config::{ModelFamily, SingleClassPolicy};
use crate::error::{PipelineError, Result};
use crate::metrics::{roc_curve, ConfusionMatrix, RocPoint};
use crate::models::classifier_trait::{FittedClassifier, DECISION_THRESHOLD};

/// Held-out performance of one fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub family: ModelFamily,
    pub accuracy: f64,
    pub weighted_f1: f64,
    pub auc: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub precision: f64,
    pub mcc: f64,
    pub confusion: ConfusionMatrix,
    /// Empty when the held-out labels contain a single class.
    pub roc: Vec<RocPoint>,
}

impl EvaluationRecord {
    /// Metric values in evaluation-table column order.
    pub fn metric_values(&self) -> [f64; 7] {
        [
            self.accuracy,
            self.weighted_f1,
            self.auc,
            self.sensitivity,
            self.specificity,
            self.precision,
            self.mcc,
        ]
    }
}

/// Computes the fixed metric battery from one predict/predict_proba pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    pub single_class: SingleClassPolicy,
}

impl Evaluator {
    pub fn new(single_class: SingleClassPolicy) -> Self {
        Evaluator { single_class }
    }

    pub fn evaluate(
        &self,
        model: &dyn FittedClassifier,
        x: &Array2<f64>,
        y: &Array1<bool>,
    ) -> Result<EvaluationRecord> {
        let family = model.family();
        if x.nrows() == 0 {
            return Err(PipelineError::Data(format!(
                "{}: held-out split is empty",
                family
            )));
        }
        if x.nrows() != y.len() {
            return Err(PipelineError::Data(format!(
                "{}: held-out split has {} rows but {} labels",
                family,
                x.nrows(),
                y.len()
            )));
        }
        if x.ncols() != model.n_features() {
            return Err(PipelineError::shape(model.n_features(), x.ncols()));
        }

        let positives = y.iter().filter(|&&v| v).count();
        if positives == 0 || positives == y.len() {
            match self.single_class {
                SingleClassPolicy::Reject => {
                    return Err(PipelineError::Data(format!(
                        "{}: held-out labels contain a single class",
                        family
                    )))
                }
                SingleClassPolicy::Sentinel => log::warn!(
                    "{}: held-out labels contain a single class; AUC and one of sensitivity/specificity are undefined",
                    family
                ),
            }
        }

        let proba = model.predict_proba(x)?;
        let predicted = proba.mapv(|p| p >= DECISION_THRESHOLD);
        let confusion = ConfusionMatrix::from_labels(y, &predicted)?;
        let (auc, roc) = match roc_curve(&proba, y)? {
            Some(curve) => (curve.auc, curve.points),
            None => (f64::NAN, Vec::new()),
        };

        let record = EvaluationRecord {
            family,
            accuracy: confusion.accuracy(),
            weighted_f1: confusion.weighted_f1(),
            auc,
            sensitivity: confusion.sensitivity(),
            specificity: confusion.specificity(),
            precision: confusion.precision(),
            mcc: confusion.mcc(),
            confusion,
            roc,
        };
        log::info!(
            "{}: accuracy {:.3}, F1 {:.3}, AUC {:.3}, MCC {:.3}",
            family,
            record.accuracy,
            record.weighted_f1,
            record.auc,
            record.mcc
        );
        Ok(record)
    }
}

//! Binary classification metrics.
//!
//! Quantities whose denominator vanishes follow one convention throughout:
//! sensitivity, specificity and AUC are NaN when undefined, precision and
//! MCC fall back to 0.
use ndarray::Array1;

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Confusion matrix
// ---------------------------------------------------------------------------

/// 2x2 confusion matrix with the active class as positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &Array1<bool>, y_pred: &Array1<bool>) -> Result<Self> {
        check_lengths(y_true.len(), y_pred.len())?;
        let mut cm = ConfusionMatrix::default();
        for (&truth, &pred) in y_true.iter().zip(y_pred.iter()) {
            match (truth, pred) {
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
                (true, true) => cm.tp += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// Rows are actual (inactive, active), columns predicted.
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// TP / (TP + FN); NaN without actual positives.
    pub fn sensitivity(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// TN / (TN + FP); NaN without actual negatives.
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    /// TP / (TP + FP); 0 without predicted positives.
    pub fn precision(&self) -> f64 {
        ratio_or_zero(self.tp, self.tp + self.fp)
    }

    /// Matthews correlation coefficient; 0 when any marginal is empty.
    pub fn mcc(&self) -> f64 {
        let (tp, tn, fp, fn_) = (
            self.tp as f64,
            self.tn as f64,
            self.fp as f64,
            self.fn_ as f64,
        );
        let denom = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        if denom == 0.0 {
            0.0
        } else {
            (tp * tn - fp * fn_) / denom
        }
    }

    /// Support-weighted mean of the per-class F1 scores.
    pub fn weighted_f1(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return f64::NAN;
        }
        let f1_active = f1(self.tp, self.fp, self.fn_);
        let f1_inactive = f1(self.tn, self.fn_, self.fp);
        let support_active = (self.tp + self.fn_) as f64;
        let support_inactive = (self.tn + self.fp) as f64;
        (f1_active * support_active + f1_inactive * support_inactive) / total as f64
    }
}

/// F1 of one class from its own TP/FP/FN counts; 0 when undefined.
fn f1(tp: usize, fp: usize, fn_: usize) -> f64 {
    ratio_or_zero(2 * tp, 2 * tp + fp + fn_)
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        f64::NAN
    } else {
        num as f64 / denom as f64
    }
}

fn ratio_or_zero(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

fn check_lengths(a: usize, b: usize) -> Result<()> {
    if a == 0 {
        return Err(PipelineError::Data("cannot score an empty set".to_string()));
    }
    if a != b {
        return Err(PipelineError::Data(format!(
            "{} labels but {} predictions",
            a, b
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ROC curve
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RocPoint {
    /// Score at or above which a sample is called active.
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    /// From (0, 0) to (1, 1), one point per distinct score.
    pub points: Vec<RocPoint>,
    pub auc: f64,
}

/// ROC curve of `scores` against `labels`.
///
/// Returns `Ok(None)` when the labels hold a single class, since neither
/// axis is then defined. Tied scores form a single step, which makes the
/// trapezoidal area equal to the rank statistic with ties counted as half.
pub fn roc_curve(scores: &Array1<f64>, labels: &Array1<bool>) -> Result<Option<RocCurve>> {
    check_lengths(labels.len(), scores.len())?;
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(PipelineError::Data("scores contain non-finite values".to_string()));
    }

    let total_pos = labels.iter().filter(|&&l| l).count();
    let total_neg = labels.len() - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return Ok(None);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < order.len() {
        let current = scores[order[i]];
        while i < order.len() && scores[order[i]] == current {
            if labels[order[i]] {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold: current,
            fpr: fp as f64 / total_neg as f64,
            tpr: tp as f64 / total_pos as f64,
        });
    }

    let auc = points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum();

    Ok(Some(RocCurve { points, auc }))
}

/// Area under the ROC curve; NaN for single-class labels.
pub fn roc_auc(scores: &Array1<f64>, labels: &Array1<bool>) -> Result<f64> {
    Ok(roc_curve(scores, labels)?.map_or(f64::NAN, |curve| curve.auc))
}

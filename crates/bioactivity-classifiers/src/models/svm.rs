use linfa::dataset::Pr;
use linfa::traits::Predict;
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, Array2};

use crate::config::{ModelFamily, SvmKernel};
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::{
    check_training_input, check_width, ClassifierModel, FitOutcome, FittedClassifier,
};

/// Support vector classifier with Platt-scaled probability outputs.
#[derive(Debug, Clone)]
pub struct SVMClassifier {
    pub c: f64,
    pub kernel: SvmKernel,
    /// Solver tolerance
    pub eps: f64,
}

impl SVMClassifier {
    pub fn new(c: f64, kernel: SvmKernel, eps: f64) -> Self {
        SVMClassifier { c, kernel, eps }
    }

    /// Width of the gaussian kernel `exp(-||a - b||^2 / w)`, set to
    /// `n_features * Var(x)` so that it adapts to the scale of the data.
    fn gaussian_width(x: &Array2<f64>) -> f64 {
        let n = x.len() as f64;
        let mean = x.sum() / n;
        let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let width = x.ncols() as f64 * var;
        if width > 0.0 && width.is_finite() {
            width
        } else {
            1.0
        }
    }
}

impl ClassifierModel for SVMClassifier {
    fn family(&self) -> ModelFamily {
        ModelFamily::Svm
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<bool>) -> Result<FitOutcome> {
        check_training_input(x, y)?;
        let dataset = Dataset::new(x.to_owned(), y.to_owned());

        let params: SvmParams<f64, Pr> = Svm::<f64, Pr>::params()
            .eps(self.eps)
            .pos_neg_weights(self.c, self.c);
        let params = match self.kernel {
            SvmKernel::Linear => params.linear_kernel(),
            SvmKernel::Rbf => params.gaussian_kernel(Self::gaussian_width(x)),
        };

        let model = <SvmParams<f64, Pr> as linfa::traits::Fit<_, _, _>>::fit(&params, &dataset)
            .map_err(|e| PipelineError::Estimator {
                family: ModelFamily::Svm,
                reason: e.to_string(),
            })?;

        log::trace!(
            "SVM (C={}, kernel={}) fitted with {} support vectors",
            self.c,
            self.kernel,
            model.nsupport()
        );

        Ok(FitOutcome::new(Box::new(FittedSVM {
            model,
            n_features: x.ncols(),
        })))
    }
}

pub struct FittedSVM {
    model: Svm<f64, Pr>,
    n_features: usize,
}

impl FittedClassifier for FittedSVM {
    fn family(&self) -> ModelFamily {
        ModelFamily::Svm
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_width(self.n_features, x)?;
        let predictions = self.model.predict(x.to_owned());
        let proba: Array1<f64> = predictions.targets().iter().map(|&p| *p as f64).collect();
        if proba.iter().any(|p| !p.is_finite()) {
            return Err(PipelineError::Estimator {
                family: ModelFamily::Svm,
                reason: "probability calibration produced non-finite values".to_string(),
            });
        }
        Ok(proba.mapv(|p| p.clamp(0.0, 1.0)))
    }
}

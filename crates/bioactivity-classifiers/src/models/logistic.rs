//! L2-regularized logistic regression fitted with Newton's method.
//!
//! Minimizes `sum(log(1 + exp(z_i)) - y_i z_i) + ||w||^2 / (2C)` with an
//! unpenalized intercept. Each Newton step solves the regularized Hessian
//! system by Cholesky factorization and is damped by a backtracking line
//! search.

use linfa_linalg::cholesky::SolveC;
use ndarray::{s, Array1, Array2, Axis};

use crate::config::ModelFamily;
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::{
    check_training_input, check_width, sigmoid, ClassifierModel, FitOutcome, FittedClassifier,
};

#[derive(Debug, Clone)]
pub struct LogisticRegressionClassifier {
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    /// Convergence threshold on the largest per-sample gradient component
    pub tol: f64,
}

impl LogisticRegressionClassifier {
    /// Ridge added to the intercept's Hessian entry to keep it positive definite.
    const INTERCEPT_RIDGE: f64 = 1e-10;
    const ARMIJO: f64 = 1e-4;
    const MIN_STEP: f64 = 1e-10;

    pub fn new(c: f64, max_iter: usize, tol: f64) -> Self {
        LogisticRegressionClassifier { c, max_iter, tol }
    }

    fn objective(&self, x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>, b: f64) -> f64 {
        let z = x.dot(w) + b;
        let data_term: f64 = z
            .iter()
            .zip(y.iter())
            .map(|(&zi, &yi)| log1p_exp(zi) - yi * zi)
            .sum();
        data_term + w.dot(w) / (2.0 * self.c)
    }
}

/// `ln(1 + e^z)` without overflow.
fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

impl ClassifierModel for LogisticRegressionClassifier {
    fn family(&self) -> ModelFamily {
        ModelFamily::LogisticRegression
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<bool>) -> Result<FitOutcome> {
        check_training_input(x, y)?;
        let (n_samples, n_features) = x.dim();
        let yf = y.mapv(|v| if v { 1.0 } else { 0.0 });
        let lambda = 1.0 / self.c;

        let mut w = Array1::<f64>::zeros(n_features);
        let mut b = 0.0;
        let mut objective = self.objective(x, &yf, &w, b);
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.max_iter {
            let p = (x.dot(&w) + b).mapv(sigmoid);
            let residual = &p - &yf;

            // Gradient stacked as [w..., b]
            let mut grad = Array1::<f64>::zeros(n_features + 1);
            grad.slice_mut(s![..n_features])
                .assign(&(x.t().dot(&residual) + lambda * &w));
            grad[n_features] = residual.sum();

            let grad_max = grad.iter().fold(0.0f64, |m, g| m.max(g.abs()));
            if grad_max / n_samples as f64 <= self.tol {
                converged = true;
                break;
            }

            let s_diag = p.mapv(|pi| pi * (1.0 - pi));
            let weighted = x * &s_diag.view().insert_axis(Axis(1));
            let mut hessian = Array2::<f64>::zeros((n_features + 1, n_features + 1));
            {
                let mut h_ww = hessian.slice_mut(s![..n_features, ..n_features]);
                h_ww.assign(&x.t().dot(&weighted));
                h_ww.diag_mut().mapv_inplace(|v| v + lambda);
            }
            let h_wb = weighted.sum_axis(Axis(0));
            hessian.slice_mut(s![..n_features, n_features]).assign(&h_wb);
            hessian.slice_mut(s![n_features, ..n_features]).assign(&h_wb);
            hessian[[n_features, n_features]] = s_diag.sum() + Self::INTERCEPT_RIDGE;

            // Fall back to steepest descent if the system cannot be factorized
            let direction = newton_direction(hessian, &grad).unwrap_or_else(|| grad.clone());
            let decrease = grad.dot(&direction);

            let mut step = 1.0;
            let mut accepted = false;
            while step >= Self::MIN_STEP {
                let w_new = &w - &(step * &direction.slice(s![..n_features]));
                let b_new = b - step * direction[n_features];
                let candidate = self.objective(x, &yf, &w_new, b_new);
                if candidate <= objective - Self::ARMIJO * step * decrease {
                    w = w_new;
                    b = b_new;
                    objective = candidate;
                    accepted = true;
                    break;
                }
                step *= 0.5;
            }
            iterations += 1;

            if !accepted {
                // No further decrease is achievable in floating point
                converged = true;
                break;
            }
        }

        log::trace!(
            "Logistic regression (C={}) stopped after {} iterations, objective {:.6}",
            self.c,
            iterations,
            objective
        );

        let outcome = FitOutcome::new(Box::new(FittedLogisticRegression {
            coefficients: w,
            intercept: b,
        }));
        if converged {
            Ok(outcome)
        } else {
            Ok(outcome.with_warning(PipelineError::Fit {
                family: ModelFamily::LogisticRegression,
                reason: format!(
                    "reached the iteration cap of {} (C={}); increase logistic_max_iter",
                    self.max_iter, self.c
                ),
            }))
        }
    }
}

pub struct FittedLogisticRegression {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl FittedLogisticRegression {
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl FittedClassifier for FittedLogisticRegression {
    fn family(&self) -> ModelFamily {
        ModelFamily::LogisticRegression
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_width(self.coefficients.len(), x)?;
        Ok((x.dot(&self.coefficients) + self.intercept).mapv(sigmoid))
    }
}

/// Newton direction `H^-1 g` by Cholesky factorization; `None` if `H` is not
/// positive definite.
fn newton_direction(mut hessian: Array2<f64>, grad: &Array1<f64>) -> Option<Array1<f64>> {
    let rhs = grad.view().insert_axis(Axis(1));
    let solution = hessian.solvec(&rhs).ok()?;
    let direction = solution.column(0).to_owned();
    direction.iter().all(|v| v.is_finite()).then_some(direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn newton_direction_solves_spd_system() {
        let h = array![[4.0, 2.0], [2.0, 3.0]];
        let g = array![2.0, 1.0];
        let d = newton_direction(h.clone(), &g).unwrap();
        assert!((h.dot(&d) - &g).iter().all(|v| v.abs() < 1e-12));
        assert!(newton_direction(array![[0.0, 1.0], [1.0, 0.0]], &g).is_none());
    }

    #[test]
    fn learns_a_linear_boundary() {
        let x = array![[-2.0, 0.3], [-1.5, -0.2], [-1.0, 0.1], [1.0, 0.0], [1.5, 0.2], [2.0, -0.1]];
        let y = array![false, false, false, true, true, true];
        let outcome = LogisticRegressionClassifier::new(1.0, 1000, 1e-6)
            .fit(&x, &y)
            .unwrap();
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.model.predict(&x).unwrap(), y);
        let proba = outcome.model.predict_proba(&x).unwrap();
        assert!(proba[0] < 0.5 && proba[5] > 0.5);
    }

    #[test]
    fn stronger_regularization_shrinks_coefficients() {
        let x = array![[-1.0], [-0.5], [0.2], [0.4], [0.9], [-0.1]];
        let y = array![false, false, true, true, true, false];
        let fit = |c: f64| {
            let model = LogisticRegressionClassifier::new(c, 1000, 1e-8);
            let outcome = model.fit(&x, &y).unwrap();
            outcome.model.predict_proba(&array![[1.0]]).unwrap()[0]
        };
        assert!(fit(0.1) < fit(10.0));
    }

    #[test]
    fn iteration_cap_is_reported_as_warning() {
        let x = array![[-1.0], [-0.5], [0.5], [1.0]];
        let y = array![false, true, false, true];
        let outcome = LogisticRegressionClassifier::new(1.0, 1, 0.0)
            .fit(&x, &y)
            .unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(outcome.warnings[0], PipelineError::Fit { .. }));
    }
}

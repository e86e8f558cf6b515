//! Feature standardization shared by training, evaluation and scoring.
//!
//! A `Standardizer` is fitted once on the training matrix and then only
//! read: the same per-column statistics are applied to the held-out split
//! and to every external prediction matrix, so new data can never shift the
//! feature space the models were trained in.

use ndarray::{Array1, Array2, Axis};
use statrs::statistics::Statistics;

use crate::config::ZeroVariancePolicy;
use crate::error::{PipelineError, Result};

/// Per-column mean/std standardizer.
#[derive(Clone, Debug, PartialEq)]
pub struct Standardizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
    constant_columns: Vec<usize>,
}

impl Standardizer {
    /// Columns whose population std falls below this are treated as constant.
    const MIN_STD: f64 = 1e-12;

    /// Fit from an `N x D` matrix where rows are samples and columns are features.
    pub fn fit(x: &Array2<f64>, policy: ZeroVariancePolicy) -> Result<Self> {
        let (nrows, ncols) = x.dim();
        if ncols == 0 {
            return Err(PipelineError::Data(
                "cannot standardize a matrix without feature columns".to_string(),
            ));
        }
        if nrows < 2 {
            return Err(PipelineError::Data(format!(
                "need at least 2 samples to fit the standardizer, got {}",
                nrows
            )));
        }
        if let Some(pos) = x.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::Data(format!(
                "non-finite value in row {}, column {}",
                pos / ncols,
                pos % ncols
            )));
        }

        let mut mean = Array1::zeros(ncols);
        let mut scale = Array1::ones(ncols);
        let mut constant_columns = Vec::new();

        for (c, column) in x.axis_iter(Axis(1)).enumerate() {
            mean[c] = column.iter().mean();
            let std = column.iter().population_std_dev();
            if std > Self::MIN_STD {
                scale[c] = std;
            } else {
                constant_columns.push(c);
            }
        }

        if !constant_columns.is_empty() {
            match policy {
                ZeroVariancePolicy::Reject => {
                    return Err(PipelineError::Data(format!(
                        "feature column {} has zero variance ({} constant columns in total)",
                        constant_columns[0],
                        constant_columns.len()
                    )));
                }
                ZeroVariancePolicy::UnitScale => {
                    log::warn!(
                        "{} of {} feature columns have zero variance; they are centered with scale 1",
                        constant_columns.len(),
                        ncols
                    );
                }
            }
        }

        Ok(Standardizer {
            mean,
            scale,
            constant_columns,
        })
    }

    /// Apply `(x - mean) / scale` column-wise and return a new matrix.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::shape(self.n_features(), x.ncols()));
        }
        let mut out = x.to_owned();
        out -= &self.mean;
        out /= &self.scale;
        Ok(out)
    }

    /// Convenience: fit and return the fitted state together with the transformed matrix.
    pub fn fit_transform(x: &Array2<f64>, policy: ZeroVariancePolicy) -> Result<(Self, Array2<f64>)> {
        let standardizer = Self::fit(x, policy)?;
        let transformed = standardizer.transform(x)?;
        Ok((standardizer, transformed))
    }

    /// Feature width recorded at fit time.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn constant_columns(&self) -> &[usize] {
        &self.constant_columns
    }
}

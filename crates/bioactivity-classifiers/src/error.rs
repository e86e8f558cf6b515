use thiserror::Error;

use crate::config::ModelFamily;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures raised by the training and scoring pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Feature width at apply time differs from the width seen at fit time.
    #[error("Shape mismatch: expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },

    /// Degenerate input: single-class split, constant column, empty matrix...
    #[error("Data error: {0}")]
    Data(String),

    #[error("Hyperparameter search failed for {family}: {reason}")]
    Search { family: ModelFamily, reason: String },

    /// Non-convergence. Reported as a warning by the trainers.
    #[error("{family} did not converge: {reason}")]
    Fit { family: ModelFamily, reason: String },

    #[error("{family} estimator failed: {reason}")]
    Estimator { family: ModelFamily, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn shape(expected: usize, actual: usize) -> Self {
        PipelineError::Shape { expected, actual }
    }

    /// Family the error is attributed to, when it is family-local.
    pub fn family(&self) -> Option<ModelFamily> {
        match self {
            PipelineError::Search { family, .. }
            | PipelineError::Fit { family, .. }
            | PipelineError::Estimator { family, .. } => Some(*family),
            _ => None,
        }
    }
}

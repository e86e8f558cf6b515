use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, Result};
use crate::registry::{default_registry, ModelSpec};

/// The classifier families the pipeline knows how to build.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    #[serde(rename = "RF", alias = "random_forest")]
    RandomForest,
    #[serde(rename = "GBoost", alias = "gbdt")]
    GradientBoosting,
    #[serde(rename = "LR", alias = "logistic")]
    LogisticRegression,
    #[serde(rename = "SVM", alias = "svm")]
    Svm,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::RandomForest,
        ModelFamily::GradientBoosting,
        ModelFamily::LogisticRegression,
        ModelFamily::Svm,
    ];

    /// Short identifier used in tables and column names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::RandomForest => "RF",
            ModelFamily::GradientBoosting => "GBoost",
            ModelFamily::LogisticRegression => "LR",
            ModelFamily::Svm => "SVM",
        }
    }

    /// Name of the probability column this family writes in the prediction table.
    pub fn probability_column(&self) -> String {
        format!("{}_Probability", self.as_str())
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rf" | "random_forest" | "randomforest" => Ok(ModelFamily::RandomForest),
            "gboost" | "gbdt" | "gradient_boosting" => Ok(ModelFamily::GradientBoosting),
            "lr" | "logistic" | "logistic_regression" => Ok(ModelFamily::LogisticRegression),
            "svm" => Ok(ModelFamily::Svm),
            _ => Err(format!(
                "Unknown model family: {}. Valid options are: RF, GBoost, LR, SVM",
                s
            )),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SvmKernel {
    Linear,
    Rbf,
}

impl fmt::Display for SvmKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvmKernel::Linear => f.write_str("linear"),
            SvmKernel::Rbf => f.write_str("rbf"),
        }
    }
}

/// One concrete hyperparameter assignment for one family.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "family")]
pub enum HyperParams {
    #[serde(rename = "RF")]
    RandomForest { n_estimators: usize },
    #[serde(rename = "GBoost")]
    GradientBoosting {
        n_estimators: usize,
        learning_rate: f64,
    },
    #[serde(rename = "LR")]
    LogisticRegression { c: f64 },
    #[serde(rename = "SVM")]
    Svm { c: f64, kernel: SvmKernel },
}

impl HyperParams {
    pub fn family(&self) -> ModelFamily {
        match self {
            HyperParams::RandomForest { .. } => ModelFamily::RandomForest,
            HyperParams::GradientBoosting { .. } => ModelFamily::GradientBoosting,
            HyperParams::LogisticRegression { .. } => ModelFamily::LogisticRegression,
            HyperParams::Svm { .. } => ModelFamily::Svm,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PipelineError::Config(format!("{}: {}", self.family(), msg)));
        match *self {
            HyperParams::RandomForest { n_estimators } if n_estimators == 0 => {
                invalid("n_estimators must be positive".to_string())
            }
            HyperParams::GradientBoosting { n_estimators, .. } if n_estimators == 0 => {
                invalid("n_estimators must be positive".to_string())
            }
            HyperParams::GradientBoosting { learning_rate, .. }
                if !(learning_rate > 0.0 && learning_rate.is_finite()) =>
            {
                invalid(format!("learning_rate must be positive, got {}", learning_rate))
            }
            HyperParams::LogisticRegression { c } | HyperParams::Svm { c, .. }
                if !(c > 0.0 && c.is_finite()) =>
            {
                invalid(format!("C must be positive, got {}", c))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for HyperParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyperParams::RandomForest { n_estimators } => {
                write!(f, "n_estimators={}", n_estimators)
            }
            HyperParams::GradientBoosting {
                n_estimators,
                learning_rate,
            } => write!(
                f,
                "learning_rate={}, n_estimators={}",
                learning_rate, n_estimators
            ),
            HyperParams::LogisticRegression { c } => write!(f, "C={}", c),
            HyperParams::Svm { c, kernel } => write!(f, "C={}, kernel={}", c, kernel),
        }
    }
}

/// Base estimator configuration that is never searched over.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EstimatorOptions {
    /// Depth limit for forest trees; `None` grows until leaves are pure.
    pub forest_max_depth: Option<usize>,
    pub forest_min_samples_leaf: usize,
    pub gbdt_max_depth: u32,
    /// Newton iteration cap for logistic regression (raised to at least 1000).
    pub logistic_max_iter: usize,
    pub logistic_tol: f64,
    /// Stopping tolerance of the SVM solver.
    pub svm_eps: f64,
}

impl EstimatorOptions {
    pub const MIN_LOGISTIC_ITER: usize = 1000;
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            forest_max_depth: None,
            forest_min_samples_leaf: 1,
            gbdt_max_depth: 3,
            logistic_max_iter: Self::MIN_LOGISTIC_ITER,
            logistic_tol: 1e-4,
            svm_eps: 1e-3,
        }
    }
}

/// Criterion maximized by the cross-validated search.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchMetric {
    Accuracy,
    RocAuc,
    Mcc,
    WeightedF1,
}

impl FromStr for SearchMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accuracy" => Ok(SearchMetric::Accuracy),
            "roc_auc" | "auc" => Ok(SearchMetric::RocAuc),
            "mcc" => Ok(SearchMetric::Mcc),
            "weighted_f1" | "f1" => Ok(SearchMetric::WeightedF1),
            _ => Err(format!(
                "Unknown search metric: {}. Valid options are: accuracy, roc_auc, mcc, weighted_f1",
                s
            )),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStrategy {
    /// Cross-validated grid search per family.
    Search,
    /// One predetermined assignment per family.
    Fixed,
}

impl FromStr for TrainingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "search" | "grid" => Ok(TrainingStrategy::Search),
            "fixed" => Ok(TrainingStrategy::Fixed),
            _ => Err(format!(
                "Unknown training strategy: {}. Valid options are: search, fixed",
                s
            )),
        }
    }
}

/// What the standardizer does with a constant column.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// Keep the column with scale 1, so it maps to a constant 0.
    #[default]
    UnitScale,
    /// Fail the fit with a data error.
    Reject,
}

/// What the evaluator does when the held-out labels contain a single class.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SingleClassPolicy {
    /// Report NaN for the undefined metrics.
    #[default]
    Sentinel,
    Reject,
}

/// Central configuration of one pipeline run.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub seed: u64,
    /// Fraction of the dataset held out for evaluation.
    pub test_fraction: f64,
    pub cv_folds: usize,
    pub strategy: TrainingStrategy,
    pub search_metric: SearchMetric,
    /// Wall-clock budget per family search; candidates not started in time are skipped.
    pub search_budget_secs: Option<u64>,
    pub zero_variance: ZeroVariancePolicy,
    pub single_class: SingleClassPolicy,
    pub estimators: EstimatorOptions,
    pub models: Vec<ModelSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            cv_folds: 5,
            strategy: TrainingStrategy::Search,
            search_metric: SearchMetric::Accuracy,
            search_budget_secs: None,
            zero_variance: ZeroVariancePolicy::UnitScale,
            single_class: SingleClassPolicy::Sentinel,
            estimators: EstimatorOptions::default(),
            models: default_registry(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::Config(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.cv_folds < 2 {
            return Err(PipelineError::Config(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.models.is_empty() {
            return Err(PipelineError::Config("no model families configured".to_string()));
        }
        for (i, spec) in self.models.iter().enumerate() {
            spec.validate()?;
            if self.models[..i].iter().any(|other| other.family == spec.family) {
                return Err(PipelineError::Config(format!(
                    "model family {} configured more than once",
                    spec.family
                )));
            }
        }
        Ok(())
    }
}

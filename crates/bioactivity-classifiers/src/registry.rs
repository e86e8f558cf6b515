//! Model registry: the fixed set of classifier families, their search grids
//! and their predetermined assignments for the fixed-parameter path.
//!
//! Grids enumerate with keys in alphabetical order and the last key varying
//! fastest, so the first-encountered tie-break of the search is stable
//! across runs and across platforms.
use serde::{Deserialize, Serialize};

use crate::config::{HyperParams, ModelFamily, SvmKernel};
use crate::error::{PipelineError, Result};

/// Finite candidate sets for one family's hyperparameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "family")]
pub enum ParamGrid {
    #[serde(rename = "RF")]
    RandomForest { n_estimators: Vec<usize> },
    #[serde(rename = "GBoost")]
    GradientBoosting {
        n_estimators: Vec<usize>,
        learning_rate: Vec<f64>,
    },
    #[serde(rename = "LR")]
    LogisticRegression { c: Vec<f64> },
    #[serde(rename = "SVM")]
    Svm { c: Vec<f64>, kernel: Vec<SvmKernel> },
}

impl ParamGrid {
    pub fn family(&self) -> ModelFamily {
        match self {
            ParamGrid::RandomForest { .. } => ModelFamily::RandomForest,
            ParamGrid::GradientBoosting { .. } => ModelFamily::GradientBoosting,
            ParamGrid::LogisticRegression { .. } => ModelFamily::LogisticRegression,
            ParamGrid::Svm { .. } => ModelFamily::Svm,
        }
    }

    /// Every grid point, in enumeration order.
    pub fn candidates(&self) -> Vec<HyperParams> {
        match self {
            ParamGrid::RandomForest { n_estimators } => n_estimators
                .iter()
                .map(|&n_estimators| HyperParams::RandomForest { n_estimators })
                .collect(),
            ParamGrid::GradientBoosting {
                n_estimators,
                learning_rate,
            } => learning_rate
                .iter()
                .flat_map(|&learning_rate| {
                    n_estimators
                        .iter()
                        .map(move |&n_estimators| HyperParams::GradientBoosting {
                            n_estimators,
                            learning_rate,
                        })
                })
                .collect(),
            ParamGrid::LogisticRegression { c } => c
                .iter()
                .map(|&c| HyperParams::LogisticRegression { c })
                .collect(),
            ParamGrid::Svm { c, kernel } => c
                .iter()
                .flat_map(|&c| kernel.iter().map(move |&kernel| HyperParams::Svm { c, kernel }))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ParamGrid::RandomForest { n_estimators } => n_estimators.len(),
            ParamGrid::GradientBoosting {
                n_estimators,
                learning_rate,
            } => n_estimators.len() * learning_rate.len(),
            ParamGrid::LogisticRegression { c } => c.len(),
            ParamGrid::Svm { c, kernel } => c.len() * kernel.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A family together with its grid and its fixed assignment.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub family: ModelFamily,
    pub grid: ParamGrid,
    pub fixed: HyperParams,
}

impl ModelSpec {
    pub fn new(grid: ParamGrid, fixed: HyperParams) -> Result<Self> {
        let spec = ModelSpec {
            family: grid.family(),
            grid,
            fixed,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Registry entry for `family` with the default grid and assignment.
    pub fn for_family(family: ModelFamily) -> Self {
        match family {
            ModelFamily::RandomForest => ModelSpec {
                family,
                grid: ParamGrid::RandomForest {
                    n_estimators: vec![50, 100, 200],
                },
                fixed: HyperParams::RandomForest { n_estimators: 100 },
            },
            ModelFamily::GradientBoosting => ModelSpec {
                family,
                grid: ParamGrid::GradientBoosting {
                    n_estimators: vec![50, 100, 200],
                    learning_rate: vec![0.01, 0.1, 0.5],
                },
                fixed: HyperParams::GradientBoosting {
                    n_estimators: 100,
                    learning_rate: 0.1,
                },
            },
            ModelFamily::LogisticRegression => ModelSpec {
                family,
                grid: ParamGrid::LogisticRegression {
                    c: vec![0.1, 1.0, 10.0],
                },
                fixed: HyperParams::LogisticRegression { c: 1.0 },
            },
            ModelFamily::Svm => ModelSpec {
                family,
                grid: ParamGrid::Svm {
                    c: vec![0.1, 1.0, 10.0],
                    kernel: vec![SvmKernel::Linear, SvmKernel::Rbf],
                },
                fixed: HyperParams::Svm {
                    c: 1.0,
                    kernel: SvmKernel::Rbf,
                },
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.family() != self.family || self.fixed.family() != self.family {
            return Err(PipelineError::Config(format!(
                "model spec for {} carries a grid for {} and fixed parameters for {}",
                self.family,
                self.grid.family(),
                self.fixed.family()
            )));
        }
        self.fixed.validate()?;
        for candidate in self.grid.candidates() {
            candidate.validate()?;
        }
        Ok(())
    }
}

/// The four supported families in report order: RF, GBoost, LR, SVM.
pub fn default_registry() -> Vec<ModelSpec> {
    ModelFamily::ALL
        .iter()
        .map(|&family| ModelSpec::for_family(family))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_sizes() {
        let sizes: Vec<usize> = default_registry().iter().map(|s| s.grid.len()).collect();
        assert_eq!(sizes, vec![3, 9, 3, 6]);
        for spec in default_registry() {
            assert_eq!(spec.grid.candidates().len(), spec.grid.len());
            assert!(spec.validate().is_ok());
        }
    }

    #[test]
    fn gbdt_grid_varies_tree_count_fastest() {
        let candidates = ModelSpec::for_family(ModelFamily::GradientBoosting)
            .grid
            .candidates();
        assert_eq!(
            candidates[0],
            HyperParams::GradientBoosting {
                n_estimators: 50,
                learning_rate: 0.01
            }
        );
        assert_eq!(
            candidates[1],
            HyperParams::GradientBoosting {
                n_estimators: 100,
                learning_rate: 0.01
            }
        );
        assert_eq!(
            candidates[8],
            HyperParams::GradientBoosting {
                n_estimators: 200,
                learning_rate: 0.5
            }
        );
    }

    #[test]
    fn svm_grid_varies_kernel_fastest() {
        let candidates = ModelSpec::for_family(ModelFamily::Svm).grid.candidates();
        assert_eq!(
            candidates[..2],
            [
                HyperParams::Svm {
                    c: 0.1,
                    kernel: SvmKernel::Linear
                },
                HyperParams::Svm {
                    c: 0.1,
                    kernel: SvmKernel::Rbf
                },
            ]
        );
    }

    #[test]
    fn mismatched_spec_is_rejected() {
        let result = ModelSpec::new(
            ParamGrid::LogisticRegression { c: vec![1.0] },
            HyperParams::RandomForest { n_estimators: 10 },
        );
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn empty_grid_reports_empty() {
        let grid = ParamGrid::Svm {
            c: vec![1.0],
            kernel: vec![],
        };
        assert!(grid.is_empty());
        assert!(grid.candidates().is_empty());
    }
}

//! Training strategies: cross-validated grid search and fixed-parameter fitting.
//!
//! Both produce a [`TrainedModel`] refitted on the full training matrix, so
//! the pipeline treats them interchangeably through the [`Trainer`] trait.
use std::fmt;
use std::time::{Duration, Instant};

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

use crate::config::{
    EstimatorOptions, HyperParams, ModelFamily, PipelineConfig, SearchMetric, TrainingStrategy,
};
use crate::cross_validation::{CvSplit, StratifiedKFold};
use crate::error::{PipelineError, Result};
use crate::metrics::{roc_auc, ConfusionMatrix};
use crate::models::classifier_trait::{FitOutcome, FittedClassifier};
use crate::models::factory::build_model;
use crate::registry::ModelSpec;

/// Mean and spread of one grid point's fold scores.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub params: HyperParams,
    pub mean: f64,
    pub std: f64,
}

/// One family's fitted estimator together with how it was chosen.
pub struct TrainedModel {
    pub family: ModelFamily,
    pub params: HyperParams,
    pub model: Box<dyn FittedClassifier>,
    /// Mean cross-validation score of the winner; `None` for fixed training.
    pub cv_score: Option<f64>,
    /// Every completed grid point in grid order.
    pub candidates: Vec<CandidateScore>,
    /// Non-fatal fit problems of the final refit.
    pub warnings: Vec<PipelineError>,
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("family", &self.family)
            .field("params", &self.params)
            .field("n_features", &self.model.n_features())
            .field("cv_score", &self.cv_score)
            .field("candidates", &self.candidates.len())
            .field("warnings", &self.warnings)
            .finish()
    }
}

pub trait Trainer: Send + Sync {
    fn train(&self, spec: &ModelSpec, x: &Array2<f64>, y: &Array1<bool>) -> Result<TrainedModel>;
}

/// Pick the trainer selected by `config.strategy`.
pub fn trainer_for(config: &PipelineConfig) -> Box<dyn Trainer> {
    match config.strategy {
        TrainingStrategy::Search => Box::new(GridSearchTrainer {
            cv_folds: config.cv_folds,
            metric: config.search_metric,
            seed: config.seed,
            budget: config.search_budget_secs.map(Duration::from_secs),
            options: config.estimators.clone(),
        }),
        TrainingStrategy::Fixed => Box::new(FixedParamTrainer {
            seed: config.seed,
            options: config.estimators.clone(),
        }),
    }
}

fn refit(
    params: &HyperParams,
    options: &EstimatorOptions,
    seed: u64,
    x: &Array2<f64>,
    y: &Array1<bool>,
) -> Result<FitOutcome> {
    let outcome = build_model(params, options, seed).fit(x, y)?;
    for warning in &outcome.warnings {
        log::warn!("{}", warning);
    }
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Fixed parameters
// ---------------------------------------------------------------------------

/// Fits each family once with its predetermined assignment.
#[derive(Debug, Clone)]
pub struct FixedParamTrainer {
    pub seed: u64,
    pub options: EstimatorOptions,
}

impl Trainer for FixedParamTrainer {
    fn train(&self, spec: &ModelSpec, x: &Array2<f64>, y: &Array1<bool>) -> Result<TrainedModel> {
        log::info!("{}: fitting with {}", spec.family, spec.fixed);
        let outcome = refit(&spec.fixed, &self.options, self.seed, x, y)?;
        Ok(TrainedModel {
            family: spec.family,
            params: spec.fixed.clone(),
            model: outcome.model,
            cv_score: None,
            candidates: Vec::new(),
            warnings: outcome.warnings,
        })
    }
}

// ---------------------------------------------------------------------------
// Grid search
// ---------------------------------------------------------------------------

/// Exhaustive search over a family's grid with stratified K-fold scoring.
#[derive(Debug, Clone)]
pub struct GridSearchTrainer {
    pub cv_folds: usize,
    pub metric: SearchMetric,
    pub seed: u64,
    /// Candidates not started within this budget are skipped.
    pub budget: Option<Duration>,
    pub options: EstimatorOptions,
}

enum CandidateOutcome {
    Scored(CandidateScore),
    Failed(PipelineError),
    Skipped,
}

impl GridSearchTrainer {
    pub fn new(cv_folds: usize, metric: SearchMetric, seed: u64) -> Self {
        GridSearchTrainer {
            cv_folds,
            metric,
            seed,
            budget: None,
            options: EstimatorOptions::default(),
        }
    }

    fn score_candidate(
        &self,
        params: &HyperParams,
        folds: &[CvSplit],
        x: &Array2<f64>,
        y: &Array1<bool>,
    ) -> Result<CandidateScore> {
        let scores = folds
            .iter()
            .map(|fold| {
                let x_train = x.select(Axis(0), &fold.train_indices);
                let y_train = y.select(Axis(0), &fold.train_indices);
                let x_test = x.select(Axis(0), &fold.test_indices);
                let y_test = y.select(Axis(0), &fold.test_indices);

                let outcome = build_model(params, &self.options, self.seed).fit(&x_train, &y_train)?;
                let score = fold_score(self.metric, outcome.model.as_ref(), &x_test, &y_test)?;
                if !score.is_finite() {
                    return Err(PipelineError::Data(format!(
                        "fold {} produced a non-finite {:?} score",
                        fold.fold_idx, self.metric
                    )));
                }
                Ok(score)
            })
            .collect::<Result<Vec<f64>>>()?;

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let std = (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
        Ok(CandidateScore {
            params: params.clone(),
            mean,
            std,
        })
    }
}

fn fold_score(
    metric: SearchMetric,
    model: &dyn FittedClassifier,
    x: &Array2<f64>,
    y: &Array1<bool>,
) -> Result<f64> {
    match metric {
        SearchMetric::RocAuc => roc_auc(&model.predict_proba(x)?, y),
        _ => {
            let cm = ConfusionMatrix::from_labels(y, &model.predict(x)?)?;
            Ok(match metric {
                SearchMetric::Mcc => cm.mcc(),
                SearchMetric::WeightedF1 => cm.weighted_f1(),
                _ => cm.accuracy(),
            })
        }
    }
}

impl Trainer for GridSearchTrainer {
    fn train(&self, spec: &ModelSpec, x: &Array2<f64>, y: &Array1<bool>) -> Result<TrainedModel> {
        let family = spec.family;
        let grid = spec.grid.candidates();
        if grid.is_empty() {
            return Err(PipelineError::Search {
                family,
                reason: "hyperparameter grid is empty".to_string(),
            });
        }

        let folds = StratifiedKFold::new(self.cv_folds, self.seed).split(y)?;
        let deadline = self.budget.map(|budget| Instant::now() + budget);
        log::info!(
            "{}: searching {} candidates with {}-fold cross-validation",
            family,
            grid.len(),
            folds.len()
        );

        // Collecting an indexed parallel iterator keeps grid order.
        let outcomes: Vec<CandidateOutcome> = grid
            .par_iter()
            .map(|params| {
                if deadline.map_or(false, |d| Instant::now() >= d) {
                    return CandidateOutcome::Skipped;
                }
                match self.score_candidate(params, &folds, x, y) {
                    Ok(score) => {
                        log::debug!(
                            "{} [{}]: mean {:.4} (std {:.4})",
                            family,
                            params,
                            score.mean,
                            score.std
                        );
                        CandidateOutcome::Scored(score)
                    }
                    Err(e) => {
                        log::debug!("{} [{}]: candidate failed: {}", family, params, e);
                        CandidateOutcome::Failed(e)
                    }
                }
            })
            .collect();

        let mut candidates = Vec::new();
        let (mut failed, mut skipped) = (0usize, 0usize);
        let mut last_error = None;
        for outcome in outcomes {
            match outcome {
                CandidateOutcome::Scored(score) => candidates.push(score),
                CandidateOutcome::Failed(e) => {
                    failed += 1;
                    last_error = Some(e);
                }
                CandidateOutcome::Skipped => skipped += 1,
            }
        }
        if skipped > 0 {
            log::warn!(
                "{}: search budget exhausted, {} of {} candidates skipped",
                family,
                skipped,
                grid.len()
            );
        }

        // Strict comparison keeps the earliest grid point on ties.
        let best = candidates
            .iter()
            .fold(None::<&CandidateScore>, |best, c| match best {
                Some(b) if c.mean <= b.mean => Some(b),
                _ => Some(c),
            })
            .cloned()
            .ok_or_else(|| PipelineError::Search {
                family,
                reason: match last_error {
                    Some(e) => format!("all {} evaluated candidates failed; last error: {}", failed, e),
                    None => "no candidate completed within the search budget".to_string(),
                },
            })?;

        log::info!(
            "{}: best {} with mean {:?} {:.4} ({} scored, {} failed, {} skipped)",
            family,
            best.params,
            self.metric,
            best.mean,
            candidates.len(),
            failed,
            skipped
        );

        let outcome = refit(&best.params, &self.options, self.seed, x, y)?;
        Ok(TrainedModel {
            family,
            params: best.params,
            model: outcome.model,
            cv_score: Some(best.mean),
            candidates,
            warnings: outcome.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ParamGrid;

    fn blobs(n: usize) -> (Array2<f64>, Array1<bool>) {
        let x = Array2::from_shape_fn((n, 3), |(i, j)| {
            let shift = if i % 2 == 0 { -2.0 } else { 2.0 };
            shift + ((i * 7 + j * 3) % 5) as f64 * 0.1
        });
        let y = (0..n).map(|i| i % 2 == 1).collect();
        (x, y)
    }

    fn forest_spec(sizes: Vec<usize>) -> ModelSpec {
        ModelSpec::new(
            ParamGrid::RandomForest { n_estimators: sizes },
            HyperParams::RandomForest { n_estimators: 10 },
        )
        .unwrap()
    }

    #[test]
    fn ties_go_to_first_grid_point() {
        let (x, y) = blobs(40);
        let trainer = GridSearchTrainer::new(5, SearchMetric::Accuracy, 42);
        let trained = trainer.train(&forest_spec(vec![5, 10, 20]), &x, &y).unwrap();
        assert_eq!(trained.params, HyperParams::RandomForest { n_estimators: 5 });
        assert_eq!(trained.cv_score, Some(1.0));
        assert_eq!(trained.candidates.len(), 3);
    }

    #[test]
    fn search_is_deterministic_for_a_seed() {
        let (x, y) = blobs(30);
        let spec = ModelSpec::for_family(ModelFamily::LogisticRegression);
        let trainer = GridSearchTrainer::new(5, SearchMetric::RocAuc, 7);
        let a = trainer.train(&spec, &x, &y).unwrap();
        let b = trainer.train(&spec, &x, &y).unwrap();
        assert_eq!(a.params, b.params);
        assert_eq!(a.candidates, b.candidates);
        assert_eq!(
            a.model.predict_proba(&x).unwrap(),
            b.model.predict_proba(&x).unwrap()
        );
    }

    #[test]
    fn empty_grid_is_a_search_error() {
        let (x, y) = blobs(20);
        let spec = ModelSpec {
            family: ModelFamily::RandomForest,
            grid: ParamGrid::RandomForest {
                n_estimators: vec![],
            },
            fixed: HyperParams::RandomForest { n_estimators: 10 },
        };
        let err = GridSearchTrainer::new(5, SearchMetric::Accuracy, 1)
            .train(&spec, &x, &y)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Search { family: ModelFamily::RandomForest, .. }));
    }

    #[test]
    fn exhausted_budget_is_a_search_error() {
        let (x, y) = blobs(20);
        let mut trainer = GridSearchTrainer::new(5, SearchMetric::Accuracy, 1);
        trainer.budget = Some(Duration::ZERO);
        let err = trainer.train(&forest_spec(vec![5]), &x, &y).unwrap_err();
        assert!(matches!(err, PipelineError::Search { .. }));
    }

    #[test]
    fn fixed_trainer_uses_the_fixed_assignment() {
        let (x, y) = blobs(20);
        let trainer = FixedParamTrainer {
            seed: 3,
            options: EstimatorOptions::default(),
        };
        let trained = trainer.train(&forest_spec(vec![5, 50]), &x, &y).unwrap();
        assert_eq!(trained.params, HyperParams::RandomForest { n_estimators: 10 });
        assert!(trained.cv_score.is_none());
        assert!(trained.candidates.is_empty());
    }

    #[test]
    fn strategy_selects_trainer() {
        let (x, y) = blobs(20);
        let config = PipelineConfig {
            strategy: TrainingStrategy::Fixed,
            ..PipelineConfig::default()
        };
        let spec = forest_spec(vec![5, 50]);
        let trained = trainer_for(&config).train(&spec, &x, &y).unwrap();
        assert!(trained.cv_score.is_none());
    }
}

//! End-to-end run: split, standardize, train, evaluate, score.
//!
//! The standardizer and the input widths are run-level: a failure there
//! aborts the run. Everything after is family-local; a family that fails
//! in one stage is recorded as a [`FamilyFailure`] and left out of the later
//! stages while the remaining families carry on.
use std::fmt;

use rayon::prelude::*;

use crate::config::{ModelFamily, PipelineConfig};
use crate::data_handling::{Dataset, PredictionSet};
use crate::error::{PipelineError, Result};
use crate::evaluation::{EvaluationRecord, Evaluator};
use crate::preprocessing::Standardizer;
use crate::scoring::{PredictionTable, Scorer};
use crate::search::{trainer_for, TrainedModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Training,
    Evaluation,
    Scoring,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Training => f.write_str("training"),
            Stage::Evaluation => f.write_str("evaluation"),
            Stage::Scoring => f.write_str("scoring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FamilyFailure {
    pub family: ModelFamily,
    pub stage: Stage,
    pub error: PipelineError,
}

/// Everything one run produced.
#[derive(Debug)]
pub struct PipelineRun {
    pub standardizer: Standardizer,
    /// Models that were trained and evaluated, in registry order.
    pub models: Vec<TrainedModel>,
    pub evaluations: Vec<EvaluationRecord>,
    pub predictions: Option<PredictionTable>,
    pub failures: Vec<FamilyFailure>,
    pub n_train: usize,
    pub n_test: usize,
}

impl PipelineRun {
    pub fn evaluation(&self, family: ModelFamily) -> Option<&EvaluationRecord> {
        self.evaluations.iter().find(|r| r.family == family)
    }

    pub fn log_summary(&self) {
        log::info!(
            "Run finished: {} models trained on {} compounds, evaluated on {}",
            self.models.len(),
            self.n_train,
            self.n_test
        );
        for model in &self.models {
            match model.cv_score {
                Some(score) => log::info!("  {} [{}] cv score {:.4}", model.family, model.params, score),
                None => log::info!("  {} [{}]", model.family, model.params),
            }
        }
        for failure in &self.failures {
            log::warn!(
                "  {} failed during {}: {}",
                failure.family,
                failure.stage,
                failure.error
            );
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Pipeline { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, dataset: &Dataset, prediction_set: Option<&PredictionSet>) -> Result<PipelineRun> {
        let config = &self.config;
        dataset.log_input_data_summary();
        if let Some(set) = prediction_set {
            if set.n_features() != dataset.n_features() {
                return Err(PipelineError::shape(dataset.n_features(), set.n_features()));
            }
        }

        let split = dataset.train_test_split(config.test_fraction, config.seed)?;
        let (train_pos, train_neg) = split.train.class_counts();
        if train_pos == 0 || train_neg == 0 {
            return Err(PipelineError::Data(format!(
                "training split holds a single class ({} active, {} inactive)",
                train_pos, train_neg
            )));
        }

        let (standardizer, x_train) = Standardizer::fit_transform(&split.train.x, config.zero_variance)?;
        let x_test = standardizer.transform(&split.test.x)?;
        log::info!(
            "Standardized {} features on {} training compounds ({} held out)",
            standardizer.n_features(),
            split.train.n_samples(),
            split.test.n_samples()
        );

        let mut failures = Vec::new();

        // Training, one family per task
        let trainer = trainer_for(config);
        let trained: Vec<(ModelFamily, Result<TrainedModel>)> = config
            .models
            .par_iter()
            .map(|spec| (spec.family, trainer.train(spec, &x_train, &split.train.y)))
            .collect();
        let mut models = Vec::with_capacity(trained.len());
        for (family, result) in trained {
            match result {
                Ok(model) => models.push(model),
                Err(error) => {
                    log::error!("{}: training failed: {}", family, error);
                    failures.push(FamilyFailure {
                        family,
                        stage: Stage::Training,
                        error,
                    });
                }
            }
        }
        if models.is_empty() {
            return Err(PipelineError::Data(
                "no model family could be trained".to_string(),
            ));
        }

        // Evaluation on the held-out split
        let evaluator = Evaluator::new(config.single_class);
        let mut evaluations = Vec::with_capacity(models.len());
        for model in &models {
            match evaluator.evaluate(model.model.as_ref(), &x_test, &split.test.y) {
                Ok(record) => evaluations.push(record),
                Err(error) => {
                    log::error!("{}: evaluation failed: {}", model.family, error);
                    failures.push(FamilyFailure {
                        family: model.family,
                        stage: Stage::Evaluation,
                        error,
                    });
                }
            }
        }

        models.retain(|model| evaluations.iter().any(|r| r.family == model.family));

        // Scoring of the external compounds
        let predictions = match prediction_set {
            Some(_) if models.is_empty() => {
                log::warn!("No model passed evaluation; the prediction set is not scored");
                None
            }
            Some(set) => {
                let output = Scorer::new(&standardizer).score(&models, set)?;
                failures.extend(output.failures.into_iter().map(|(family, error)| FamilyFailure {
                    family,
                    stage: Stage::Scoring,
                    error,
                }));
                Some(output.table)
            }
            None => None,
        };

        Ok(PipelineRun {
            standardizer,
            models,
            evaluations,
            predictions,
            failures,
            n_train: split.train.n_samples(),
            n_test: split.test.n_samples(),
        })
    }
}

use ndarray::{Array2, ArrayView1};

use crate::config::ModelFamily;
use crate::data_handling::PredictionSet;
use crate::error::{PipelineError, Result};
use crate::preprocessing::Standardizer;
use crate::search::TrainedModel;

/// Per-compound positive-class probabilities, one column per model.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    pub id_column: String,
    pub ids: Vec<String>,
    pub families: Vec<ModelFamily>,
    /// `ids.len() x families.len()`
    pub probabilities: Array2<f64>,
}

impl PredictionTable {
    pub fn column_names(&self) -> Vec<String> {
        self.families.iter().map(ModelFamily::probability_column).collect()
    }

    /// Rows as (identifier, probabilities in column order).
    pub fn records(&self) -> impl Iterator<Item = (&str, ArrayView1<'_, f64>)> {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.probabilities.rows())
    }

    pub fn column(&self, family: ModelFamily) -> Option<ArrayView1<'_, f64>> {
        self.families
            .iter()
            .position(|&f| f == family)
            .map(|i| self.probabilities.column(i))
    }
}

#[derive(Debug)]
pub struct ScoreOutput {
    pub table: PredictionTable,
    /// Models left out of the table because their probability call failed.
    pub failures: Vec<(ModelFamily, PipelineError)>,
}

/// Applies the fitted standardizer and every fitted model to new compounds.
pub struct Scorer<'a> {
    standardizer: &'a Standardizer,
}

impl<'a> Scorer<'a> {
    pub fn new(standardizer: &'a Standardizer) -> Self {
        Scorer { standardizer }
    }

    /// Score `set` with `models`, keeping the caller's model order.
    ///
    /// A width mismatch against the standardizer fails the whole call; a
    /// model whose own probability call fails is dropped from the table.
    pub fn score(&self, models: &[TrainedModel], set: &PredictionSet) -> Result<ScoreOutput> {
        let x = self.standardizer.transform(&set.x)?;
        log::info!(
            "Scoring {} compounds with {} models",
            set.n_samples(),
            models.len()
        );

        let mut families = Vec::with_capacity(models.len());
        let mut columns = Vec::with_capacity(models.len());
        let mut failures = Vec::new();
        for trained in models {
            match trained.model.predict_proba(&x) {
                Ok(proba) => {
                    families.push(trained.family);
                    columns.push(proba);
                }
                Err(e) => {
                    log::warn!("{}: scoring failed: {}", trained.family, e);
                    failures.push((trained.family, e));
                }
            }
        }

        let mut probabilities = Array2::zeros((set.n_samples(), columns.len()));
        for (j, column) in columns.iter().enumerate() {
            probabilities.column_mut(j).assign(column);
        }

        Ok(ScoreOutput {
            table: PredictionTable {
                id_column: set.id_column.clone(),
                ids: set.ids.clone(),
                families,
                probabilities,
            },
            failures,
        })
    }
}

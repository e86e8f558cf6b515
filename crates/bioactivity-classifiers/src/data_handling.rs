//! Data structures for labeled screening datasets and unlabeled prediction sets.
//!
//! `Dataset` keeps the compound identifiers next to the feature matrix so a
//! row can always be traced back to its compound; the identifiers never take
//! part in training.
use ndarray::{Array1, Array2, Axis};

use crate::cross_validation::stratified_train_test_split;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct Dataset {
    /// Header of the identifier column, carried through to the output tables
    pub id_column: String,
    pub ids: Vec<String>,
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    /// `true` marks an active compound
    pub y: Array1<bool>,
}

impl Dataset {
    pub fn new(
        id_column: impl Into<String>,
        ids: Vec<String>,
        feature_names: Vec<String>,
        x: Array2<f64>,
        y: Array1<bool>,
    ) -> Result<Self> {
        if x.nrows() != y.len() || x.nrows() != ids.len() {
            return Err(PipelineError::Data(format!(
                "dataset has {} rows, {} labels and {} identifiers",
                x.nrows(),
                y.len(),
                ids.len()
            )));
        }
        if feature_names.len() != x.ncols() {
            return Err(PipelineError::shape(feature_names.len(), x.ncols()));
        }
        Ok(Dataset {
            id_column: id_column.into(),
            ids,
            feature_names,
            x,
            y,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// (actives, inactives)
    pub fn class_counts(&self) -> (usize, usize) {
        let actives = self.y.iter().filter(|&&v| v).count();
        (actives, self.y.len() - actives)
    }

    pub fn log_input_data_summary(&self) {
        let (actives, inactives) = self.class_counts();
        log::info!(
            "Dataset: {} compounds ({} active, {} inactive), {} features",
            self.n_samples(),
            actives,
            inactives,
            self.n_features()
        );
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            id_column: self.id_column.clone(),
            ids: indices.iter().map(|&i| self.ids[i].clone()).collect(),
            feature_names: self.feature_names.clone(),
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
        }
    }

    /// Stratified hold-out split, reproducible for a given seed.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
        let (train_idx, test_idx) = stratified_train_test_split(&self.y, test_fraction, seed)?;
        log::debug!(
            "Split {} compounds into {} training and {} held-out",
            self.n_samples(),
            train_idx.len(),
            test_idx.len()
        );
        Ok(TrainTestSplit {
            train: self.select(&train_idx),
            test: self.select(&test_idx),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
}

/// Unlabeled compounds described by a fixed-width fingerprint.
#[derive(Debug, Clone)]
pub struct PredictionSet {
    pub id_column: String,
    pub ids: Vec<String>,
    pub x: Array2<f64>,
}

impl PredictionSet {
    pub fn new(id_column: impl Into<String>, ids: Vec<String>, x: Array2<f64>) -> Result<Self> {
        if ids.len() != x.nrows() {
            return Err(PipelineError::Data(format!(
                "prediction set has {} rows but {} identifiers",
                x.nrows(),
                ids.len()
            )));
        }
        Ok(PredictionSet {
            id_column: id_column.into(),
            ids,
            x,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy() -> Dataset {
        Dataset::new(
            "ID",
            (0..6).map(|i| format!("cmpd_{}", i)).collect(),
            vec!["a".to_string(), "b".to_string()],
            array![[0., 1.], [1., 1.], [2., 1.], [3., 0.], [4., 0.], [5., 0.]],
            array![true, true, true, false, false, false],
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_label_count_mismatch() {
        let result = Dataset::new(
            "ID",
            vec!["a".to_string(), "b".to_string()],
            vec!["f".to_string()],
            array![[0.], [1.]],
            array![true],
        );
        assert!(matches!(result, Err(PipelineError::Data(_))));
    }

    #[test]
    fn select_keeps_rows_aligned() {
        let data = toy();
        let sub = data.select(&[4, 0]);
        assert_eq!(sub.ids, vec!["cmpd_4", "cmpd_0"]);
        assert_eq!(sub.x[[0, 0]], 4.0);
        assert_eq!(sub.y.to_vec(), vec![false, true]);
    }

    #[test]
    fn split_partitions_all_rows() {
        let data = toy();
        let split = data.train_test_split(0.34, 7).unwrap();
        assert_eq!(split.train.n_samples() + split.test.n_samples(), 6);
        let mut ids: Vec<String> = split.train.ids.iter().chain(&split.test.ids).cloned().collect();
        ids.sort();
        assert_eq!(ids, data.ids);
        assert_eq!(split.test.class_counts(), (1, 1));
    }
}

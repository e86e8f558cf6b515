use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::{Array1, Array2};

use crate::config::ModelFamily;
use crate::error::Result;
use crate::models::classifier_trait::{
    check_training_input, check_width, sigmoid, ClassifierModel, FitOutcome, FittedClassifier,
};

/// Gradient Boosting Decision Tree (GBDT) classifier
#[derive(Debug, Clone)]
pub struct GBDTClassifier {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: u32,
}

impl GBDTClassifier {
    /// Binomial deviance; expects labels in {-1, 1}.
    const LOSS: &'static str = "LogLikelyhood";

    pub fn new(n_estimators: usize, learning_rate: f64, max_depth: u32) -> Self {
        GBDTClassifier {
            n_estimators,
            learning_rate,
            max_depth,
        }
    }
}

fn to_data_vec(x: &Array2<f64>, labels: Option<&Array1<bool>>) -> DataVec {
    let mut data = DataVec::with_capacity(x.nrows());
    for (i, row) in x.outer_iter().enumerate() {
        let features = row.iter().map(|&v| v as f32).collect();
        let label = match labels {
            Some(y) if y[i] => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        };
        data.push(Data::new_training_data(features, 1.0, label, None));
    }
    data
}

impl ClassifierModel for GBDTClassifier {
    fn family(&self) -> ModelFamily {
        ModelFamily::GradientBoosting
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<bool>) -> Result<FitOutcome> {
        check_training_input(x, y)?;

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(self.learning_rate as f32);
        config.set_max_depth(self.max_depth);
        config.set_iterations(self.n_estimators);
        config.set_debug(false);
        config.set_training_optimization_level(2);
        config.set_loss(Self::LOSS);

        let mut gbdt = GBDT::new(&config);
        let mut train_x = to_data_vec(x, Some(y));
        gbdt.fit(&mut train_x);

        Ok(FitOutcome::new(Box::new(FittedGBDT {
            model: gbdt,
            n_features: x.ncols(),
        })))
    }
}

pub struct FittedGBDT {
    model: GBDT,
    n_features: usize,
}

impl FittedClassifier for FittedGBDT {
    fn family(&self) -> ModelFamily {
        ModelFamily::GradientBoosting
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    /// The raw additive score `F` models half the log-odds under binomial
    /// deviance with ±1 labels, so the probability is `sigmoid(2F)`.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_width(self.n_features, x)?;
        let test_x = to_data_vec(x, None);
        let margins = self.model.decision_function(&test_x);
        Ok(margins
            .iter()
            .map(|&f| sigmoid(2.0 * f as f64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_gbdt_classifier() {
        let x = array![
            [0.1, 1.0, 5.0],
            [0.4, -1.0, 5.0],
            [0.6, 1.0, 5.0],
            [0.9, -1.0, 5.0],
            [1.2, 1.0, 5.0],
            [1.5, -1.0, 5.0],
            [1.8, 1.0, 5.0],
            [2.1, -1.0, 5.0],
        ];
        // Labels follow the sign of the second feature
        let y = x.column(1).mapv(|v| v > 0.0);

        let outcome = GBDTClassifier::new(20, 0.1, 3).fit(&x, &y).unwrap();
        let proba = outcome.model.predict_proba(&x).unwrap();

        assert_eq!(proba.len(), x.nrows());
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert_eq!(outcome.model.predict(&x).unwrap(), y);
    }
}

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::error::{CbdtError, Result};
use crate::math::FeatureMatrix;
use crate::models::utils::{check_fit_input, check_predict_input, BinaryLabels};
use crate::models::{Estimator, Task};

/// Boosting parameters shared by the classifier and the regressor.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct GbdtParams {
    pub learning_rate: f32,
    pub max_depth: u32,
    pub num_boost_round: u32,
    pub training_optimization_level: u8,
    pub debug: bool,
}

/// Gradient Boosting Decision Tree (GBDT) backend
///
/// Classification trains with `LogLikelyhood` on `±1` labels and thresholds
/// the predicted probability at 0.5; regression uses `SquaredError`.
/// Inputs are converted to dense `f32` rows.
#[derive(Serialize, Deserialize)]
pub struct GBDTModel {
    task: Task,
    params: GbdtParams,
    labels: Option<BinaryLabels>,
    n_features: usize,
    model: Option<GBDT>,
}

impl GBDTModel {
    pub fn classifier(params: GbdtParams) -> Self {
        GBDTModel {
            task: Task::Classification,
            params,
            labels: None,
            n_features: 0,
            model: None,
        }
    }

    pub fn regressor(params: GbdtParams) -> Self {
        GBDTModel {
            task: Task::Regression,
            ..Self::classifier(params)
        }
    }

    fn loss(&self) -> &'static str {
        match self.task {
            Task::Classification => "LogLikelyhood",
            Task::Regression => "SquaredError",
        }
    }
}

fn to_data(x: &FeatureMatrix, labels: Option<&[f64]>) -> DataVec {
    let dense = x.to_dense();
    let mut data = DataVec::new();
    for (i, row) in dense.rows().into_iter().enumerate() {
        let features: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let label = labels.map_or(0.0, |y| y[i] as f32);
        data.push(Data::new_training_data(features, 1.0, label, None));
    }
    data
}

impl Estimator for GBDTModel {
    fn name(&self) -> &str {
        match self.task {
            Task::Classification => "GBDTClassifier",
            Task::Regression => "GBDTRegressor",
        }
    }

    fn task(&self) -> Task {
        self.task
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        check_fit_input(x, y)?;
        let (labels, targets) = match self.task {
            Task::Classification => {
                let labels = BinaryLabels::from_labels(y, self.name())?;
                let targets = labels.encode_all(y);
                (Some(labels), targets)
            }
            Task::Regression => (None, y.to_vec()),
        };

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(self.params.learning_rate);
        config.set_max_depth(self.params.max_depth);
        config.set_iterations(self.params.num_boost_round as usize);
        config.set_debug(self.params.debug);
        config.set_training_optimization_level(self.params.training_optimization_level);
        config.set_loss(self.loss());

        let mut gbdt = GBDT::new(&config);
        let mut train_x = to_data(x, Some(&targets));
        gbdt.fit(&mut train_x);
        log::debug!(
            "{}: {} boosting rounds on {}x{}",
            self.name(),
            self.params.num_boost_round,
            x.nrows(),
            x.ncols()
        );

        self.labels = labels;
        self.n_features = x.ncols();
        self.model = Some(gbdt);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or(CbdtError::NotTrained)?;
        check_predict_input(x, self.n_features)?;
        let predictions = model.predict(&to_data(x, None));
        Ok(match &self.labels {
            // LogLikelyhood predictions are probabilities of the positive class
            Some(labels) => predictions
                .iter()
                .map(|&p| labels.decode(p as f64 - 0.5))
                .collect(),
            None => predictions.iter().map(|&p| p as f64).collect(),
        })
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn state(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CbdtError::persistence(self.name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GbdtParams {
        GbdtParams {
            learning_rate: 0.1,
            max_depth: 3,
            num_boost_round: 20,
            training_optimization_level: 2,
            debug: false,
        }
    }

    #[test]
    fn test_gbdt_classifier() {
        // label follows the sign of the second feature
        let rows: Vec<Vec<f64>> = (0..10)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                vec![0.1 * i as f64, sign, 5.0]
            })
            .collect();
        let y: Vec<f64> = (0..10).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
        let x = FeatureMatrix::from_rows(rows, 3).unwrap();

        let mut classifier = GBDTModel::classifier(params());
        classifier.fit(&x, &y).unwrap();
        assert_eq!(classifier.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_gbdt_regressor_tracks_target() {
        let x = FeatureMatrix::column((0..20).map(|i| i as f64).collect());
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 3.0 }).collect();
        let mut regressor = GBDTModel::regressor(GbdtParams {
            num_boost_round: 50,
            ..params()
        });
        regressor.fit(&x, &y).unwrap();
        let predictions = regressor.predict(&x).unwrap();
        assert!(predictions[0] < predictions[19]);
        assert!(regressor.predict(&FeatureMatrix::empty(1)).is_err());
    }
}

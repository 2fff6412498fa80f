use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_elasticnet::ElasticNet;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{CbdtError, Result};
use crate::math::FeatureMatrix;
use crate::models::utils::{check_fit_input, check_predict_input, BinaryLabels};
use crate::models::{Estimator, Task};

/// Binary logistic regression backed by `linfa-logistic`.
///
/// `c` is the inverse L2 strength, so the fitted objective is the summed
/// log-loss plus `|w|^2 / (2c)`.
#[derive(Serialize, Deserialize)]
pub struct LogisticModel {
    c: f64,
    max_iter: usize,
    tol: f64,
    labels: Option<BinaryLabels>,
    n_features: usize,
    model: Option<FittedLogisticRegression<f64, bool>>,
}

impl LogisticModel {
    pub fn new(c: f64, max_iter: usize, tol: f64) -> Self {
        LogisticModel {
            c,
            max_iter,
            tol,
            labels: None,
            n_features: 0,
            model: None,
        }
    }
}

impl Estimator for LogisticModel {
    fn name(&self) -> &str {
        "LogisticRegression"
    }

    fn task(&self) -> Task {
        Task::Classification
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        check_fit_input(x, y)?;
        if self.c <= 0.0 {
            return Err(CbdtError::InvalidInput(format!(
                "LogisticRegression needs a positive C, got {}",
                self.c
            )));
        }
        let labels = BinaryLabels::from_labels(y, self.name())?;
        let targets: Array1<bool> = y.iter().map(|&label| labels.is_positive(label)).collect();
        let dataset = Dataset::new(x.to_dense(), targets);

        let model = LogisticRegression::<f64>::default()
            .alpha(1.0 / self.c)
            .max_iterations(self.max_iter as u64)
            .gradient_tolerance(self.tol)
            .fit(&dataset)
            .map_err(|e| CbdtError::backend(self.name(), e))?;

        self.labels = Some(labels);
        self.n_features = x.ncols();
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let (model, labels) = self
            .model
            .as_ref()
            .zip(self.labels.as_ref())
            .ok_or(CbdtError::NotTrained)?;
        check_predict_input(x, self.n_features)?;
        let predicted: Array1<bool> = model.predict(&x.to_dense());
        Ok(predicted.iter().map(|&p| labels.from_positive(p)).collect())
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn state(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CbdtError::persistence(self.name(), e))
    }
}

/// Regularisation of the least-squares backends, in the scale each is
/// usually configured with.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub enum Penalty {
    /// `alpha |w|^2` added to the summed squared residuals.
    Ridge(f64),
    /// `alpha |w|_1` added to half the mean squared residual.
    Lasso(f64),
    /// `alpha * (l1_ratio |w|_1 + (1 - l1_ratio) |w|^2 / 2)` added to half
    /// the mean squared residual.
    ElasticNet { alpha: f64, l1_ratio: f64 },
}

impl Penalty {
    /// `(penalty, l1_ratio)` in the parametrisation of `linfa-elasticnet`.
    fn elastic_net(&self, n_samples: usize) -> (f64, f64) {
        match *self {
            Penalty::Ridge(alpha) => (alpha / n_samples as f64, 0.0),
            Penalty::Lasso(alpha) => (alpha, 1.0),
            Penalty::ElasticNet { alpha, l1_ratio } => (alpha, l1_ratio),
        }
    }
}

/// Penalised least squares backed by `linfa-elasticnet`.
///
/// Serves Ridge, Lasso and ElasticNet regression, and RidgeClassifier,
/// which regresses on `-1 / +1` targets and predicts the sign.
#[derive(Serialize, Deserialize)]
pub struct PenalisedLinearModel {
    task: Task,
    penalty: Penalty,
    max_iter: usize,
    tol: f64,
    labels: Option<BinaryLabels>,
    n_features: usize,
    model: Option<ElasticNet<f64>>,
}

impl PenalisedLinearModel {
    fn new(task: Task, penalty: Penalty, max_iter: usize, tol: f64) -> Self {
        PenalisedLinearModel {
            task,
            penalty,
            max_iter,
            tol,
            labels: None,
            n_features: 0,
            model: None,
        }
    }

    pub fn ridge(alpha: f64, max_iter: usize, tol: f64) -> Self {
        Self::new(Task::Regression, Penalty::Ridge(alpha), max_iter, tol)
    }

    pub fn lasso(alpha: f64, max_iter: usize, tol: f64) -> Self {
        Self::new(Task::Regression, Penalty::Lasso(alpha), max_iter, tol)
    }

    pub fn elastic_net(alpha: f64, l1_ratio: f64, max_iter: usize, tol: f64) -> Self {
        Self::new(Task::Regression, Penalty::ElasticNet { alpha, l1_ratio }, max_iter, tol)
    }

    pub fn ridge_classifier(alpha: f64, max_iter: usize, tol: f64) -> Self {
        Self::new(Task::Classification, Penalty::Ridge(alpha), max_iter, tol)
    }

    /// Fitted weights and intercept.
    pub fn coefficients(&self) -> Option<(Vec<f64>, f64)> {
        self.model
            .as_ref()
            .map(|m| (m.hyperplane().to_vec(), m.intercept()))
    }

    /// Continuous scores; for RidgeClassifier these are the signed margins.
    pub fn decision_function(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or(CbdtError::NotTrained)?;
        check_predict_input(x, self.n_features)?;
        let scores: Array1<f64> = model.predict(&x.to_dense());
        Ok(scores.to_vec())
    }
}

impl Estimator for PenalisedLinearModel {
    fn name(&self) -> &str {
        match (self.task, self.penalty) {
            (Task::Classification, _) => "RidgeClassifier",
            (Task::Regression, Penalty::Ridge(_)) => "Ridge",
            (Task::Regression, Penalty::Lasso(_)) => "Lasso",
            (Task::Regression, Penalty::ElasticNet { .. }) => "ElasticNet",
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
        let (penalty, l1_ratio) = self.penalty.elastic_net(y.len());
        let dataset = Dataset::new(x.to_dense(), Array1::from(targets));

        let model = ElasticNet::<f64>::params()
            .penalty(penalty)
            .l1_ratio(l1_ratio)
            .max_iterations(self.max_iter.min(u32::MAX as usize) as u32)
            .tolerance(self.tol)
            .fit(&dataset)
            .map_err(|e| CbdtError::backend(self.name(), e))?;
        log::debug!(
            "{}: penalty {} l1_ratio {} on {}x{}",
            self.name(),
            penalty,
            l1_ratio,
            x.nrows(),
            x.ncols()
        );

        self.labels = labels;
        self.n_features = x.ncols();
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let scores = self.decision_function(x)?;
        Ok(match &self.labels {
            Some(labels) => scores.into_iter().map(|s| labels.decode(s)).collect(),
            None => scores,
        })
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn state(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CbdtError::persistence(self.name(), e))
    }
}

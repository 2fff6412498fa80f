use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{CbdtError, Result};
use crate::math::FeatureMatrix;
use crate::models::utils::{check_fit_input, check_predict_input, BinaryLabels};
use crate::models::{Estimator, Task};

/// Kernel of an SVM backend.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    Linear,
    /// `exp(-|a - b|^2 / width)`. Without a width, `n_features * var(X)`
    /// of the training matrix is used (1 for a constant matrix).
    Gaussian { width: Option<f64> },
}

impl Kernel {
    fn apply<T>(&self, params: SvmParams<f64, T>, records: &Array2<f64>) -> SvmParams<f64, T> {
        match *self {
            Kernel::Linear => params.linear_kernel(),
            Kernel::Gaussian { width: Some(width) } => params.gaussian_kernel(width),
            Kernel::Gaussian { width: None } => params.gaussian_kernel(scaled_width(records)),
        }
    }
}

fn scaled_width(records: &Array2<f64>) -> f64 {
    if records.is_empty() {
        return 1.0;
    }
    let variance = records.var(0.0);
    if variance > 0.0 {
        records.ncols() as f64 * variance
    } else {
        1.0
    }
}

/// Linear support vector classifier backed by `linfa-svm`.
///
/// Both classes share the misclassification weight `c`; `eps` is the
/// solver's stopping tolerance.
#[derive(Serialize, Deserialize)]
pub struct SVMClassifier {
    c: f64,
    eps: f64,
    labels: Option<BinaryLabels>,
    n_features: usize,
    model: Option<Svm<f64, bool>>,
}

impl SVMClassifier {
    pub fn new(c: f64, eps: f64) -> Self {
        SVMClassifier {
            c,
            eps,
            labels: None,
            n_features: 0,
            model: None,
        }
    }
}

impl Estimator for SVMClassifier {
    fn name(&self) -> &str {
        "LinearSVC"
    }

    fn task(&self) -> Task {
        Task::Classification
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = BinaryLabels::from_labels(y, self.name())?;
        let targets: Array1<bool> = y.iter().map(|&label| labels.is_positive(label)).collect();
        let records = x.to_dense();

        let model = Svm::<f64, bool>::params()
            .eps(self.eps)
            .pos_neg_weights(self.c, self.c)
            .linear_kernel()
            .fit(&Dataset::new(records, targets))
            .map_err(|e| CbdtError::backend(self.name(), e))?;
        log::debug!("{}: {} support vectors", self.name(), model.nsupport());

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

/// Epsilon-insensitive support vector regression backed by `linfa-svm`.
///
/// Residuals within `epsilon` of the target are not penalised.
#[derive(Serialize, Deserialize)]
pub struct SVMRegressor {
    c: f64,
    epsilon: f64,
    eps: f64,
    kernel: Kernel,
    n_features: usize,
    model: Option<Svm<f64, f64>>,
}

impl SVMRegressor {
    pub fn new(kernel: Kernel, c: f64, epsilon: f64, eps: f64) -> Self {
        SVMRegressor {
            c,
            epsilon,
            eps,
            kernel,
            n_features: 0,
            model: None,
        }
    }
}

impl Estimator for SVMRegressor {
    fn name(&self) -> &str {
        match self.kernel {
            Kernel::Linear => "SVR_linear",
            Kernel::Gaussian { .. } => "SVR",
        }
    }

    fn task(&self) -> Task {
        Task::Regression
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        check_fit_input(x, y)?;
        let records = x.to_dense();
        let params = self.kernel.apply(
            Svm::<f64, f64>::params()
                .eps(self.eps)
                .c_svr(self.c, Some(self.epsilon)),
            &records,
        );
        let model = params
            .fit(&Dataset::new(records, Array1::from(y.to_vec())))
            .map_err(|e| CbdtError::backend(self.name(), e))?;
        log::debug!("{}: {} support vectors", self.name(), model.nsupport());

        self.n_features = x.ncols();
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or(CbdtError::NotTrained)?;
        check_predict_input(x, self.n_features)?;
        let predicted: Array1<f64> = model.predict(&x.to_dense());
        Ok(predicted.to_vec())
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn state(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CbdtError::persistence(self.name(), e))
    }
}

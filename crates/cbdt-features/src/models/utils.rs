use serde::{Deserialize, Serialize};

use crate::error::{CbdtError, Result};
use crate::math::FeatureMatrix;

/// Mapping between two class values and the `-1 / +1` (or `false / true`)
/// encoding the binary backends train on.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BinaryLabels {
    pub negative: f64,
    pub positive: f64,
}

impl BinaryLabels {
    /// The smaller label becomes the negative class. Exactly two distinct
    /// values are required.
    pub fn from_labels(y: &[f64], backend: &str) -> Result<Self> {
        let classes = unique_sorted(y);
        match classes.as_slice() {
            [negative, positive] => Ok(BinaryLabels {
                negative: *negative,
                positive: *positive,
            }),
            _ => Err(CbdtError::InvalidInput(format!(
                "{} needs exactly two classes, found {}",
                backend,
                classes.len()
            ))),
        }
    }

    pub fn is_positive(&self, label: f64) -> bool {
        label == self.positive
    }

    pub fn from_positive(&self, positive: bool) -> f64 {
        if positive {
            self.positive
        } else {
            self.negative
        }
    }

    pub fn encode(&self, label: f64) -> f64 {
        if self.is_positive(label) {
            1.0
        } else {
            -1.0
        }
    }

    pub fn encode_all(&self, y: &[f64]) -> Vec<f64> {
        y.iter().map(|&label| self.encode(label)).collect()
    }

    /// Class value for a decision score; ties go to the negative class.
    pub fn decode(&self, score: f64) -> f64 {
        if score > 0.0 {
            self.positive
        } else {
            self.negative
        }
    }
}

/// Distinct values of `y` in ascending order.
pub fn unique_sorted(y: &[f64]) -> Vec<f64> {
    let mut classes = y.to_vec();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    classes
}

/// Shared sanity checks before fitting a backend.
pub fn check_fit_input(x: &FeatureMatrix, y: &[f64]) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(CbdtError::InvalidInput(format!(
            "{} rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if y.is_empty() {
        return Err(CbdtError::InvalidInput("cannot fit on zero rows".to_string()));
    }
    if let Some(bad) = y.iter().find(|v| !v.is_finite()) {
        return Err(CbdtError::InvalidInput(format!("non-finite label {}", bad)));
    }
    Ok(())
}

/// Prediction input must have the column count the backend was fitted on.
pub fn check_predict_input(x: &FeatureMatrix, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(CbdtError::FeatureMismatch {
            expected: n_features,
            found: x.ncols(),
        });
    }
    Ok(())
}

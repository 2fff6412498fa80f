//! Trainable backends and the registry the harness selects them from.
pub mod estimator;
pub mod factory;
pub mod gbdt;
pub mod linear;
pub mod naive_bayes;
pub mod registry;
pub mod svm;
pub mod utils;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use estimator::Estimator;
pub use registry::ModelRegistry;

/// What a backend predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Classification,
    Regression,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Classification => write!(f, "classification"),
            Task::Regression => write!(f, "regression"),
        }
    }
}

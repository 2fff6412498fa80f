//! Evaluation measures for trained models.
//!
//! Classification measures treat the label `1` as the positive class and
//! return 0 when a ratio has a zero denominator. Regression measures follow
//! the usual definitions; `normalized_mean_squared_error` divides by the
//! error of always predicting the mean of the truth.
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::error::{CbdtError, Result};
use crate::models::Task;

const POSITIVE: f64 = 1.0;

fn check_lengths(truth: &[f64], predicted: &[f64]) -> Result<()> {
    if truth.len() != predicted.len() {
        return Err(CbdtError::InvalidInput(format!(
            "{} truth values but {} predictions",
            truth.len(),
            predicted.len()
        )));
    }
    if truth.is_empty() {
        return Err(CbdtError::InvalidInput("cannot evaluate on zero rows".to_string()));
    }
    Ok(())
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `(true positives, false positives, false negatives)`.
fn confusion(truth: &[f64], predicted: &[f64]) -> (f64, f64, f64) {
    truth
        .iter()
        .zip(predicted)
        .fold((0.0, 0.0, 0.0), |(tp, fp, fn_), (&t, &p)| {
            match (t == POSITIVE, p == POSITIVE) {
                (true, true) => (tp + 1.0, fp, fn_),
                (false, true) => (tp, fp + 1.0, fn_),
                (true, false) => (tp, fp, fn_ + 1.0),
                (false, false) => (tp, fp, fn_),
            }
        })
}

pub fn accuracy(truth: &[f64], predicted: &[f64]) -> f64 {
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    ratio(correct as f64, truth.len() as f64)
}

pub fn precision(truth: &[f64], predicted: &[f64]) -> f64 {
    let (tp, fp, _) = confusion(truth, predicted);
    ratio(tp, tp + fp)
}

pub fn recall(truth: &[f64], predicted: &[f64]) -> f64 {
    let (tp, _, fn_) = confusion(truth, predicted);
    ratio(tp, tp + fn_)
}

pub fn f1_score(truth: &[f64], predicted: &[f64]) -> f64 {
    let (tp, fp, fn_) = confusion(truth, predicted);
    ratio(2.0 * tp, 2.0 * tp + fp + fn_)
}

pub fn mean_squared_error(truth: &[f64], predicted: &[f64]) -> f64 {
    truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .mean()
}

pub fn mean_absolute_error(truth: &[f64], predicted: &[f64]) -> f64 {
    truth.iter().zip(predicted).map(|(t, p)| (t - p).abs()).mean()
}

pub fn median_absolute_error(truth: &[f64], predicted: &[f64]) -> f64 {
    let errors: Vec<f64> = truth.iter().zip(predicted).map(|(t, p)| (t - p).abs()).collect();
    Data::new(errors).median()
}

/// `1 - residual sum of squares / total sum of squares`.
///
/// A constant truth scores 1 when predicted exactly and 0 otherwise.
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> f64 {
    let mean = truth.iter().mean();
    let residual: f64 = truth.iter().zip(predicted).map(|(t, p)| (t - p).powi(2)).sum();
    let total: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
    constant_aware(residual, total)
}

/// `1 - Var(truth - predicted) / Var(truth)`.
pub fn explained_variance(truth: &[f64], predicted: &[f64]) -> f64 {
    let residuals: Vec<f64> = truth.iter().zip(predicted).map(|(t, p)| t - p).collect();
    constant_aware(residuals.iter().population_variance(), truth.iter().population_variance())
}

fn constant_aware(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        if numerator == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - numerator / denominator
    }
}

/// MSE of the predictions over the MSE of predicting `mean(truth)` for every
/// row. NaN when the truth is constant.
pub fn normalized_mean_squared_error(truth: &[f64], predicted: &[f64]) -> f64 {
    let mean = truth.iter().mean();
    let baseline = vec![mean; truth.len()];
    let denominator = mean_squared_error(truth, &baseline);
    if denominator == 0.0 {
        f64::NAN
    } else {
        mean_squared_error(truth, predicted) / denominator
    }
}

/// Named measures computed on a held-out test set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub task: Task,
    pub n_train: usize,
    pub n_test: usize,
    /// Measures in reporting order.
    pub measures: Vec<(String, f64)>,
}

impl Evaluation {
    /// Compute the measure set of `task` for predictions against the truth.
    pub fn compute(task: Task, truth: &[f64], predicted: &[f64], n_train: usize) -> Result<Self> {
        check_lengths(truth, predicted)?;
        let measures: Vec<(&str, fn(&[f64], &[f64]) -> f64)> = match task {
            Task::Classification => vec![
                ("Accuracy", accuracy),
                ("Precision", precision),
                ("Recall", recall),
                ("F1 score", f1_score),
            ],
            Task::Regression => vec![
                ("Explained variance", explained_variance),
                ("Mean absolute error", mean_absolute_error),
                ("Mean squared error", mean_squared_error),
                ("Median absolute error", median_absolute_error),
                ("R2 score", r2_score),
                ("Normalized mean squared error", normalized_mean_squared_error),
            ],
        };
        Ok(Evaluation {
            task,
            n_train,
            n_test: truth.len(),
            measures: measures
                .into_iter()
                .map(|(name, measure)| (name.to_string(), measure(truth, predicted)))
                .collect(),
        })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.measures
            .iter()
            .find(|(measure, _)| measure == name)
            .map(|(_, value)| *value)
    }
}

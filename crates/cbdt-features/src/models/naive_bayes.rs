use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_bayes::MultinomialNb;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{CbdtError, Result};
use crate::math::FeatureMatrix;
use crate::models::utils::{check_fit_input, check_predict_input, unique_sorted};
use crate::models::{Estimator, Task};

/// Multinomial naive Bayes over non-negative features (counts, tf-idf),
/// backed by `linfa-bayes`.
///
/// Additive smoothing with `alpha`. Any number of classes; the class
/// values seen in training are predicted back as they were given.
#[derive(Serialize, Deserialize)]
pub struct MultinomialNB {
    alpha: f64,
    classes: Vec<f64>,
    n_features: usize,
    model: Option<MultinomialNb<f64, usize>>,
}

impl MultinomialNB {
    pub fn new(alpha: f64) -> Self {
        MultinomialNB {
            alpha,
            classes: Vec::new(),
            n_features: 0,
            model: None,
        }
    }

    pub fn classes(&self) -> Option<&[f64]> {
        self.model.as_ref().map(|_| self.classes.as_slice())
    }
}

fn check_non_negative(x: &FeatureMatrix) -> Result<()> {
    match x.min_value() {
        Some(min) if min < 0.0 => Err(CbdtError::InvalidInput(format!(
            "MultinomialNB needs non-negative features, found {}",
            min
        ))),
        _ => Ok(()),
    }
}

impl Estimator for MultinomialNB {
    fn name(&self) -> &str {
        "MultinomialNB"
    }

    fn task(&self) -> Task {
        Task::Classification
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        check_fit_input(x, y)?;
        check_non_negative(x)?;
        let classes = unique_sorted(y);
        // labels are indices into `classes`
        let targets: Array1<usize> = y
            .iter()
            .map(|label| classes.partition_point(|c| c < label))
            .collect();

        let model = MultinomialNb::<f64, usize>::params()
            .alpha(self.alpha)
            .fit(&Dataset::new(x.to_dense(), targets))
            .map_err(|e| CbdtError::backend(self.name(), e))?;
        log::debug!("{}: {} classes over {} features", self.name(), classes.len(), x.ncols());

        self.classes = classes;
        self.n_features = x.ncols();
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or(CbdtError::NotTrained)?;
        check_predict_input(x, self.n_features)?;
        check_non_negative(x)?;
        let predicted: Array1<usize> = model.predict(&x.to_dense());
        predicted
            .iter()
            .map(|&k| {
                self.classes
                    .get(k)
                    .copied()
                    .ok_or_else(|| CbdtError::backend(self.name(), format!("unknown class index {}", k)))
            })
            .collect()
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

    fn counts() -> (FeatureMatrix, Vec<f64>) {
        let x = FeatureMatrix::from_sparse_rows(
            vec![
                vec![(0, 3.0)],
                vec![(0, 2.0), (1, 1.0)],
                vec![(2, 4.0)],
                vec![(1, 1.0), (2, 2.0)],
            ],
            3,
        )
        .unwrap();
        (x, vec![1.0, 1.0, 0.0, 0.0])
    }

    #[test]
    fn test_predicts_dominant_class() {
        let (x, y) = counts();
        let mut nb = MultinomialNB::new(1.0);
        nb.fit(&x, &y).unwrap();
        assert_eq!(nb.predict(&x).unwrap(), y);
        assert_eq!(nb.classes(), Some(&[0.0, 1.0][..]));
        let unseen = FeatureMatrix::from_rows(vec![vec![5.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]], 3).unwrap();
        assert_eq!(nb.predict(&unseen).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_three_classes() {
        let x = FeatureMatrix::from_rows(
            vec![vec![4.0, 0.0, 0.0], vec![0.0, 4.0, 0.0], vec![0.0, 0.0, 4.0]],
            3,
        )
        .unwrap();
        let y = vec![2.0, 5.0, 9.0];
        let mut nb = MultinomialNB::new(0.5);
        nb.fit(&x, &y).unwrap();
        assert_eq!(nb.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_negative_features_rejected() {
        let x = FeatureMatrix::column(vec![-1.0, 1.0]);
        let mut nb = MultinomialNB::new(1.0);
        assert!(matches!(nb.fit(&x, &[0.0, 1.0]), Err(CbdtError::InvalidInput(_))));
        assert!(!nb.is_trained());
    }
}

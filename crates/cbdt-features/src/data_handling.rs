//! Deterministic train/test partitioning of a feature matrix and its labels.
//!
//! Both the `FeatureBuilder` and the `ModelHarness` split through this
//! module so that the same seed always yields the same partition, in this
//! process and in any other.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{CbdtError, Result};
use crate::math::FeatureMatrix;

/// Seed used for every split unless configured otherwise.
pub const DEFAULT_SEED: u64 = 42;

/// Fraction of instances held out for testing unless configured otherwise.
pub const DEFAULT_TEST_SIZE: f64 = 0.25;

/// A feature matrix and label vector partitioned into train and test rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Outcome of the split attempted at the end of every build.
///
/// A missing split is not an error for the builder: the combined matrix
/// stays valid for inference. The reason is kept for inspection.
#[derive(Debug)]
pub enum SplitOutcome {
    Available(TrainTestSplit),
    Unavailable(CbdtError),
}

impl SplitOutcome {
    pub fn split(&self) -> Option<&TrainTestSplit> {
        match self {
            SplitOutcome::Available(split) => Some(split),
            SplitOutcome::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&CbdtError> {
        match self {
            SplitOutcome::Available(_) => None,
            SplitOutcome::Unavailable(reason) => Some(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SplitOutcome::Available(_))
    }
}

/// Shuffle `0..n_samples` with a seeded RNG and cut off the test rows.
///
/// The test set holds `ceil(test_size * n_samples)` rows, the train set the
/// rest. Both index lists keep the shuffled order.
pub fn split_indices(n_samples: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(CbdtError::SplitUnavailable(format!(
            "test_size must lie in (0, 1), got {}",
            test_size
        )));
    }
    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(CbdtError::SplitUnavailable(format!(
            "{} samples cannot be split with test_size {}",
            n_samples, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Partition `x` and `y` row-wise.
pub fn train_test_split(x: &FeatureMatrix, y: &[f64], test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if x.nrows() != y.len() {
        return Err(CbdtError::SplitUnavailable(format!(
            "matrix has {} rows but {} labels were given",
            x.nrows(),
            y.len()
        )));
    }
    let (train_indices, test_indices) = split_indices(y.len(), test_size, seed)?;
    log::debug!(
        "Split {} samples into {} train / {} test (seed {})",
        y.len(),
        train_indices.len(),
        test_indices.len(),
        seed
    );

    Ok(TrainTestSplit {
        x_train: x.select_rows(&train_indices),
        x_test: x.select_rows(&test_indices),
        y_train: train_indices.iter().map(|&i| y[i]).collect(),
        y_test: test_indices.iter().map(|&i| y[i]).collect(),
        train_indices,
        test_indices,
    })
}

use crate::error::Result;
use crate::math::FeatureMatrix;
use crate::models::Task;

/// The contract every model backend implements.
///
/// Classifiers take class labels as `f64` values and predict those same
/// values; regressors take and predict continuous scores.
pub trait Estimator: Send {
    /// Registry name of the backend.
    fn name(&self) -> &str;

    fn task(&self) -> Task;

    /// Fit on a matrix and one label per row. Replaces any previous fit.
    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()>;

    /// Predict one value per row. Fails with `NotTrained` before `fit`.
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>>;

    fn is_trained(&self) -> bool;

    /// Serialized trained parameters, restorable through the registry entry
    /// of the same name.
    fn state(&self) -> Result<Vec<u8>>;
}

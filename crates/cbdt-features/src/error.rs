use thiserror::Error;

use crate::models::Task;

/// Errors raised by the feature pipeline and the model harness.
#[derive(Debug, Error)]
pub enum CbdtError {
    /// `transform` was requested on an extractor that was never fitted.
    #[error("feature '{feature}' has not been fitted")]
    NotFitted { feature: String },

    /// `predict`/`save` was requested before any model was trained or loaded.
    #[error("no model has been trained or loaded")]
    NotTrained,

    #[error("binding {binding} references field '{field}' which is absent from the dataset")]
    MissingField { field: String, binding: usize },

    /// Train/test partitioning could not proceed. Recorded by the builder, never raised by it.
    #[error("train/test split unavailable: {0}")]
    SplitUnavailable(String),

    #[error("artifact '{artifact}': {message}")]
    Persistence { artifact: String, message: String },

    #[error("unknown model backend '{0}'")]
    UnknownBackend(String),

    #[error("backend '{backend}' is a {actual} model and cannot be used for {requested}")]
    TaskMismatch {
        backend: String,
        actual: Task,
        requested: Task,
    },

    #[error("feature '{feature}' emitted a {found_rows}x{found_cols} block, expected {expected_rows}x{expected_cols}")]
    ColumnMismatch {
        feature: String,
        expected_rows: usize,
        expected_cols: usize,
        found_rows: usize,
        found_cols: usize,
    },

    #[error("matrix has {found} columns but the model was trained on {expected}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("incompatible artifacts: {0}")]
    IncompatibleArtifacts(String),

    /// A model backend rejected its parameters or training data.
    #[error("backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CbdtError {
    pub(crate) fn persistence(artifact: &str, message: impl ToString) -> Self {
        CbdtError::Persistence {
            artifact: artifact.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn backend(backend: &str, message: impl ToString) -> Self {
        CbdtError::Backend {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CbdtError>;

//! Train, evaluate, predict and persist one model at a time.
use serde::{Deserialize, Serialize};

use crate::builder::FeatureBuilder;
use crate::config::HarnessConfig;
use crate::data_handling::train_test_split;
use crate::error::{CbdtError, Result};
use crate::math::FeatureMatrix;
use crate::models::{Estimator, ModelRegistry, Task};
use crate::persist::ArtifactStore;
use crate::stats::Evaluation;

const ARTIFACT_VERSION: u32 = 1;

/// The backend to train: a registry name or a caller-supplied estimator.
pub enum Backend {
    Named(String),
    Custom(Box<dyn Estimator>),
}

impl From<&str> for Backend {
    fn from(name: &str) -> Self {
        Backend::Named(name.to_string())
    }
}

impl From<String> for Backend {
    fn from(name: String) -> Self {
        Backend::Named(name)
    }
}

impl From<Box<dyn Estimator>> for Backend {
    fn from(estimator: Box<dyn Estimator>) -> Self {
        Backend::Custom(estimator)
    }
}

struct TrainedModel {
    backend: String,
    estimator: Box<dyn Estimator>,
    n_features: usize,
}

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    version: u32,
    backend: String,
    task: Task,
    n_features: usize,
    fingerprint: Option<String>,
    state: Vec<u8>,
}

/// Wraps an injectable [`ModelRegistry`] and holds the current model.
///
/// Training replaces the current model only once the new fit succeeded.
/// A model can be bound to the `FeatureBuilder` that produced its training
/// matrix; the binding travels with the saved artifact so stale pairings
/// are detected by [`ModelHarness::check_compatible`].
pub struct ModelHarness {
    registry: ModelRegistry,
    config: HarnessConfig,
    model: Option<TrainedModel>,
    evaluation: Option<Evaluation>,
    fingerprint: Option<String>,
}

impl Default for ModelHarness {
    fn default() -> Self {
        Self::new(ModelRegistry::default())
    }
}

impl ModelHarness {
    pub fn new(registry: ModelRegistry) -> Self {
        Self::with_config(registry, HarnessConfig::default())
    }

    pub fn with_config(registry: ModelRegistry, config: HarnessConfig) -> Self {
        ModelHarness {
            registry,
            config,
            model: None,
            evaluation: None,
            fingerprint: None,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> HarnessConfig {
        self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Name of the current backend.
    pub fn backend(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.backend.as_str())
    }

    /// Column count of the matrix the current model was trained on.
    pub fn n_features(&self) -> Option<usize> {
        self.model.as_ref().map(|m| m.n_features)
    }

    /// Measures of the last evaluating `classify`/`regress` call.
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    /// Fingerprint of the builder the current model is bound to.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Train a classifier; see [`ModelHarness::train`].
    pub fn classify(
        &mut self,
        x: &FeatureMatrix,
        y: &[f64],
        backend: impl Into<Backend>,
        evaluate: bool,
    ) -> Result<Option<&Evaluation>> {
        self.train(Task::Classification, x, y, backend.into(), evaluate)
    }

    /// Train a regressor; see [`ModelHarness::train`].
    pub fn regress(
        &mut self,
        x: &FeatureMatrix,
        y: &[f64],
        backend: impl Into<Backend>,
        evaluate: bool,
    ) -> Result<Option<&Evaluation>> {
        self.train(Task::Regression, x, y, backend.into(), evaluate)
    }

    /// Fit `backend` for `task` and make it the current model.
    ///
    /// With `evaluate`, `(x, y)` is split with the configured seed, the
    /// backend is fitted on the train rows and the task's measures are
    /// computed on the test rows. Otherwise the backend is fitted on every
    /// row and no evaluation is kept.
    pub fn train(
        &mut self,
        task: Task,
        x: &FeatureMatrix,
        y: &[f64],
        backend: Backend,
        evaluate: bool,
    ) -> Result<Option<&Evaluation>> {
        let (name, mut estimator) = self.resolve(task, backend)?;
        if x.nrows() != y.len() {
            return Err(CbdtError::InvalidInput(format!(
                "{} rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let evaluation = if evaluate {
            let split = train_test_split(x, y, self.config.test_size, self.config.seed)?;
            log::info!(
                "Training {} ({}) on {} rows, evaluating on {}",
                name,
                task,
                split.y_train.len(),
                split.y_test.len()
            );
            estimator.fit(&split.x_train, &split.y_train)?;
            let predicted = estimator.predict(&split.x_test)?;
            let evaluation = Evaluation::compute(task, &split.y_test, &predicted, split.y_train.len())?;
            for (measure, value) in &evaluation.measures {
                log::info!("{} & {:.3} \\\\", measure, value);
            }
            Some(evaluation)
        } else {
            log::info!("Training {} ({}) on all {} rows", name, task, y.len());
            estimator.fit(x, y)?;
            None
        };

        self.model = Some(TrainedModel {
            backend: name,
            estimator,
            n_features: x.ncols(),
        });
        self.evaluation = evaluation;
        self.fingerprint = None;
        Ok(self.evaluation.as_ref())
    }

    fn resolve(&self, task: Task, backend: Backend) -> Result<(String, Box<dyn Estimator>)> {
        let (name, estimator) = match backend {
            Backend::Named(name) => {
                let estimator = self.registry.construct(&name)?;
                let actual = self.registry.task(&name)?;
                if actual != task {
                    return Err(CbdtError::TaskMismatch {
                        backend: name,
                        actual,
                        requested: task,
                    });
                }
                (name, estimator)
            }
            Backend::Custom(estimator) => (estimator.name().to_string(), estimator),
        };
        if estimator.task() != task {
            return Err(CbdtError::TaskMismatch {
                backend: name,
                actual: estimator.task(),
                requested: task,
            });
        }
        Ok((name, estimator))
    }

    /// Predict one value per row of `x` with the current model.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or(CbdtError::NotTrained)?;
        if x.ncols() != model.n_features {
            return Err(CbdtError::FeatureMismatch {
                expected: model.n_features,
                found: x.ncols(),
            });
        }
        model.estimator.predict(x)
    }

    /// Record `builder` as the producer of the current model's input columns.
    pub fn bind_features(&mut self, builder: &FeatureBuilder) -> Result<()> {
        let model = self.model.as_ref().ok_or(CbdtError::NotTrained)?;
        if builder.n_columns() != model.n_features {
            return Err(CbdtError::IncompatibleArtifacts(format!(
                "builder emits {} columns, model '{}' was trained on {}",
                builder.n_columns(),
                model.backend,
                model.n_features
            )));
        }
        self.fingerprint = Some(builder.fingerprint());
        Ok(())
    }

    /// Check that `builder` produces matrices the current model can consume.
    ///
    /// Compares the column count and, when the model is bound, the builder
    /// fingerprint.
    pub fn check_compatible(&self, builder: &FeatureBuilder) -> Result<()> {
        let model = self.model.as_ref().ok_or(CbdtError::NotTrained)?;
        if builder.n_columns() != model.n_features {
            return Err(CbdtError::IncompatibleArtifacts(format!(
                "builder emits {} columns, model '{}' expects {}",
                builder.n_columns(),
                model.backend,
                model.n_features
            )));
        }
        match &self.fingerprint {
            Some(expected) if *expected != builder.fingerprint() => Err(CbdtError::IncompatibleArtifacts(
                format!("model '{}' was trained with a different feature builder", model.backend),
            )),
            _ => Ok(()),
        }
    }

    /// Persist the current model.
    pub fn save(&self, store: &ArtifactStore, name: &str) -> Result<()> {
        let model = self.model.as_ref().ok_or(CbdtError::NotTrained)?;
        let artifact = ModelArtifact {
            version: ARTIFACT_VERSION,
            backend: model.backend.clone(),
            task: model.estimator.task(),
            n_features: model.n_features,
            fingerprint: self.fingerprint.clone(),
            state: model.estimator.state()?,
        };
        store.save(name, &artifact)?;
        log::info!("Saved {} model '{}'", model.backend, name);
        Ok(())
    }

    /// Replace the current model with one saved by [`ModelHarness::save`].
    ///
    /// The backend is restored through this harness' registry, so it must
    /// hold an entry under the saved backend name.
    pub fn load(&mut self, store: &ArtifactStore, name: &str) -> Result<()> {
        let artifact: ModelArtifact = store.load(name)?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(CbdtError::persistence(
                name,
                format!(
                    "unsupported model artifact version {} (expected {})",
                    artifact.version, ARTIFACT_VERSION
                ),
            ));
        }
        let estimator = self.registry.restore(&artifact.backend, &artifact.state)?;
        if estimator.task() != artifact.task || !estimator.is_trained() {
            return Err(CbdtError::persistence(
                name,
                format!("artifact does not hold a trained {} model", artifact.backend),
            ));
        }
        log::info!("Loaded {} model '{}'", artifact.backend, name);
        self.model = Some(TrainedModel {
            backend: artifact.backend,
            estimator,
            n_features: artifact.n_features,
        });
        self.evaluation = None;
        self.fingerprint = artifact.fingerprint;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (FeatureMatrix, Vec<f64>) {
        let x = FeatureMatrix::column((0..12).map(|i| i as f64).collect());
        let y = (0..12).map(|i| if i < 6 { 0.0 } else { 1.0 }).collect();
        (x, y)
    }

    #[test]
    fn test_task_mismatch() {
        let (x, y) = data();
        let mut harness = ModelHarness::default();
        let err = harness.regress(&x, &y, "LogisticRegression", false).unwrap_err();
        assert!(matches!(
            err,
            CbdtError::TaskMismatch {
                actual: Task::Classification,
                requested: Task::Regression,
                ..
            }
        ));
        assert!(!harness.is_trained());
    }

    #[test]
    fn test_failed_training_keeps_previous_model() {
        let (x, y) = data();
        let mut harness = ModelHarness::default();
        harness.classify(&x, &y, "LogisticRegression", false).unwrap();
        assert!(harness.classify(&x, &y[..3], "LinearSVC", false).is_err());
        assert!(harness.classify(&x, &y, "NoSuchModel", false).is_err());
        assert_eq!(harness.backend(), Some("LogisticRegression"));
    }

    #[test]
    fn test_predict_checks_column_count() {
        let (x, y) = data();
        let mut harness = ModelHarness::default();
        assert!(matches!(harness.predict(&x), Err(CbdtError::NotTrained)));
        harness.classify(&x, &y, "RidgeClassifier", false).unwrap();
        let wide = FeatureMatrix::from_rows(vec![vec![1.0, 2.0]], 2).unwrap();
        assert!(matches!(
            harness.predict(&wide),
            Err(CbdtError::FeatureMismatch { expected: 1, found: 2 })
        ));
    }

    #[test]
    fn test_save_requires_model() {
        let dir = tempfile::tempdir().unwrap();
        let harness = ModelHarness::default();
        assert!(matches!(
            harness.save(&ArtifactStore::new(dir.path()), "model"),
            Err(CbdtError::NotTrained)
        ));
    }
}

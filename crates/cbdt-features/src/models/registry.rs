use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::config::ModelType;
use crate::error::{CbdtError, Result};
use crate::models::factory::build_model;
use crate::models::gbdt::GBDTModel;
use crate::models::linear::{LogisticModel, PenalisedLinearModel};
use crate::models::naive_bayes::MultinomialNB;
use crate::models::svm::{SVMClassifier, SVMRegressor};
use crate::models::{Estimator, Task};

type Constructor = Box<dyn Fn() -> Box<dyn Estimator> + Send + Sync>;
type Restorer = Box<dyn Fn(&[u8]) -> Result<Box<dyn Estimator>> + Send + Sync>;

struct Entry {
    task: Task,
    construct: Constructor,
    restore: Restorer,
}

fn restorer<E>(name: &str) -> Restorer
where
    E: Estimator + DeserializeOwned + 'static,
{
    let name = name.to_string();
    Box::new(move |bytes: &[u8]| {
        let estimator: E = bincode::deserialize(bytes).map_err(|e| CbdtError::persistence(&name, e))?;
        Ok(Box::new(estimator) as Box<dyn Estimator>)
    })
}

/// Named model backends a harness can train.
///
/// Each entry knows the task it serves, how to construct a fresh untrained
/// instance, and how to restore a trained one from its serialized state.
/// `ModelRegistry::default()` holds every built-in backend with default
/// hyper-parameters; an empty registry plus `register` gives full control.
pub struct ModelRegistry {
    entries: BTreeMap<String, Entry>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        let mut registry = ModelRegistry::empty();
        for model_type in ModelType::all_defaults() {
            registry.register_model_type(model_type);
        }
        registry
    }
}

impl ModelRegistry {
    pub fn empty() -> Self {
        ModelRegistry {
            entries: BTreeMap::new(),
        }
    }

    /// Register a backend under `name`, replacing any previous entry.
    pub fn register<E, F>(&mut self, name: &str, task: Task, constructor: F)
    where
        E: Estimator + DeserializeOwned + 'static,
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.entries.insert(
            name.to_string(),
            Entry {
                task,
                construct: Box::new(move || Box::new(constructor()) as Box<dyn Estimator>),
                restore: restorer::<E>(name),
            },
        );
    }

    /// Register a built-in backend with the hyper-parameters in `model_type`,
    /// under its canonical name.
    pub fn register_model_type(&mut self, model_type: ModelType) {
        let name = model_type.name();
        let restore = match model_type {
            ModelType::LogisticRegression { .. } => restorer::<LogisticModel>(name),
            ModelType::RidgeClassifier { .. }
            | ModelType::Ridge { .. }
            | ModelType::Lasso { .. }
            | ModelType::ElasticNet { .. } => restorer::<PenalisedLinearModel>(name),
            ModelType::LinearSVC { .. } => restorer::<SVMClassifier>(name),
            ModelType::SVR { .. } | ModelType::SVRLinear { .. } => restorer::<SVMRegressor>(name),
            ModelType::MultinomialNB { .. } => restorer::<MultinomialNB>(name),
            ModelType::GBDTClassifier { .. } | ModelType::GBDTRegressor { .. } => {
                restorer::<GBDTModel>(name)
            }
        };
        let task = model_type.task();
        self.entries.insert(
            name.to_string(),
            Entry {
                task,
                construct: Box::new(move || build_model(&model_type)),
                restore,
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Names of the backends serving `task`, sorted.
    pub fn names_for(&self, task: Task) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.task == task)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn task(&self, name: &str) -> Result<Task> {
        self.entry(name).map(|entry| entry.task)
    }

    /// Fresh untrained instance of a backend.
    pub fn construct(&self, name: &str) -> Result<Box<dyn Estimator>> {
        self.entry(name).map(|entry| (entry.construct)())
    }

    /// Trained instance of a backend from its serialized state.
    pub fn restore(&self, name: &str, state: &[u8]) -> Result<Box<dyn Estimator>> {
        let entry = self.entry(name)?;
        (entry.restore)(state)
    }

    fn entry(&self, name: &str) -> Result<&Entry> {
        self.entries
            .get(name)
            .ok_or_else(|| CbdtError::UnknownBackend(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FeatureMatrix;

    #[test]
    fn test_default_registry_lists_both_tasks() {
        let registry = ModelRegistry::default();
        assert_eq!(
            registry.names_for(Task::Classification),
            vec!["GBDTClassifier", "LinearSVC", "LogisticRegression", "MultinomialNB", "RidgeClassifier"]
        );
        assert_eq!(
            registry.names_for(Task::Regression),
            vec!["ElasticNet", "GBDTRegressor", "Lasso", "Ridge", "SVR", "SVR_linear"]
        );
    }

    #[test]
    fn test_unknown_backend() {
        let registry = ModelRegistry::empty();
        assert!(matches!(
            registry.construct("Ridge"),
            Err(CbdtError::UnknownBackend(name)) if name == "Ridge"
        ));
    }

    #[test]
    fn test_register_overrides_hyper_parameters() {
        let mut registry = ModelRegistry::default();
        registry.register_model_type(ModelType::Ridge {
            alpha: 0.5,
            max_iter: 10,
            tol: 1e-3,
        });
        assert_eq!(registry.names().len(), 11);
        assert_eq!(registry.task("Ridge").unwrap(), Task::Regression);
    }

    #[test]
    fn test_restore_round_trip() {
        let registry = ModelRegistry::default();
        let x = FeatureMatrix::from_rows(vec![vec![1.0], vec![2.0], vec![3.0]], 1).unwrap();
        let y = [2.0, 4.0, 6.0];
        let mut model = registry.construct("Ridge").unwrap();
        model.fit(&x, &y).unwrap();
        let restored = registry.restore("Ridge", &model.state().unwrap()).unwrap();
        assert!(restored.is_trained());
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = ModelRegistry::empty();
        registry.register("Shrunk", Task::Regression, || PenalisedLinearModel::ridge(10.0, 100, 1e-6));
        assert!(registry.contains("Shrunk"));
        assert!(registry.restore("Shrunk", b"garbage").is_err());
    }
}

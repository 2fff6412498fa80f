use cbdt_features::features::{ContainsWordsFeature, NGramFeature, StatisticKind, TextStatistic};
use cbdt_features::models::{Estimator, ModelRegistry, Task};
use cbdt_features::persist::ArtifactStore;
use cbdt_features::stats::normalized_mean_squared_error;
use cbdt_features::{
    Backend, CbdtError, Dataset, FeatureBuilder, FeatureMatrix, InMemoryDataset, ModelHarness, Result,
};
use serde::{Deserialize, Serialize};

/// Predicts the mean of its training labels.
#[derive(Debug, Default, Serialize, Deserialize)]
struct MeanRegressor {
    mean: Option<f64>,
}

impl Estimator for MeanRegressor {
    fn name(&self) -> &str {
        "MeanRegressor"
    }

    fn task(&self) -> Task {
        Task::Regression
    }

    fn fit(&mut self, _x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        self.mean = Some(y.iter().sum::<f64>() / y.len() as f64);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let mean = self.mean.ok_or(CbdtError::NotTrained)?;
        Ok(vec![mean; x.nrows()])
    }

    fn is_trained(&self) -> bool {
        self.mean.is_some()
    }

    fn state(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self).unwrap())
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn corpus() -> InMemoryDataset {
    let texts = [
        "You won't believe this trick",
        "Senate approves new budget",
        "This one weird trick doctors hate",
        "Markets steady after announcement",
        "You won't believe what she said",
        "Council publishes annual report",
        "This trick will blow your mind",
        "Government confirms tax changes",
        "You won't believe these photos",
        "Ministry releases health figures",
        "This trick changed everything",
        "Court adjourns hearing until May",
    ];
    let clickbait: Vec<f64> = (0..texts.len()).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
    let scores: Vec<f64> = clickbait.iter().map(|c| 0.1 + 0.8 * c).collect();
    InMemoryDataset::with_len(texts.len())
        .with_field("postText", texts)
        .with_y(scores)
        .with_y_class(clickbait)
}

fn builder() -> FeatureBuilder {
    let mut builder = FeatureBuilder::new();
    builder
        .add_feature(NGramFeature::words(1, 1), "postText")
        .add_feature(
            ContainsWordsFeature::new("bait", ["you", "trick", "believe"]),
            "postText",
        )
        .add_feature(TextStatistic::new(StatisticKind::MeanWordLength), "postText");
    builder
}

#[test]
fn test_mean_prediction_normalized_error() {
    let truth = [1.0, 2.0, 3.0, 4.0, 5.0];
    assert_eq!(normalized_mean_squared_error(&truth, &[3.0; 5]), 1.0);
}

#[test]
fn test_classify_without_evaluation() {
    let dataset = corpus();
    let mut builder = builder();
    let x = builder.build(&dataset, true).unwrap().clone();
    let y = dataset.get_y_class().unwrap();

    let mut harness = ModelHarness::default();
    let evaluation = harness.classify(&x, &y, "LogisticRegression", false).unwrap();
    assert!(evaluation.is_none());
    assert!(harness.evaluation().is_none());

    let predictions = harness.predict(&x).unwrap();
    assert_eq!(predictions.len(), dataset.len());
    assert!(predictions.iter().all(|p| *p == 0.0 || *p == 1.0));
}

#[test]
fn test_classify_with_evaluation() {
    init_logging();
    let dataset = corpus();
    let x = builder().build(&dataset, true).unwrap().clone();
    let y = dataset.get_y_class().unwrap();

    let mut harness = ModelHarness::default();
    let evaluation = harness
        .classify(&x, &y, "LinearSVC", true)
        .unwrap()
        .cloned()
        .unwrap();
    assert_eq!(evaluation.task, Task::Classification);
    assert_eq!((evaluation.n_train, evaluation.n_test), (9, 3));
    let names: Vec<&str> = evaluation.measures.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["Accuracy", "Precision", "Recall", "F1 score"]);
    assert!(evaluation.get("Accuracy").unwrap() >= 0.0);

    // same seed, same partition, same measures
    let mut again = ModelHarness::default();
    let repeated = again.classify(&x, &y, "LinearSVC", true).unwrap().cloned().unwrap();
    assert_eq!(evaluation, repeated);

    // a later fit without evaluation drops the stale measures
    harness.classify(&x, &y, "LinearSVC", false).unwrap();
    assert!(harness.evaluation().is_none());
}

#[test]
fn test_regress_reports_regression_measures() {
    init_logging();
    let dataset = corpus();
    let x = builder().build(&dataset, true).unwrap().clone();
    let y = dataset.get_y().unwrap();

    for backend in ["Ridge", "ElasticNet", "SVR", "SVR_linear", "GBDTRegressor"] {
        let mut harness = ModelHarness::default();
        let evaluation = harness.regress(&x, &y, backend, true).unwrap().unwrap();
        assert_eq!(evaluation.measures.len(), 6, "{}", backend);
        assert!(evaluation.get("Normalized mean squared error").is_some());
        assert_eq!(harness.backend(), Some(backend));
    }
}

#[test]
fn test_custom_estimator_and_registry() {
    let dataset = corpus();
    let x = builder().build(&dataset, true).unwrap().clone();
    let y = dataset.get_y().unwrap();

    let mut harness = ModelHarness::new(ModelRegistry::empty());
    harness
        .regress(&x, &y, Backend::Custom(Box::new(MeanRegressor::default())), false)
        .unwrap();
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    assert_eq!(harness.predict(&x).unwrap(), vec![mean; y.len()]);
    assert!(matches!(
        harness.classify(&x, &y, "Ridge", false),
        Err(CbdtError::UnknownBackend(_))
    ));

    let mut registry = ModelRegistry::empty();
    registry.register("MeanRegressor", Task::Regression, MeanRegressor::default);
    let mut harness = ModelHarness::new(registry);
    assert!(matches!(
        harness.classify(&x, &y, "MeanRegressor", false),
        Err(CbdtError::TaskMismatch { .. })
    ));
    harness.regress(&x, &y, "MeanRegressor", true).unwrap();
    assert!(harness.evaluation().is_some());
}

#[test]
fn test_save_load_and_compatibility() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let dataset = corpus();
    let mut features = builder();
    let x = features.build(&dataset, true).unwrap().clone();
    let y = dataset.get_y_class().unwrap();

    let mut harness = ModelHarness::default();
    harness.classify(&x, &y, "MultinomialNB", false).unwrap();
    harness.bind_features(&features).unwrap();
    harness.save(&store, "baseline_trained").unwrap();

    let mut restored = ModelHarness::default();
    assert!(matches!(restored.predict(&x), Err(CbdtError::NotTrained)));
    restored.load(&store, "baseline_trained").unwrap();
    assert_eq!(restored.backend(), Some("MultinomialNB"));
    assert_eq!(restored.fingerprint(), Some(features.fingerprint().as_str()));
    assert_eq!(restored.predict(&x).unwrap(), harness.predict(&x).unwrap());
    restored.check_compatible(&features).unwrap();

    // a builder with the same width but a different layout is rejected
    let mut other = FeatureBuilder::new();
    for _ in 0..x.ncols() {
        other.add_feature(TextStatistic::new(StatisticKind::CharacterSum), "postText");
    }
    assert!(matches!(
        restored.check_compatible(&other),
        Err(CbdtError::IncompatibleArtifacts(_))
    ));
    assert!(matches!(
        restored.check_compatible(&FeatureBuilder::new()),
        Err(CbdtError::IncompatibleArtifacts(_))
    ));
}

#[test]
fn test_load_requires_registered_backend() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let dataset = corpus();
    let x = builder().build(&dataset, true).unwrap().clone();
    let y = dataset.get_y().unwrap();

    let mut harness = ModelHarness::default();
    harness.regress(&x, &y, "Lasso", false).unwrap();
    harness.save(&store, "lasso").unwrap();

    let mut empty = ModelHarness::new(ModelRegistry::empty());
    assert!(matches!(
        empty.load(&store, "lasso"),
        Err(CbdtError::UnknownBackend(name)) if name == "Lasso"
    ));
    assert!(!empty.is_trained());
}

use std::fs;
use std::path::Path;

use cbdt_features::config::{default_feature_set, HarnessConfig};
use cbdt_features::io::{write_predictions, ClickbaitDataset};
use cbdt_features::persist::ArtifactStore;
use cbdt_features::{Dataset, FeatureBuilder, FieldValue, ModelHarness};

const POSTS: [(&str, &str, bool); 8] = [
    ("101", "You won't believe what this dog did", true),
    ("102", "Parliament approves the 2017 budget", false),
    ("103", "10 things only @cats owners know #cute", true),
    ("104", "Central bank holds interest rates", false),
    ("105", "This simple trick will save you money", true),
    ("106", "Storm warning issued for the coast", false),
    ("107", "What happened next will shock you...", true),
    ("108", "Minister resigns after inquiry", false),
];

fn write_corpus(dir: &Path) {
    let mut instances = String::new();
    let mut truth = String::new();
    for (i, (id, text, clickbait)) in POSTS.iter().enumerate() {
        let media = if i % 3 == 0 { r#"["media/a.jpg"]"# } else { "[]" };
        instances.push_str(&format!(
            r#"{{"id": "{}", "postText": ["{}"], "postMedia": {}, "postTimestamp": "Mon Jun 05 {:02}:00:00 +0000 2017", "targetTitle": null}}"#,
            id,
            text,
            media,
            i * 3
        ));
        instances.push('\n');
        let (mean, class) = if *clickbait {
            (0.8, "clickbait")
        } else {
            (0.1, "no-clickbait")
        };
        truth.push_str(&format!(
            r#"{{"id": "{}", "truthJudgments": [{}], "truthMean": {}, "truthClass": "{}"}}"#,
            id, mean, mean, class
        ));
        truth.push('\n');
    }
    fs::write(dir.join("instances.jsonl"), instances).unwrap();
    fs::write(dir.join("truth.jsonl"), truth).unwrap();
}

#[test]
fn test_load_corpus_files() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());

    let dataset =
        ClickbaitDataset::load(dir.path().join("instances.jsonl"), Some(dir.path().join("truth.jsonl")))
            .unwrap();
    assert_eq!(dataset.len(), 8);
    assert_eq!(dataset.ids()[0], "101");
    assert_eq!(dataset.get_y_class().unwrap()[..2], [1.0, 0.0]);
    assert!(dataset
        .get_x("targetTitle")
        .unwrap()
        .iter()
        .all(|v| *v == FieldValue::Missing));

    let unlabelled = ClickbaitDataset::load(dir.path().join("instances.jsonl"), None).unwrap();
    assert!(unlabelled.get_y().is_none());
}

#[test]
fn test_missing_corpus_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ClickbaitDataset::load(dir.path().join("absent.jsonl"), None).is_err());
}

#[test]
fn test_train_then_predict_across_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let store = ArtifactStore::new(dir.path().join("persist"));
    let instances = dir.path().join("instances.jsonl");

    // training process
    {
        let dataset = ClickbaitDataset::load(&instances, Some(&dir.path().join("truth.jsonl"))).unwrap();
        let mut builder = FeatureBuilder::from_configs(default_feature_set(None), HarnessConfig::default()).unwrap();
        let x = builder.build(&dataset, true).unwrap().clone();
        builder.save(&store, "baseline").unwrap();

        let mut harness = ModelHarness::default();
        harness
            .classify(&x, &dataset.get_y_class().unwrap(), "LogisticRegression", true)
            .unwrap();
        harness.classify(&x, &dataset.get_y_class().unwrap(), "LogisticRegression", false).unwrap();
        harness.bind_features(&builder).unwrap();
        harness.save(&store, "baseline_trained").unwrap();
    }

    // inference process
    let dataset = ClickbaitDataset::load(&instances, None).unwrap();
    let mut builder = FeatureBuilder::load(&store, "baseline").unwrap();
    let mut harness = ModelHarness::default();
    harness.load(&store, "baseline_trained").unwrap();
    harness.check_compatible(&builder).unwrap();

    let x = builder.build(&dataset, false).unwrap();
    let scores = harness.predict(x).unwrap();

    let mut out = Vec::new();
    write_predictions(&mut out, &dataset.ids(), &scores).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 8);
    assert!(lines[0].starts_with(r#"{"id":"101","clickbaitScore":"#));
    assert!(lines[7].starts_with(r#"{"id":"108""#));
}

#[test]
fn test_empty_inference_file_builds_zero_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());
    let training =
        ClickbaitDataset::load(dir.path().join("instances.jsonl"), Some(dir.path().join("truth.jsonl")))
            .unwrap();
    let mut builder = FeatureBuilder::from_configs(default_feature_set(None), HarnessConfig::default()).unwrap();
    builder.build(&training, true).unwrap();
    let n_columns = builder.n_columns();

    fs::write(dir.path().join("empty.jsonl"), "").unwrap();
    let empty = ClickbaitDataset::load(dir.path().join("empty.jsonl"), None).unwrap();
    let x = builder.build(&empty, false).unwrap();
    assert_eq!(x.shape(), (0, n_columns));
    assert!(!builder.build_features_split().unwrap().is_available());
}

//! Integration tests for evaluation measures, reports and config types.

use cbdt_features::config::{default_feature_set, FeatureConfig, HarnessConfig, ModelType};
use cbdt_features::models::Task;
use cbdt_features::report::{render_html, render_latex};
use cbdt_features::stats::Evaluation;

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[test]
fn evaluation_regression_order() {
    let truth = [0.0, 0.5, 1.0, 0.5];
    let predicted = [0.1, 0.4, 0.9, 0.6];
    let evaluation = Evaluation::compute(Task::Regression, &truth, &predicted, 12).unwrap();
    assert_eq!((evaluation.n_train, evaluation.n_test), (12, 4));
    let names: Vec<&str> = evaluation.measures.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        [
            "Explained variance",
            "Mean absolute error",
            "Mean squared error",
            "Median absolute error",
            "R2 score",
            "Normalized mean squared error",
        ]
    );
    let mse = evaluation.get("Mean squared error").unwrap();
    assert!((mse - 0.01).abs() < 1e-12);
    assert!(evaluation.get("Accuracy").is_none());
}

#[test]
fn evaluation_rejects_length_mismatch() {
    assert!(Evaluation::compute(Task::Classification, &[1.0, 0.0], &[1.0], 1).is_err());
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[test]
fn latex_rows_three_decimals() {
    let evaluation = Evaluation::compute(Task::Classification, &[1.0, 0.0, 1.0], &[1.0, 0.0, 0.0], 9).unwrap();
    let latex = render_latex(&evaluation);
    let rows: Vec<&str> = latex.lines().collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], "Accuracy & 0.667 \\\\");
    assert_eq!(rows[1], "Precision & 1.000 \\\\");
}

#[test]
fn html_report_lists_measures() {
    let evaluation = Evaluation::compute(Task::Regression, &[0.0, 1.0], &[0.0, 1.0], 6).unwrap();
    let html = render_html(&evaluation, "baseline <ridge>", 42);
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("R2 score"));
    assert!(html.contains("baseline &lt;ridge&gt;"));
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[test]
fn harness_config_defaults() {
    let config: HarnessConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, HarnessConfig::default());
    assert_eq!(config.seed, 42);
    assert_eq!(config.test_size, 0.25);

    let config: HarnessConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.test_size, 0.25);
}

#[test]
fn model_type_names_and_tasks() {
    let all = ModelType::all_defaults();
    assert_eq!(all.len(), 11);
    for model_type in &all {
        let parsed: ModelType = model_type.name().parse().unwrap();
        assert_eq!(&parsed, model_type);
    }
    assert_eq!("ridge".parse::<ModelType>().unwrap().task(), Task::Regression);
    assert_eq!(
        "LOGISTICREGRESSION".parse::<ModelType>().unwrap().task(),
        Task::Classification
    );
    assert!("perceptron".parse::<ModelType>().is_err());
}

#[test]
fn model_type_json() {
    let json = r#"{"ElasticNet": {"alpha": 0.5, "l1_ratio": 0.2, "max_iter": 100, "tol": 1e-4}}"#;
    let model_type: ModelType = serde_json::from_str(json).unwrap();
    assert!(matches!(
        model_type,
        ModelType::ElasticNet { l1_ratio, .. } if l1_ratio == 0.2
    ));

    let json = r#"{"SVR_linear": {"c": 2.0, "epsilon": 0.05, "eps": 1e-3}}"#;
    let model_type: ModelType = serde_json::from_str(json).unwrap();
    assert_eq!(model_type.name(), "SVR_linear");
    assert_eq!(model_type.task(), Task::Regression);
    assert_eq!(serde_json::to_string(&model_type).unwrap(), json.replace(' ', "").replace("1e-3", "0.001"));
}

#[test]
fn default_feature_set_without_wordlists() {
    let features = default_feature_set(None);
    assert_eq!(features.len(), 13);
    assert!(features
        .iter()
        .all(|f| !matches!(f, FeatureConfig::WordlistDir { .. })));
    assert!(matches!(features.last(), Some(FeatureConfig::PartOfDay { field }) if field == "postTimestamp"));
}

use anyhow::{Context, Result};
use cbdt_features::config::{default_feature_set, FeatureConfig, HarnessConfig, ModelType};
use cbdt_features::models::Task;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::util::validate_jsonl_file;

/// Settings for `cbdt train`.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TrainConfig {
    pub version: String,
    pub instances: String,
    pub truth: String,
    /// Directory holding the builder and model artifacts.
    pub artifact_dir: String,
    /// Builder artifact name; the model is saved as `<builder_name>_trained`.
    pub builder_name: String,
    /// Explicit feature bindings. The baseline set is used when absent.
    pub features: Option<Vec<FeatureConfig>>,
    pub wordlist_dir: Option<String>,
    pub task: Task,
    pub model: String,
    /// Hyper-parameters for `model`; registry defaults otherwise.
    pub model_params: Option<ModelType>,
    pub harness: HarnessConfig,
    pub evaluate: bool,
    pub rebuild: bool,
    pub report: Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            version: clap::crate_version!().to_string(),
            instances: String::from("instances.jsonl"),
            truth: String::from("truth.jsonl"),
            artifact_dir: String::from("persist"),
            builder_name: String::from("baseline"),
            features: None,
            wordlist_dir: None,
            task: Task::Regression,
            model: String::from("Ridge"),
            model_params: None,
            harness: HarnessConfig::default(),
            evaluate: true,
            rebuild: false,
            report: Some(String::from("cbdt_report.html")),
        }
    }
}

impl TrainConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let mut config: TrainConfig = read_config(config_path)?;

        // Apply CLI overrides
        if let Some(instances) = matches.get_one::<String>("instances") {
            config.instances = instances.clone();
        }
        if let Some(truth) = matches.get_one::<String>("truth") {
            config.truth = truth.clone();
        }
        validate_jsonl_file(&config.instances)?;
        validate_jsonl_file(&config.truth)?;

        if let Some(model) = matches.get_one::<String>("model") {
            config.set_model(model)?;
        }
        if matches.get_flag("rebuild") {
            config.rebuild = true;
        }
        if matches.get_flag("no_report") {
            config.report = None;
        }

        config.check_model()?;
        Ok(config)
    }

    /// Replace the backend, dropping hyper-parameters that belong to another one.
    pub fn set_model(&mut self, model: &str) -> Result<()> {
        let parsed = ModelType::from_str(model).map_err(anyhow::Error::msg)?;
        self.model = parsed.name().to_string();
        if self.model_params.as_ref().map(|p| p.name()) != Some(parsed.name()) {
            self.model_params = None;
        }
        Ok(())
    }

    fn check_model(&mut self) -> Result<()> {
        if let Some(params) = &self.model_params {
            self.model = params.name().to_string();
        }
        let model_type = ModelType::from_str(&self.model).map_err(anyhow::Error::msg)?;
        if model_type.task() != self.task {
            anyhow::bail!(
                "Model '{}' is a {} model but the configured task is {}",
                self.model,
                model_type.task(),
                self.task
            );
        }
        Ok(())
    }

    /// The configured bindings, or the baseline set.
    pub fn feature_configs(&self) -> Vec<FeatureConfig> {
        match &self.features {
            Some(features) => features.clone(),
            None => default_feature_set(self.wordlist_dir.as_deref().map(Path::new)),
        }
    }

    pub fn model_artifact(&self) -> String {
        format!("{}_trained", self.builder_name)
    }
}

/// Settings for `cbdt predict`.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PredictConfig {
    pub version: String,
    pub instances: String,
    pub artifact_dir: String,
    pub builder_name: String,
    /// Model artifact name; `<builder_name>_trained` when absent.
    pub model_artifact: Option<String>,
    pub output: String,
}

impl Default for PredictConfig {
    fn default() -> Self {
        PredictConfig {
            version: clap::crate_version!().to_string(),
            instances: String::from("instances.jsonl"),
            artifact_dir: String::from("persist"),
            builder_name: String::from("baseline"),
            model_artifact: None,
            output: String::from("predictions.jsonl"),
        }
    }
}

impl PredictConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let mut config: PredictConfig = read_config(config_path)?;

        if let Some(instances) = matches.get_one::<String>("instances") {
            config.instances = instances.clone();
        }
        validate_jsonl_file(&config.instances)?;

        if let Some(output) = matches.get_one::<String>("output") {
            config.output = output.clone();
        }
        Ok(config)
    }

    pub fn model_artifact(&self) -> String {
        self.model_artifact
            .clone()
            .unwrap_or_else(|| format!("{}_trained", self.builder_name))
    }
}

fn read_config<T: for<'de> Deserialize<'de>>(config_path: &PathBuf) -> Result<T> {
    let config_json = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
    serde_json::from_str(&config_json)
        .with_context(|| format!("Failed to parse config file: {:?}", config_path))
}

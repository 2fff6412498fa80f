use anyhow::{Context, Result};
use cbdt_features::io::ClickbaitDataset;
use cbdt_features::models::{ModelRegistry, Task};
use cbdt_features::persist::ArtifactStore;
use cbdt_features::report::{render_latex, save_html};
use cbdt_features::{Dataset, FeatureBuilder, ModelHarness};
use std::path::Path;

use crate::config::TrainConfig;

/// Load the corpus, obtain a fitted builder, train the configured model and
/// persist both artifacts.
pub fn run_training(config: &TrainConfig) -> Result<()> {
    let dataset = ClickbaitDataset::load(&config.instances, Some(&config.truth))
        .with_context(|| format!("Failed to load corpus {}", config.instances))?;
    log::info!("Loaded {} labelled instances", dataset.len());

    let store = ArtifactStore::new(&config.artifact_dir);
    let builder = load_or_build(config, &store, &dataset)?;
    let x = builder
        .build_features()
        .cloned()
        .context("Feature builder produced no matrix")?;
    log::info!("Feature matrix: {} rows x {} columns", x.nrows(), x.ncols());

    let y = match config.task {
        Task::Classification => dataset.get_y_class(),
        Task::Regression => dataset.get_y(),
    }
    .with_context(|| format!("{} needs truth labels for every instance", config.task))?;

    let mut registry = ModelRegistry::default();
    if let Some(params) = &config.model_params {
        registry.register_model_type(params.clone());
    }
    let mut harness = ModelHarness::with_config(registry, config.harness);

    if config.evaluate {
        let evaluation = harness
            .train(config.task, &x, &y, config.model.as_str().into(), true)?
            .cloned()
            .context("Evaluation was requested but not produced")?;
        println!("{}", render_latex(&evaluation));

        if let Some(report) = &config.report {
            let path = Path::new(&config.artifact_dir).join(report);
            let title = format!("cbdt {} ({})", config.model, config.builder_name);
            save_html(&path, &evaluation, &title, x.ncols())
                .with_context(|| format!("Failed to write report {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
    }

    // the saved model is always fitted on every row
    harness.train(config.task, &x, &y, config.model.as_str().into(), false)?;
    harness.bind_features(&builder)?;
    harness
        .save(&store, &config.model_artifact())
        .context("Failed to save trained model")?;
    log::info!(
        "Saved model '{}' to {:?}",
        config.model_artifact(),
        store.path(&config.model_artifact())
    );
    Ok(())
}

fn load_or_build(
    config: &TrainConfig,
    store: &ArtifactStore,
    dataset: &ClickbaitDataset,
) -> Result<FeatureBuilder> {
    if !config.rebuild && store.exists(&config.builder_name) {
        log::info!("Reusing feature builder '{}'", config.builder_name);
        let mut builder = FeatureBuilder::load(store, &config.builder_name)?;
        builder.build(dataset, false)?;
        return Ok(builder);
    }

    log::info!("Fitting feature builder '{}'", config.builder_name);
    let mut builder = FeatureBuilder::from_configs(config.feature_configs(), config.harness)?;
    builder.build(dataset, true)?;
    builder
        .save(store, &config.builder_name)
        .context("Failed to save feature builder")?;
    Ok(builder)
}

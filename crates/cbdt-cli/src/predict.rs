use anyhow::{Context, Result};
use cbdt_features::io::{write_predictions, ClickbaitDataset};
use cbdt_features::persist::ArtifactStore;
use cbdt_features::{Dataset, FeatureBuilder, ModelHarness};
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::config::PredictConfig;

/// Score every instance of the configured corpus with saved artifacts.
pub fn run_prediction(config: &PredictConfig) -> Result<()> {
    let dataset = ClickbaitDataset::load(&config.instances, None)
        .with_context(|| format!("Failed to load corpus {}", config.instances))?;
    log::info!("Loaded {} instances", dataset.len());

    let store = ArtifactStore::new(&config.artifact_dir);
    let mut builder = FeatureBuilder::load(&store, &config.builder_name)
        .context("Failed to load feature builder")?;
    let mut harness = ModelHarness::default();
    harness
        .load(&store, &config.model_artifact())
        .context("Failed to load trained model")?;
    harness.check_compatible(&builder)?;

    let x = builder.build(&dataset, false)?;
    let scores = harness.predict(x)?;

    let file = File::create(&config.output)
        .with_context(|| format!("Failed to create output file: {}", config.output))?;
    let mut writer = BufWriter::new(file);
    write_predictions(&mut writer, &dataset.ids(), &scores)?;
    writer.flush()?;
    log::info!("Wrote {} predictions to {}", scores.len(), config.output);
    Ok(())
}

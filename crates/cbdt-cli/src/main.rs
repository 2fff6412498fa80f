use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;
use std::path::PathBuf;

use cbdt_cli::build_cli;
use cbdt_cli::config::{PredictConfig, TrainConfig};
use cbdt_cli::predict;
use cbdt_cli::train;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("CBDT_LOG", "error,cbdt=info"))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("train", train_matches)) => handle_train(train_matches),
        Some(("predict", predict_matches)) => handle_predict(predict_matches),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: &PathBuf = matches
        .get_one("config")
        .expect("config is a required argument");
    log::info!("[cbdt::train] Training from config: {:?}", config_path);

    let params = TrainConfig::from_arguments(config_path, matches)?;

    match train::run_training(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let config_path: &PathBuf = matches
        .get_one("config")
        .expect("config is a required argument");
    log::info!("[cbdt::predict] Predicting using config: {:?}", config_path);

    let params = PredictConfig::from_arguments(config_path, matches)?;

    match predict::run_prediction(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

pub mod config;
pub mod predict;
pub mod train;
pub mod util;

use clap::{Arg, ArgAction, Command, ValueHint};
use std::path::PathBuf;

/// The `cbdt` command line definition.
pub fn build_cli() -> Command {
    Command::new("cbdt")
        .version(clap::crate_version!())
        .about("Clickbait detection: feature building, model training and prediction")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Build (or load) a feature builder and train a model on a labelled corpus")
                .arg(
                    Arg::new("config")
                        .help("Path to training configuration file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("instances")
                        .short('i')
                        .long("instances")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the instances JSONL file. Overrides the instances file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("truth")
                        .short('t')
                        .long("truth")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the truth JSONL file. Overrides the truth file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Model backend to train, e.g. 'Ridge' or 'LogisticRegression'. \
                             Overrides the model specified in the configuration file.",
                        )
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("rebuild")
                        .long("rebuild")
                        .help("Fit a new feature builder even if a saved one exists.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Score an unlabelled corpus with saved builder and model artifacts")
                .arg(
                    Arg::new("config")
                        .help("Path to prediction configuration file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("instances")
                        .short('i')
                        .long("instances")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the instances JSONL file. Overrides the instances file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to write the JSONL predictions to.")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}

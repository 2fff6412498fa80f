use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data_handling::{DEFAULT_SEED, DEFAULT_TEST_SIZE};
use crate::error::{CbdtError, Result};
use crate::features::{
    Analyzer, ContainsWordsFeature, CountMode, Feature, HasMediaAttached, NGramFeature, PartOfDay,
    SentimentPolarity, StatisticKind, TextStatistic,
};
use crate::models::Task;

/// Split settings shared by the builder and the harness.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    pub seed: u64,
    pub test_size: f64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            seed: DEFAULT_SEED,
            test_size: DEFAULT_TEST_SIZE,
        }
    }
}

/// Supported model backends and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    LogisticRegression {
        c: f64,
        max_iter: usize,
        tol: f64,
    },
    LinearSVC {
        c: f64,
        eps: f64,
    },
    RidgeClassifier {
        alpha: f64,
        max_iter: usize,
        tol: f64,
    },
    MultinomialNB {
        alpha: f64,
    },
    GBDTClassifier {
        learning_rate: f32,
        max_depth: u32,
        num_boost_round: u32,
        training_optimization_level: u8,
        debug: bool,
    },
    Ridge {
        alpha: f64,
        max_iter: usize,
        tol: f64,
    },
    Lasso {
        alpha: f64,
        max_iter: usize,
        tol: f64,
    },
    ElasticNet {
        alpha: f64,
        l1_ratio: f64,
        max_iter: usize,
        tol: f64,
    },
    /// Gaussian kernel; `kernel_width: None` derives it from the training matrix.
    SVR {
        c: f64,
        epsilon: f64,
        kernel_width: Option<f64>,
        eps: f64,
    },
    #[serde(rename = "SVR_linear")]
    SVRLinear {
        c: f64,
        epsilon: f64,
        eps: f64,
    },
    GBDTRegressor {
        learning_rate: f32,
        max_depth: u32,
        num_boost_round: u32,
        training_optimization_level: u8,
        debug: bool,
    },
}

const MAX_ITER: usize = 1000;
const TOL: f64 = 1e-6;
const SVM_EPS: f64 = 1e-3;

impl ModelType {
    /// Registry name of the backend.
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::LogisticRegression { .. } => "LogisticRegression",
            ModelType::LinearSVC { .. } => "LinearSVC",
            ModelType::RidgeClassifier { .. } => "RidgeClassifier",
            ModelType::MultinomialNB { .. } => "MultinomialNB",
            ModelType::GBDTClassifier { .. } => "GBDTClassifier",
            ModelType::Ridge { .. } => "Ridge",
            ModelType::Lasso { .. } => "Lasso",
            ModelType::ElasticNet { .. } => "ElasticNet",
            ModelType::SVR { .. } => "SVR",
            ModelType::SVRLinear { .. } => "SVR_linear",
            ModelType::GBDTRegressor { .. } => "GBDTRegressor",
        }
    }

    pub fn task(&self) -> Task {
        match self {
            ModelType::LogisticRegression { .. }
            | ModelType::LinearSVC { .. }
            | ModelType::RidgeClassifier { .. }
            | ModelType::MultinomialNB { .. }
            | ModelType::GBDTClassifier { .. } => Task::Classification,
            ModelType::Ridge { .. }
            | ModelType::Lasso { .. }
            | ModelType::ElasticNet { .. }
            | ModelType::SVR { .. }
            | ModelType::SVRLinear { .. }
            | ModelType::GBDTRegressor { .. } => Task::Regression,
        }
    }

    /// Every backend with its default hyper-parameters.
    pub fn all_defaults() -> Vec<ModelType> {
        [
            "LogisticRegression",
            "LinearSVC",
            "RidgeClassifier",
            "MultinomialNB",
            "GBDTClassifier",
            "Ridge",
            "Lasso",
            "ElasticNet",
            "SVR",
            "SVR_linear",
            "GBDTRegressor",
        ]
        .iter()
        .filter_map(|name| ModelType::from_str(name).ok())
        .collect()
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logisticregression" => Ok(ModelType::LogisticRegression {
                c: 1.0,
                max_iter: MAX_ITER,
                tol: TOL,
            }),
            "linearsvc" => Ok(ModelType::LinearSVC { c: 1.0, eps: SVM_EPS }),
            "ridgeclassifier" => Ok(ModelType::RidgeClassifier {
                alpha: 1.0,
                max_iter: MAX_ITER,
                tol: TOL,
            }),
            "multinomialnb" => Ok(ModelType::MultinomialNB { alpha: 1.0 }),
            "gbdtclassifier" => Ok(ModelType::GBDTClassifier {
                learning_rate: 0.1,
                max_depth: 6,
                num_boost_round: 50,
                training_optimization_level: 2,
                debug: false,
            }),
            "ridge" => Ok(ModelType::Ridge {
                alpha: 1.0,
                max_iter: MAX_ITER,
                tol: TOL,
            }),
            "lasso" => Ok(ModelType::Lasso {
                alpha: 1.0,
                max_iter: MAX_ITER,
                tol: TOL,
            }),
            "elasticnet" => Ok(ModelType::ElasticNet {
                alpha: 1.0,
                l1_ratio: 0.5,
                max_iter: MAX_ITER,
                tol: TOL,
            }),
            "svr" => Ok(ModelType::SVR {
                c: 1.0,
                epsilon: 0.1,
                kernel_width: None,
                eps: SVM_EPS,
            }),
            "svr_linear" => Ok(ModelType::SVRLinear {
                c: 1.0,
                epsilon: 0.1,
                eps: SVM_EPS,
            }),
            "gbdtregressor" => Ok(ModelType::GBDTRegressor {
                learning_rate: 0.1,
                max_depth: 6,
                num_boost_round: 50,
                training_optimization_level: 2,
                debug: false,
            }),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}

fn default_order() -> usize {
    3
}

fn default_cutoff() -> usize {
    3
}

fn default_true() -> bool {
    true
}

/// Declarative description of one binding, as written in a JSON config.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureConfig {
    Ngram {
        field: String,
        analyzer: Analyzer,
        #[serde(default = "default_order")]
        order: usize,
        #[serde(default = "default_cutoff")]
        cutoff: usize,
    },
    ContainsWords {
        field: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        words: Vec<String>,
        #[serde(default)]
        wordlist: Option<PathBuf>,
        #[serde(default)]
        mode: CountMode,
        #[serde(default = "default_true")]
        only_words: bool,
        #[serde(default)]
        per_word: bool,
    },
    /// One `contains_words` binding per file in `dir`, in file-name order.
    WordlistDir {
        field: String,
        dir: PathBuf,
        #[serde(default)]
        mode: CountMode,
        #[serde(default = "default_true")]
        only_words: bool,
    },
    Statistic {
        field: String,
        statistic: StatisticKind,
    },
    HasMediaAttached {
        field: String,
    },
    PartOfDay {
        field: String,
    },
    SentimentPolarity {
        field: String,
    },
}

impl FeatureConfig {
    /// Instantiate the unfitted extractors this entry describes, each paired with its field.
    pub fn into_features(self) -> Result<Vec<(Box<dyn Feature>, String)>> {
        let features: Vec<(Box<dyn Feature>, String)> = match self {
            FeatureConfig::Ngram {
                field,
                analyzer,
                order,
                cutoff,
            } => vec![(Box::new(NGramFeature::new(analyzer, order, cutoff)), field)],
            FeatureConfig::ContainsWords {
                field,
                label,
                words,
                wordlist,
                mode,
                only_words,
                per_word,
            } => {
                let feature = match wordlist {
                    Some(path) => ContainsWordsFeature::from_file(&path)?,
                    None if words.is_empty() => {
                        return Err(CbdtError::InvalidInput(format!(
                            "contains_words binding on '{}' needs `words` or `wordlist`",
                            field
                        )))
                    }
                    None => ContainsWordsFeature::new(label.as_deref().unwrap_or("words"), &words),
                };
                let feature = match (&label, feature) {
                    (Some(label), f) => ContainsWordsFeature::new(label, f.lexicon()),
                    (None, f) => f,
                };
                vec![(
                    Box::new(feature.with_mode(mode).only_words(only_words).per_word(per_word)),
                    field,
                )]
            }
            FeatureConfig::WordlistDir {
                field,
                dir,
                mode,
                only_words,
            } => {
                let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file())
                    .collect();
                paths.sort();
                let mut features: Vec<(Box<dyn Feature>, String)> = Vec::with_capacity(paths.len());
                for path in paths {
                    let feature = ContainsWordsFeature::from_file(&path)?
                        .with_mode(mode)
                        .only_words(only_words);
                    features.push((Box::new(feature), field.clone()));
                }
                features
            }
            FeatureConfig::Statistic { field, statistic } => {
                vec![(Box::new(TextStatistic::new(statistic)), field)]
            }
            FeatureConfig::HasMediaAttached { field } => vec![(Box::new(HasMediaAttached::new()), field)],
            FeatureConfig::PartOfDay { field } => vec![(Box::new(PartOfDay::new()), field)],
            FeatureConfig::SentimentPolarity { field } => {
                vec![(Box::new(SentimentPolarity::new()), field)]
            }
        };
        Ok(features)
    }
}

/// The baseline clickbait feature set.
///
/// Wordlist-backed entries are only included when `wordlist_dir` is given;
/// it must contain the stop word, easy word, clickbait phrase and
/// abbreviation lists plus a `general-inquirer` directory.
pub fn default_feature_set(wordlist_dir: Option<&Path>) -> Vec<FeatureConfig> {
    let text = || "postText".to_string();
    let symbol = |label: &str, symbol: &str| FeatureConfig::ContainsWords {
        field: text(),
        label: Some(label.to_string()),
        words: vec![symbol.to_string()],
        wordlist: None,
        mode: CountMode::Count,
        only_words: false,
        per_word: false,
    };
    let wordlist = |dir: &Path, file: &str, mode: CountMode, only_words: bool| FeatureConfig::ContainsWords {
        field: text(),
        label: None,
        words: Vec::new(),
        wordlist: Some(dir.join(file)),
        mode,
        only_words,
        per_word: false,
    };
    let statistic = |statistic| FeatureConfig::Statistic {
        field: text(),
        statistic,
    };

    let mut features = vec![
        FeatureConfig::Ngram {
            field: text(),
            analyzer: Analyzer::Char,
            order: 3,
            cutoff: 3,
        },
        FeatureConfig::Ngram {
            field: text(),
            analyzer: Analyzer::Word,
            order: 3,
            cutoff: 3,
        },
        symbol("hashtags", "#"),
        symbol("mentions", "@"),
        FeatureConfig::SentimentPolarity { field: text() },
        statistic(StatisticKind::FleschKincaid),
    ];
    if let Some(dir) = wordlist_dir {
        features.push(wordlist(dir, "OxfortAbbreviationsList.txt", CountMode::Binary, false));
    }
    features.extend([
        symbol("dots", "."),
        statistic(StatisticKind::StartsWithNumber),
        statistic(StatisticKind::LongestWordLength),
        statistic(StatisticKind::MeanWordLength),
        statistic(StatisticKind::CharacterSum),
        FeatureConfig::HasMediaAttached {
            field: "postMedia".to_string(),
        },
        FeatureConfig::PartOfDay {
            field: "postTimestamp".to_string(),
        },
    ]);
    if let Some(dir) = wordlist_dir {
        features.extend([
            wordlist(dir, "DaleChallEasyWordList.txt", CountMode::Ratio, true),
            wordlist(dir, "TerrierStopWordList.txt", CountMode::Ratio, true),
            wordlist(dir, "DownworthyCommonClickbaitPhrases.txt", CountMode::Count, false),
            FeatureConfig::WordlistDir {
                field: text(),
                dir: dir.join("general-inquirer"),
                mode: CountMode::Count,
                only_words: true,
            },
        ]);
    }
    features
}

//! Feature extractors.
//!
//! A [`Feature`] is fitted once against a reference column and then
//! transforms any number of columns into a block with a fixed column
//! count. Built-in extractors can be snapshotted into a [`FeatureSpec`],
//! which is what a persisted `FeatureBuilder` stores.
pub mod metadata;
pub mod ngram;
pub mod sentiment;
pub mod text_stats;
pub mod wordlist;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dataset::FieldValue;
use crate::error::{CbdtError, Result};
use crate::math::FeatureMatrix;

pub use metadata::{HasMediaAttached, PartOfDay};
pub use ngram::{Analyzer, NGramFeature};
pub use sentiment::SentimentPolarity;
pub use text_stats::{StatisticKind, TextStatistic};
pub use wordlist::{ContainsWordsFeature, CountMode};

/// A fit-then-transform extractor over one raw field column.
pub trait Feature: FeatureClone + Send + Sync {
    /// Short description of the extractor and its configuration.
    fn name(&self) -> String;

    /// One name per emitted column. Fixed once the extractor is fitted.
    fn feature_names(&self) -> Vec<String>;

    fn is_fitted(&self) -> bool;

    /// Learn internal parameters from a training column.
    fn fit(&mut self, column: &[FieldValue]) -> Result<()>;

    /// Map a column to a block with exactly `feature_names().len()` columns.
    fn transform(&self, column: &[FieldValue]) -> Result<FeatureMatrix>;

    fn fit_transform(&mut self, column: &[FieldValue]) -> Result<FeatureMatrix> {
        self.fit(column)?;
        self.transform(column)
    }

    /// Serializable copy of the extractor, fitted state included.
    fn snapshot(&self) -> Result<FeatureSpec> {
        Err(CbdtError::persistence(
            &self.name(),
            "extractor does not support snapshots",
        ))
    }
}

/// Boxed copies of extractors, fitted state included.
pub trait FeatureClone {
    fn clone_box(&self) -> Box<dyn Feature>;
}

impl<T: Feature + Clone + 'static> FeatureClone for T {
    fn clone_box(&self) -> Box<dyn Feature> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Feature> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Serializable form of every built-in extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureSpec {
    NGram(NGramFeature),
    ContainsWords(ContainsWordsFeature),
    TextStatistic(TextStatistic),
    HasMediaAttached(HasMediaAttached),
    PartOfDay(PartOfDay),
    SentimentPolarity(SentimentPolarity),
}

impl FeatureSpec {
    pub fn into_feature(self) -> Box<dyn Feature> {
        match self {
            FeatureSpec::NGram(f) => Box::new(f),
            FeatureSpec::ContainsWords(f) => Box::new(f),
            FeatureSpec::TextStatistic(f) => Box::new(f),
            FeatureSpec::HasMediaAttached(f) => Box::new(f),
            FeatureSpec::PartOfDay(f) => Box::new(f),
            FeatureSpec::SentimentPolarity(f) => Box::new(f),
        }
    }
}

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w']+").expect("valid word regex"));

/// Lowercase word tokens of a text, apostrophes kept.
pub(crate) fn words(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

pub(crate) fn ensure_fitted(fitted: bool, name: impl FnOnce() -> String) -> Result<()> {
    if fitted {
        Ok(())
    } else {
        Err(CbdtError::NotFitted { feature: name() })
    }
}

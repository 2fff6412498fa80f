use serde::{Deserialize, Serialize};

use crate::dataset::FieldValue;
use crate::error::Result;
use crate::features::{ensure_fitted, words, Feature, FeatureSpec};
use crate::math::FeatureMatrix;

/// Closed-form statistics over a single text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    LongestWordLength,
    MeanWordLength,
    CharacterSum,
    StartsWithNumber,
    /// Flesch-Kincaid grade level.
    FleschKincaid,
}

impl StatisticKind {
    pub fn label(&self) -> &'static str {
        match self {
            StatisticKind::LongestWordLength => "longest_word_length",
            StatisticKind::MeanWordLength => "mean_word_length",
            StatisticKind::CharacterSum => "character_sum",
            StatisticKind::StartsWithNumber => "starts_with_number",
            StatisticKind::FleschKincaid => "flesch_kincaid_grade",
        }
    }

    pub fn compute(&self, text: &str) -> f64 {
        match self {
            StatisticKind::LongestWordLength => words(text)
                .iter()
                .map(|w| w.chars().count())
                .max()
                .unwrap_or(0) as f64,
            StatisticKind::MeanWordLength => {
                let tokens = words(text);
                if tokens.is_empty() {
                    0.0
                } else {
                    tokens.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / tokens.len() as f64
                }
            }
            StatisticKind::CharacterSum => text.chars().count() as f64,
            StatisticKind::StartsWithNumber => text
                .trim_start()
                .chars()
                .next()
                .map_or(0.0, |c| c.is_numeric() as u8 as f64),
            StatisticKind::FleschKincaid => flesch_kincaid_grade(text),
        }
    }
}

/// Single-column statistic extractor. Fitting learns nothing but is still
/// required before transforming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStatistic {
    kind: StatisticKind,
    fitted: bool,
}

impl TextStatistic {
    pub fn new(kind: StatisticKind) -> Self {
        TextStatistic { kind, fitted: false }
    }

    pub fn kind(&self) -> StatisticKind {
        self.kind
    }
}

impl Feature for TextStatistic {
    fn name(&self) -> String {
        self.kind.label().to_string()
    }

    fn feature_names(&self) -> Vec<String> {
        vec![self.kind.label().to_string()]
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn fit(&mut self, _column: &[FieldValue]) -> Result<()> {
        self.fitted = true;
        Ok(())
    }

    fn transform(&self, column: &[FieldValue]) -> Result<FeatureMatrix> {
        ensure_fitted(self.fitted, || self.name())?;
        Ok(FeatureMatrix::column(
            column.iter().map(|v| self.kind.compute(&v.as_text())).collect(),
        ))
    }

    fn snapshot(&self) -> Result<FeatureSpec> {
        Ok(FeatureSpec::TextStatistic(self.clone()))
    }
}

/// `0.39 * words/sentences + 11.8 * syllables/words - 15.59`, 0 for text without words.
fn flesch_kincaid_grade(text: &str) -> f64 {
    let tokens = words(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let sentences = count_sentences(text).max(1) as f64;
    let syllables: usize = tokens.iter().map(|w| count_syllables(w)).sum();
    let n_words = tokens.len() as f64;
    0.39 * (n_words / sentences) + 11.8 * (syllables as f64 / n_words) - 15.59
}

fn count_sentences(text: &str) -> usize {
    let mut sentences = 0;
    let mut in_terminator = false;
    let mut seen_content = false;
    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            if seen_content && !in_terminator {
                sentences += 1;
            }
            in_terminator = true;
        } else {
            if c.is_alphanumeric() {
                seen_content = true;
            }
            in_terminator = false;
        }
    }
    // trailing sentence without terminator
    if seen_content && !in_terminator {
        sentences += 1;
    }
    sentences
}

/// Vowel-group heuristic with a silent trailing `e`; at least one per word.
fn count_syllables(word: &str) -> usize {
    let chars: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    if chars.is_empty() {
        return 0;
    }
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut groups = 0;
    let mut previous_vowel = false;
    for &c in &chars {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            groups += 1;
        }
        previous_vowel = vowel;
    }
    let n = chars.len();
    if n > 2 && chars[n - 1] == 'e' && !is_vowel(chars[n - 2]) && groups > 1 {
        groups -= 1;
    }
    groups.max(1)
}

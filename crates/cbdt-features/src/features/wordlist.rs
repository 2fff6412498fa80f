use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::FieldValue;
use crate::error::{CbdtError, Result};
use crate::features::{ensure_fitted, words, Feature, FeatureSpec};
use crate::math::FeatureMatrix;

/// How lexicon hits are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    /// Raw number of hits.
    #[default]
    Count,
    /// 1 when there is at least one hit, else 0.
    Binary,
    /// Hits divided by the number of word tokens.
    Ratio,
}

/// Counts occurrences of lexicon entries in a text field.
///
/// With `only_words` the text is tokenised and whole lowercase tokens are
/// matched. Without it every entry is counted as a (possibly overlapping)
/// substring, which is what symbol lists (`@`, `#`, `.`) and multi-word
/// phrases need. `per_word` emits one column per entry instead of a single
/// total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainsWordsFeature {
    label: String,
    words: Vec<String>,
    mode: CountMode,
    only_words: bool,
    per_word: bool,
    fitted: bool,
}

impl ContainsWordsFeature {
    /// Lexicon given inline. Entries are lowercased, trimmed and deduplicated.
    pub fn new<I, S>(label: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() && !lexicon.contains(&word) {
                lexicon.push(word);
            }
        }
        ContainsWordsFeature {
            label: label.to_string(),
            words: lexicon,
            mode: CountMode::Count,
            only_words: true,
            per_word: false,
            fitted: false,
        }
    }

    /// Lexicon read from a wordlist file: one entry per line, blank lines and
    /// `#` comments skipped. The label is the file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CbdtError::InvalidInput(format!("failed to read wordlist {}: {}", path.display(), e))
        })?;
        let label = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("wordlist")
            .to_string();
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));
        Ok(Self::new(&label, entries))
    }

    pub fn with_mode(mut self, mode: CountMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn only_words(mut self, only_words: bool) -> Self {
        self.only_words = only_words;
        self
    }

    pub fn per_word(mut self, per_word: bool) -> Self {
        self.per_word = per_word;
        self
    }

    pub fn lexicon(&self) -> &[String] {
        &self.words
    }

    /// Hits per lexicon entry, and the token count of the text.
    fn hits(&self, text: &str) -> (Vec<usize>, usize) {
        let tokens = words(text);
        let hits = if self.only_words {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for token in &tokens {
                *counts.entry(token.as_str()).or_insert(0) += 1;
            }
            self.words
                .iter()
                .map(|w| counts.get(w.as_str()).copied().unwrap_or(0))
                .collect()
        } else {
            let lowered = text.to_lowercase();
            self.words
                .iter()
                .map(|w| count_overlapping(&lowered, w))
                .collect()
        };
        (hits, tokens.len())
    }

    fn score(&self, hits: usize, n_tokens: usize) -> f64 {
        match self.mode {
            CountMode::Count => hits as f64,
            CountMode::Binary => (hits > 0) as u8 as f64,
            CountMode::Ratio if n_tokens == 0 => 0.0,
            CountMode::Ratio => hits as f64 / n_tokens as f64,
        }
    }
}

fn count_overlapping(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        count += 1;
        let matched = start + pos;
        start = matched + haystack[matched..].chars().next().map_or(1, char::len_utf8);
    }
    count
}

impl Feature for ContainsWordsFeature {
    fn name(&self) -> String {
        format!("contains_words({}, {:?})", self.label, self.mode)
    }

    fn feature_names(&self) -> Vec<String> {
        if self.per_word {
            self.words.iter().map(|w| format!("{}:{}", self.label, w)).collect()
        } else {
            vec![self.label.clone()]
        }
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
        let width = self.feature_names().len();
        let rows = column
            .iter()
            .map(|value| {
                let (hits, n_tokens) = self.hits(&value.as_text());
                if self.per_word {
                    hits.into_iter().map(|h| self.score(h, n_tokens)).collect()
                } else {
                    vec![self.score(hits.into_iter().sum(), n_tokens)]
                }
            })
            .collect();
        FeatureMatrix::from_rows(rows, width)
    }

    fn snapshot(&self) -> Result<FeatureSpec> {
        Ok(FeatureSpec::ContainsWords(self.clone()))
    }
}

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dataset::FieldValue;
use crate::error::Result;
use crate::features::{ensure_fitted, Feature, FeatureSpec};
use crate::math::FeatureMatrix;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("valid token regex"));

/// Unit the n-grams are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    Word,
    Char,
}

/// TF-IDF weighted n-gram vectorizer.
///
/// Emits every n-gram of order `1..=order` whose document frequency in the
/// fitting column is at least `cutoff`. The vocabulary is sorted, idf is
/// smoothed (`ln((1 + n) / (1 + df)) + 1`) and rows are L2-normalised.
/// The output block is sparse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NGramFeature {
    analyzer: Analyzer,
    order: usize,
    cutoff: usize,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    fitted: bool,
}

impl NGramFeature {
    pub fn new(analyzer: Analyzer, order: usize, cutoff: usize) -> Self {
        NGramFeature {
            analyzer,
            order: order.max(1),
            cutoff: cutoff.max(1),
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            fitted: false,
        }
    }

    pub fn words(order: usize, cutoff: usize) -> Self {
        Self::new(Analyzer::Word, order, cutoff)
    }

    pub fn chars(order: usize, cutoff: usize) -> Self {
        Self::new(Analyzer::Char, order, cutoff)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn ngrams(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut grams = Vec::new();
        match self.analyzer {
            Analyzer::Word => {
                let tokens: Vec<&str> = TOKEN_RE.find_iter(&lowered).map(|m| m.as_str()).collect();
                for n in 1..=self.order {
                    grams.extend(tokens.windows(n).map(|w| w.join(" ")));
                }
            }
            Analyzer::Char => {
                let normalised = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
                let chars: Vec<char> = normalised.chars().collect();
                for n in 1..=self.order {
                    grams.extend(chars.windows(n).map(|w| w.iter().collect::<String>()));
                }
            }
        }
        grams
    }

    fn prefix(&self) -> &'static str {
        match self.analyzer {
            Analyzer::Word => "word_ngram",
            Analyzer::Char => "char_ngram",
        }
    }
}

impl Feature for NGramFeature {
    fn name(&self) -> String {
        format!("{}(order={}, cutoff={})", self.prefix(), self.order, self.cutoff)
    }

    fn feature_names(&self) -> Vec<String> {
        self.vocabulary
            .keys()
            .map(|term| format!("{}:{}", self.prefix(), term))
            .collect()
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn fit(&mut self, column: &[FieldValue]) -> Result<()> {
        let per_document: Vec<HashSet<String>> = column
            .par_iter()
            .map(|value| self.ngrams(&value.as_text()).into_iter().collect())
            .collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for grams in per_document {
            for gram in grams {
                *document_frequency.entry(gram).or_insert(0) += 1;
            }
        }

        let n_documents = column.len() as f64;
        self.vocabulary.clear();
        self.idf.clear();
        for (term, df) in document_frequency.into_iter().filter(|(_, df)| *df >= self.cutoff) {
            self.vocabulary.insert(term, self.idf.len());
            self.idf.push(((1.0 + n_documents) / (1.0 + df as f64)).ln() + 1.0);
        }
        self.fitted = true;

        log::debug!(
            "{} fitted on {} documents, vocabulary size {}",
            self.name(),
            column.len(),
            self.vocabulary.len()
        );
        Ok(())
    }

    fn transform(&self, column: &[FieldValue]) -> Result<FeatureMatrix> {
        ensure_fitted(self.fitted, || self.name())?;

        let rows: Vec<Vec<(usize, f64)>> = column
            .par_iter()
            .map(|value| {
                let mut counts: HashMap<usize, f64> = HashMap::new();
                for gram in self.ngrams(&value.as_text()) {
                    if let Some(&idx) = self.vocabulary.get(&gram) {
                        *counts.entry(idx).or_insert(0.0) += 1.0;
                    }
                }
                let mut row: Vec<(usize, f64)> =
                    counts.into_iter().map(|(idx, tf)| (idx, tf * self.idf[idx])).collect();
                row.sort_by_key(|&(idx, _)| idx);
                let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, v) in row.iter_mut() {
                        *v /= norm;
                    }
                }
                row
            })
            .collect();

        FeatureMatrix::from_sparse_rows(rows, self.vocabulary.len())
    }

    fn snapshot(&self) -> Result<FeatureSpec> {
        Ok(FeatureSpec::NGram(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CbdtError;

    fn column(texts: &[&str]) -> Vec<FieldValue> {
        texts.iter().map(|t| FieldValue::from(*t)).collect()
    }

    #[test]
    fn test_word_ngrams_respect_cutoff() {
        let mut f = NGramFeature::words(2, 2);
        f.fit(&column(&["you won't believe this", "you won't guess", "nothing else"])).unwrap();
        assert_eq!(
            f.feature_names(),
            vec!["word_ngram:won", "word_ngram:you", "word_ngram:you won"]
        );
    }

    #[test]
    fn test_transform_unseen_has_fitted_width() {
        let mut f = NGramFeature::chars(3, 1);
        f.fit(&column(&["abc", "abd"])).unwrap();
        let block = f.transform(&column(&["zzz", "abc", ""])).unwrap();
        assert!(block.is_sparse());
        assert_eq!(block.shape(), (3, f.vocabulary_size()));
        assert!(block.row_entries(0).is_empty());
        assert!(block.row_entries(2).is_empty());
    }

    #[test]
    fn test_rows_are_l2_normalised() {
        let mut f = NGramFeature::words(1, 1);
        let texts = column(&["breaking news breaking", "shocking news"]);
        let block = f.fit_transform(&texts).unwrap();
        for row in block.to_dense().rows() {
            let norm: f64 = row.iter().map(|v| v * v).sum();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let f = NGramFeature::words(3, 3);
        assert!(matches!(f.transform(&column(&["a"])), Err(CbdtError::NotFitted { .. })));
    }

    #[test]
    fn test_char_ngrams_collapse_whitespace() {
        let f = NGramFeature::chars(2, 1);
        let grams = f.ngrams("A  b");
        assert!(grams.contains(&"a ".to_string()));
        assert!(!grams.contains(&"  ".to_string()));
    }
}

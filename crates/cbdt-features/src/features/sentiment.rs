use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::dataset::FieldValue;
use crate::error::Result;
use crate::features::{ensure_fitted, words, Feature, FeatureSpec};
use crate::math::FeatureMatrix;

const POSITIVE: &[&str] = &[
    "amazing", "awesome", "beautiful", "best", "better", "brilliant", "celebrate", "cute", "delight",
    "excellent", "excited", "fantastic", "favorite", "fun", "glad", "good", "great", "happy", "hero",
    "incredible", "love", "lovely", "lucky", "perfect", "pleased", "proud", "success", "win", "wins",
    "winning", "wonderful", "wow",
];

const NEGATIVE: &[&str] = &[
    "angry", "awful", "bad", "crash", "crisis", "dead", "death", "disaster", "dies", "fail", "fails",
    "failure", "fear", "hate", "horrible", "kill", "killed", "lose", "loses", "loss", "sad", "scandal",
    "scary", "shocking", "terrible", "threat", "tragic", "ugly", "war", "worse", "worst", "wrong",
];

const NEGATIONS: &[&str] = &["not", "no", "never", "don't", "doesn't", "isn't", "won't", "can't"];

/// Lexicon polarity of a text in `[-1, 1]`.
///
/// `(positive - negative) / (positive + negative)` over matched tokens; a
/// sentiment word directly after a negation counts for the opposite side.
/// Texts without sentiment words score 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPolarity {
    positive: BTreeSet<String>,
    negative: BTreeSet<String>,
    fitted: bool,
}

impl Default for SentimentPolarity {
    fn default() -> Self {
        Self::with_lexicon(POSITIVE.iter().copied(), NEGATIVE.iter().copied())
    }
}

impl SentimentPolarity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lexicon<P, N, S>(positive: P, negative: N) -> Self
    where
        P: IntoIterator<Item = S>,
        N: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SentimentPolarity {
            positive: positive.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            negative: negative.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            fitted: false,
        }
    }

    pub fn polarity(&self, text: &str) -> f64 {
        let tokens = words(text);
        let mut positive = 0usize;
        let mut negative = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            let negated = i > 0 && NEGATIONS.contains(&tokens[i - 1].as_str());
            let sign = if self.positive.contains(token) {
                1
            } else if self.negative.contains(token) {
                -1
            } else {
                0
            };
            match (sign, negated) {
                (1, false) | (-1, true) => positive += 1,
                (-1, false) | (1, true) => negative += 1,
                _ => {}
            }
        }
        let total = positive + negative;
        if total == 0 {
            0.0
        } else {
            (positive as f64 - negative as f64) / total as f64
        }
    }
}

impl Feature for SentimentPolarity {
    fn name(&self) -> String {
        "sentiment_polarity".to_string()
    }

    fn feature_names(&self) -> Vec<String> {
        vec![self.name()]
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
            column.iter().map(|v| self.polarity(&v.as_text())).collect(),
        ))
    }

    fn snapshot(&self) -> Result<FeatureSpec> {
        Ok(FeatureSpec::SentimentPolarity(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_range() {
        let s = SentimentPolarity::new();
        assert_eq!(s.polarity("What a wonderful, amazing day"), 1.0);
        assert_eq!(s.polarity("A tragic disaster"), -1.0);
        assert_eq!(s.polarity("A great win after a terrible loss"), 0.0);
        assert_eq!(s.polarity("Nothing to see here"), 0.0);
    }

    #[test]
    fn test_negation_flips() {
        let s = SentimentPolarity::new();
        assert_eq!(s.polarity("this is not good"), -1.0);
    }

    #[test]
    fn test_custom_lexicon() {
        let s = SentimentPolarity::with_lexicon(["yay"], ["boo"]);
        assert_eq!(s.polarity("yay yay boo"), 1.0 / 3.0);
    }
}

use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

use crate::dataset::FieldValue;
use crate::error::Result;
use crate::features::{ensure_fitted, Feature, FeatureSpec};
use crate::math::FeatureMatrix;

/// 1 when the field holds at least one non-blank value (e.g. an attached image path).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HasMediaAttached {
    fitted: bool,
}

impl HasMediaAttached {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Feature for HasMediaAttached {
    fn name(&self) -> String {
        "has_media_attached".to_string()
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
            column.iter().map(|v| (!v.is_blank()) as u8 as f64).collect(),
        ))
    }

    fn snapshot(&self) -> Result<FeatureSpec> {
        Ok(FeatureSpec::HasMediaAttached(self.clone()))
    }
}

const BUCKETS: [&str; 4] = ["night", "morning", "afternoon", "evening"];

/// Formats tried in order; the first is the corpus' `postTimestamp` layout.
const TIMESTAMP_FORMATS: [&str; 2] = ["%a %b %d %H:%M:%S %z %Y", "%Y-%m-%d %H:%M:%S %z"];

/// One-hot coarse time of day of a timestamp field.
///
/// Hours 0-5 are night, 6-11 morning, 12-17 afternoon, 18-23 evening, in the
/// timestamp's own offset. Unparseable values emit an all-zero row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartOfDay {
    fitted: bool,
}

impl PartOfDay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok())
            .or_else(|| DateTime::parse_from_rfc2822(raw).ok())
    }

    /// Bucket index of a timestamp, `None` if it cannot be parsed.
    pub fn bucket(raw: &str) -> Option<usize> {
        Self::parse_timestamp(raw).map(|ts| ts.hour() as usize / 6)
    }
}

impl Feature for PartOfDay {
    fn name(&self) -> String {
        "part_of_day".to_string()
    }

    fn feature_names(&self) -> Vec<String> {
        BUCKETS.iter().map(|b| format!("part_of_day:{}", b)).collect()
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
        let rows = column
            .iter()
            .map(|value| {
                let mut row = vec![0.0; BUCKETS.len()];
                if let Some(bucket) = Self::bucket(&value.as_text()) {
                    row[bucket] = 1.0;
                }
                row
            })
            .collect();
        FeatureMatrix::from_rows(rows, BUCKETS.len())
    }

    fn snapshot(&self) -> Result<FeatureSpec> {
        Ok(FeatureSpec::PartOfDay(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_presence() {
        let mut f = HasMediaAttached::new();
        f.fit(&[]).unwrap();
        let column = vec![
            FieldValue::List(vec!["media/1.jpg".to_string()]),
            FieldValue::List(vec![]),
            FieldValue::Missing,
        ];
        let block = f.transform(&column).unwrap().to_dense();
        assert_eq!(block.column(0).to_vec(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_corpus_timestamp_bucket() {
        assert_eq!(PartOfDay::bucket("Thu Jun 08 16:31:10 +0000 2017"), Some(2));
        assert_eq!(PartOfDay::bucket("Sat Jan 07 03:00:00 +0000 2017"), Some(0));
        assert_eq!(PartOfDay::bucket("2017-06-08T07:15:00+02:00"), Some(1));
        assert_eq!(PartOfDay::bucket("not a date"), None);
    }

    #[test]
    fn test_part_of_day_one_hot() {
        let mut f = PartOfDay::new();
        f.fit(&[]).unwrap();
        let column = vec![
            FieldValue::from("Thu Jun 08 21:00:00 +0000 2017"),
            FieldValue::from(""),
        ];
        let block = f.transform(&column).unwrap().to_dense();
        assert_eq!(block.row(0).to_vec(), vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(block.row(1).to_vec(), vec![0.0; 4]);
    }
}

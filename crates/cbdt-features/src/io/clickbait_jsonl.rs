//! Webis Clickbait Challenge JSONL reader and prediction writer.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::dataset::{Dataset, FieldValue};
use crate::error::{CbdtError, Result};

/// Keys used when reading instance and truth records.
#[derive(Debug, Clone)]
pub struct ClickbaitReaderConfig {
    /// Key holding the instance id in both files.
    pub id_field: String,
    /// Truth key with the continuous clickbait score.
    pub score_field: String,
    /// Truth key with the class label.
    pub class_field: String,
    /// Class value mapped to 1; every other accepted value maps to 0.
    pub positive_class: String,
    pub negative_class: String,
}

impl Default for ClickbaitReaderConfig {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            score_field: "truthMean".to_string(),
            class_field: "truthClass".to_string(),
            positive_class: "clickbait".to_string(),
            negative_class: "no-clickbait".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Truth {
    score: f64,
    class: f64,
}

#[derive(Debug, Clone, Default)]
struct Instance {
    fields: BTreeMap<String, FieldValue>,
    truth: Option<Truth>,
}

/// A clickbait corpus: instances keyed by id, iterated in ascending id order.
///
/// Every key of an instance record other than the id becomes a field.
/// JSON strings become [`FieldValue::Text`], arrays become
/// [`FieldValue::List`], and `null` or an absent key becomes
/// [`FieldValue::Missing`]. Labels are only available when every instance
/// has a truth record.
#[derive(Debug, Clone, Default)]
pub struct ClickbaitDataset {
    instances: BTreeMap<String, Instance>,
}

impl ClickbaitDataset {
    /// Read `instances.jsonl` and, for labelled corpora, `truth.jsonl`.
    pub fn load<P: AsRef<Path>>(instances: P, truth: Option<P>) -> Result<Self> {
        Self::load_with_config(instances, truth, &ClickbaitReaderConfig::default())
    }

    pub fn load_with_config<P: AsRef<Path>>(
        instances: P,
        truth: Option<P>,
        config: &ClickbaitReaderConfig,
    ) -> Result<Self> {
        let instances_file = open(instances.as_ref())?;
        let truth_file = truth.map(|p| open(p.as_ref())).transpose()?;
        let dataset = Self::from_readers(instances_file, truth_file, config)?;
        log::info!(
            "Loaded {} instances from {}",
            dataset.len(),
            instances.as_ref().display()
        );
        Ok(dataset)
    }

    /// Parse instance and truth records from JSONL readers.
    pub fn from_readers<R: BufRead>(
        instances: R,
        truth: Option<R>,
        config: &ClickbaitReaderConfig,
    ) -> Result<Self> {
        let mut dataset = ClickbaitDataset::default();
        for_each_record(instances, |line, mut record| {
            let id = take_id(&mut record, &config.id_field, line)?;
            let fields = record
                .into_iter()
                .map(|(key, value)| (key, field_value(value)))
                .collect();
            if dataset
                .instances
                .insert(id.clone(), Instance { fields, truth: None })
                .is_some()
            {
                return Err(invalid(line, format!("duplicate instance id '{}'", id)));
            }
            Ok(())
        })?;

        if let Some(truth) = truth {
            let mut unmatched = 0usize;
            for_each_record(truth, |line, mut record| {
                let id = take_id(&mut record, &config.id_field, line)?;
                let score = record
                    .get(&config.score_field)
                    .and_then(Value::as_f64)
                    .ok_or_else(|| invalid(line, format!("missing numeric '{}'", config.score_field)))?;
                let class = match record.get(&config.class_field).and_then(Value::as_str) {
                    Some(c) if c == config.positive_class => 1.0,
                    Some(c) if c == config.negative_class => 0.0,
                    other => {
                        return Err(invalid(
                            line,
                            format!("unexpected '{}' value {:?}", config.class_field, other),
                        ))
                    }
                };
                match dataset.instances.get_mut(&id) {
                    Some(instance) => instance.truth = Some(Truth { score, class }),
                    None => unmatched += 1,
                }
                Ok(())
            })?;
            if unmatched > 0 {
                log::warn!("{} truth records have no matching instance", unmatched);
            }
        }
        Ok(dataset)
    }

    fn labels(&self, pick: impl Fn(&Truth) -> f64) -> Option<Vec<f64>> {
        if self.instances.is_empty() {
            return None;
        }
        self.instances
            .values()
            .map(|instance| instance.truth.as_ref().map(&pick))
            .collect()
    }
}

impl Dataset for ClickbaitDataset {
    fn len(&self) -> usize {
        self.instances.len()
    }

    fn ids(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    /// Every field is present on an empty corpus; otherwise a field needs
    /// at least one instance carrying it.
    fn get_x(&self, field: &str) -> Option<Vec<FieldValue>> {
        if self.instances.is_empty() {
            return Some(Vec::new());
        }
        if !self.instances.values().any(|i| i.fields.contains_key(field)) {
            return None;
        }
        Some(
            self.instances
                .values()
                .map(|i| i.fields.get(field).cloned().unwrap_or(FieldValue::Missing))
                .collect(),
        )
    }

    fn get_y(&self) -> Option<Vec<f64>> {
        self.labels(|truth| truth.score)
    }

    fn get_y_class(&self) -> Option<Vec<f64>> {
        self.labels(|truth| truth.class)
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| CbdtError::InvalidInput(format!("failed to open {}: {}", path.display(), e)))
}

fn invalid(line: usize, message: String) -> CbdtError {
    CbdtError::InvalidInput(format!("line {}: {}", line, message))
}

/// Call `f` with the 1-based line number and JSON object of every non-blank line.
fn for_each_record<R, F>(reader: R, mut f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, serde_json::Map<String, Value>) -> Result<()>,
{
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line) {
            Ok(Value::Object(record)) => f(line_no, record)?,
            Ok(_) => return Err(invalid(line_no, "expected a JSON object".to_string())),
            Err(e) => return Err(invalid(line_no, e.to_string())),
        }
    }
    Ok(())
}

fn take_id(record: &mut serde_json::Map<String, Value>, key: &str, line: usize) -> Result<String> {
    match record.remove(key) {
        Some(Value::String(id)) => Ok(id),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(invalid(line, format!("missing '{}'", key))),
    }
}

fn field_value(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Missing,
        Value::String(s) => FieldValue::Text(s),
        Value::Array(items) => FieldValue::List(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        ),
        other => FieldValue::Text(other.to_string()),
    }
}

#[derive(Serialize)]
struct PredictionRecord<'a> {
    id: &'a str,
    #[serde(rename = "clickbaitScore")]
    clickbait_score: i64,
}

/// Write one `{"id", "clickbaitScore"}` JSON line per instance, in ascending
/// id order. Scores are truncated toward zero.
pub fn write_predictions<W: Write>(mut writer: W, ids: &[String], scores: &[f64]) -> Result<()> {
    if ids.len() != scores.len() {
        return Err(CbdtError::InvalidInput(format!(
            "{} ids but {} scores",
            ids.len(),
            scores.len()
        )));
    }
    let mut rows: Vec<(&String, f64)> = ids.iter().zip(scores.iter().copied()).collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    for (id, score) in rows {
        let record = PredictionRecord {
            id,
            clickbait_score: score.trunc() as i64,
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| CbdtError::InvalidInput(format!("failed to encode prediction: {}", e)))?;
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const INSTANCES: &str = r#"{"id": "608310377143799810", "postText": ["Apple's iOS 9 'App thinning' feature"], "postMedia": [], "postTimestamp": "Tue Jun 09 16:31:10 +0000 2015"}
{"id": "608297246208217088", "postText": ["You won't believe this"], "postMedia": ["media/photo.jpg"], "postTimestamp": "Tue Jun 09 15:39:00 +0000 2015"}
"#;

    const TRUTH: &str = r#"{"id": "608310377143799810", "truthMean": 0.133, "truthClass": "no-clickbait"}
{"id": "608297246208217088", "truthMean": 0.8, "truthClass": "clickbait"}
"#;

    fn dataset(truth: Option<&str>) -> ClickbaitDataset {
        ClickbaitDataset::from_readers(
            Cursor::new(INSTANCES.to_string()),
            truth.map(|t| Cursor::new(t.to_string())),
            &ClickbaitReaderConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_instances_sorted_by_id() {
        let ds = dataset(Some(TRUTH));
        assert_eq!(ds.ids(), vec!["608297246208217088", "608310377143799810"]);
        assert_eq!(ds.get_y().unwrap(), vec![0.8, 0.133]);
        assert_eq!(ds.get_y_class().unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_fields_and_missing_values() {
        let ds = dataset(None);
        let media = ds.get_x("postMedia").unwrap();
        assert_eq!(media[1], FieldValue::List(vec![]));
        assert!(ds.get_x("targetTitle").is_none());
        assert!(ds.get_y().is_none());
    }

    #[test]
    fn test_empty_corpus_has_every_field() {
        let ds = ClickbaitDataset::from_readers(
            Cursor::new(String::new()),
            None,
            &ClickbaitReaderConfig::default(),
        )
        .unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.get_x("postText"), Some(vec![]));
        assert!(ds.get_y().is_none());
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let err = ClickbaitDataset::from_readers(
            Cursor::new("{\"id\": \"1\"}\nnot json\n".to_string()),
            None,
            &ClickbaitReaderConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_write_predictions_sorted_and_truncated() {
        let mut out = Vec::new();
        write_predictions(
            &mut out,
            &["b".to_string(), "a".to_string()],
            &[1.9, -0.7],
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "{\"id\":\"a\",\"clickbaitScore\":0}\n{\"id\":\"b\",\"clickbaitScore\":1}\n"
        );
    }
}

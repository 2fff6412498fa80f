//! The dataset contract consumed by the feature builder and the harness.
use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One raw field value of one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    /// Multi-valued fields such as `postText`, `postMedia` or `targetParagraphs`.
    List(Vec<String>),
    Missing,
}

impl FieldValue {
    /// The value as a single string. List items are joined with a space.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::List(items) if items.len() == 1 => Cow::Borrowed(items[0].as_str()),
            FieldValue::List(items) => Cow::Owned(items.join(" ")),
            FieldValue::Missing => Cow::Borrowed(""),
        }
    }

    /// True when there is no non-blank content.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
            FieldValue::Missing => true,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Column-oriented access to a labelled corpus.
///
/// Every sequence returned here is aligned: position `i` of `get_x`,
/// `get_y`, `get_y_class` and `ids` refers to the same instance.
pub trait Dataset {
    /// Number of instances.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Instance ids in iteration order.
    fn ids(&self) -> Vec<String>;

    /// Values of `field` for every instance, or `None` if the dataset has no such field.
    fn get_x(&self, field: &str) -> Option<Vec<FieldValue>>;

    /// Continuous labels, if the dataset carries them.
    fn get_y(&self) -> Option<Vec<f64>>;

    /// Class labels, if the dataset carries them.
    fn get_y_class(&self) -> Option<Vec<f64>>;
}

/// A dataset held fully in memory, assembled column by column.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    ids: Vec<String>,
    fields: BTreeMap<String, Vec<FieldValue>>,
    y: Option<Vec<f64>>,
    y_class: Option<Vec<f64>>,
}

impl InMemoryDataset {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InMemoryDataset {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Dataset with ids `"0".."n"`.
    pub fn with_len(n: usize) -> Self {
        Self::new((0..n).map(|i| i.to_string()))
    }

    /// Add or replace a field column. Panics if the column length differs from the id count.
    pub fn with_field<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        let values: Vec<FieldValue> = values.into_iter().map(Into::into).collect();
        assert_eq!(values.len(), self.ids.len(), "field '{}' must have one value per instance", name);
        self.fields.insert(name.to_string(), values);
        self
    }

    /// Continuous labels. Not validated against the instance count; a
    /// mismatch surfaces as an unavailable split.
    pub fn with_y(mut self, y: Vec<f64>) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_y_class(mut self, y: Vec<f64>) -> Self {
        self.y_class = Some(y);
        self
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.ids.len()
    }

    fn ids(&self) -> Vec<String> {
        self.ids.clone()
    }

    fn get_x(&self, field: &str) -> Option<Vec<FieldValue>> {
        self.fields.get(field).cloned()
    }

    fn get_y(&self) -> Option<Vec<f64>> {
        self.y.clone()
    }

    fn get_y_class(&self) -> Option<Vec<f64>> {
        self.y_class.clone()
    }
}

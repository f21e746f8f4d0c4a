//! Record types flowing from a source into the pipeline.
//!
//! A record is a mapping from column name to a scalar cell. Cells are kept as
//! they arrive; numeric interpretation happens only when a window is summarized.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell of a record.
///
/// Deserializes from any JSON scalar. Arrays and objects are not valid cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Interpret the cell as numeric-or-null.
    ///
    /// Returns `None` when the cell has no numeric reading at all. Blank
    /// text and non-finite numbers (NaN, infinities, overflowing literals
    /// such as `"1e400"`) read as null.
    pub fn numeric(&self) -> Option<Option<f64>> {
        match self {
            FieldValue::Null => Some(None),
            FieldValue::Number(v) => Some(v.is_finite().then_some(*v)),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Some(None);
                }
                let v = trimmed.parse::<f64>().ok()?;
                Some(v.is_finite().then_some(v))
            }
            FieldValue::Bool(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(FieldValue::Null, FieldValue::Number)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// A structured record, ordered by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Get the cell for a column.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    /// Column names in ascending order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The column set every record of a run must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Derive the schema from a record.
    pub fn of(record: &Record) -> Self {
        Self {
            columns: record.columns().map(str::to_string).collect(),
        }
    }

    /// Column names in ascending order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check whether a record carries exactly this column set.
    pub fn matches(&self, record: &Record) -> bool {
        record.len() == self.columns.len()
            && record
                .columns()
                .zip(self.columns.iter())
                .all(|(a, b)| a == b)
    }

    /// Columns missing from the record and columns the schema does not know.
    pub fn diff(&self, record: &Record) -> (Vec<String>, Vec<String>) {
        let missing = self
            .columns
            .iter()
            .filter(|c| record.get(c).is_none())
            .cloned()
            .collect();
        let extra = record
            .columns()
            .filter(|c| self.columns.binary_search_by(|s| s.as_str().cmp(c)).is_err())
            .map(str::to_string)
            .collect();
        (missing, extra)
    }
}

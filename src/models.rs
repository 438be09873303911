//! Data models for the student pipeline.
//!
//! This module contains the core data structures passed between the
//! pipeline stages: raw student records, identity keys, low-score
//! reports and the summary metrics written at the end of a run.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Fields every student record must carry with a truthy value.
pub const REQUIRED_FIELDS: [&str; 4] = ["id", "first_name", "last_name", "email"];

/// Suffix marking a per-subject score field.
pub const SCORE_SUFFIX: &str = "_score";

/// Subjects summarized by the aggregator, in report order.
pub const SUBJECTS: [&str; 7] = [
    "math_score",
    "history_score",
    "physics_score",
    "chemistry_score",
    "biology_score",
    "english_score",
    "geography_score",
];

/// A single student record.
///
/// Records are loosely typed: the source document decides which fields
/// exist, and field order follows the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentRecord(pub Map<String, Value>);

impl StudentRecord {
    /// Creates a record from a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns the value of a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns a field as a string slice, if it holds a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Sets a field, keeping its original position if it already exists.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Field names in record order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Returns the identity key used for deduplication.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            first_name: display_value(self.get("first_name")),
            last_name: display_value(self.get("last_name")),
            email: display_value(self.get("email")),
        }
    }

    /// Score fields (`*_score`) holding numeric values.
    pub fn scores(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().filter_map(|(key, value)| {
            if key.ends_with(SCORE_SUFFIX) {
                value.as_f64().map(|score| (key.as_str(), score))
            } else {
                None
            }
        })
    }
}

impl From<Map<String, Value>> for StudentRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// The (first name, last name, email) triple identifying a student.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} <{}>", self.first_name, self.last_name, self.email)
    }
}

/// Payload relayed for a student with at least one low score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowScoreReport {
    pub id: Value,
    pub first_name: Value,
    pub last_name: Value,
    /// Email as stored, i.e. the ciphertext.
    pub email: Value,
    pub low_scores: Map<String, Value>,
}

/// Descriptive statistics for one subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectMetrics {
    #[serde(skip)]
    pub subject: String,
    pub mean: f64,
    pub median: f64,
    pub stdev: f64,
    pub max: f64,
    pub min: f64,
}

/// Frequency counts for the distinct values of one categorical field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCounts {
    entries: Vec<(String, usize)>,
}

impl CategoryCounts {
    /// Records one occurrence of `label`.
    pub fn observe(&mut self, label: String) {
        let existing = self.entries.iter_mut().find(|(name, _)| *name == label);
        match existing {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label, 1)),
        }
    }

    /// Count for a label (0 when never observed).
    #[cfg(test)]
    pub fn get(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Labels and counts in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CategoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Categorical breakdowns across the final record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparisons {
    pub by_gender: CategoryCounts,
    pub by_career_aspiration: CategoryCounts,
    pub by_extracurricular_activities: CategoryCounts,
}

/// Summary of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryMetrics {
    pub generated_at: DateTime<Utc>,
    /// Per-subject statistics, in [`SUBJECTS`] order.
    #[serde(serialize_with = "serialize_subjects")]
    pub subject_metrics: Vec<SubjectMetrics>,
    pub comparisons: Comparisons,
}

impl SummaryMetrics {
    /// Looks up the metrics of one subject.
    #[cfg(test)]
    pub fn subject(&self, name: &str) -> Option<&SubjectMetrics> {
        self.subject_metrics.iter().find(|m| m.subject == name)
    }
}

fn serialize_subjects<S: Serializer>(
    subjects: &[SubjectMetrics],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(subjects.iter().map(|m| (m.subject.as_str(), m)))
}

/// Renders a JSON value as a plain label (`null` for absent values).
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Mirrors the truthiness rules used for required fields.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

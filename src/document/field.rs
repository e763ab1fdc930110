//! Typed document fields.
//!
//! A [`Field`] is one indexable value produced by the mapping engine:
//! - **Text** - analyzed into tokens by the field's analyzer
//! - **Numeric** - a single sortable term from the float encoding
//! - **DateTime** - a single sortable term from the nanosecond timestamp
//!
//! Every field carries the array positions of the list elements it was found
//! under, so `{"tags": ["a", "b"]}` yields two `tags` fields at `[0]` and
//! `[1]`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::error::{GlaiveError, Result};
use crate::util::numeric::{encode_f64, encode_i64};

/// How a field participates in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingOptions {
    /// Add the field's terms to the inverted index.
    pub index: bool,
    /// Keep the original value so it can be returned with hits.
    pub store: bool,
    /// Record term positions and offsets for phrase matching and highlighting.
    pub term_vectors: bool,
    /// Feed the field's terms into the composite `_all` field.
    pub include_in_all: bool,
}

impl Default for IndexingOptions {
    fn default() -> Self {
        IndexingOptions {
            index: true,
            store: true,
            term_vectors: true,
            include_in_all: true,
        }
    }
}

/// The value held by a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Numeric(f64),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    /// Type name used in dumps and errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Numeric(_) => "number",
            FieldValue::DateTime(_) => "datetime",
        }
    }

    /// Convert to the JSON form returned with search hits.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Numeric(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Numeric(n) => write!(f, "{n}"),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// Occurrence of a term inside a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermLocation {
    /// 1-based token position.
    pub position: u64,
    /// Byte offset of the token start.
    pub start: u64,
    /// Byte offset of the token end.
    pub end: u64,
    /// List indexes of the field the term occurred in.
    pub array_positions: Vec<u64>,
}

/// Frequency and locations of one term in one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermFrequency {
    pub frequency: u64,
    pub locations: Vec<TermLocation>,
}

/// Output of analyzing one field.
#[derive(Debug, Clone, Default)]
pub struct AnalyzedField {
    /// Number of tokens the field produced.
    pub length: u64,
    /// Terms keyed by their text.
    pub terms: BTreeMap<String, TermFrequency>,
}

/// A single named, typed value within a [`Document`](super::Document).
#[derive(Clone)]
pub struct Field {
    name: String,
    array_positions: Vec<u64>,
    value: FieldValue,
    options: IndexingOptions,
    analyzer: Option<Arc<dyn Analyzer>>,
}

impl Field {
    /// Create a text field. Without an analyzer the whole value is one term.
    pub fn text<S: Into<String>, V: Into<String>>(
        name: S,
        array_positions: Vec<u64>,
        value: V,
    ) -> Self {
        Field {
            name: name.into(),
            array_positions,
            value: FieldValue::Text(value.into()),
            options: IndexingOptions::default(),
            analyzer: None,
        }
    }

    /// Create a numeric field.
    pub fn numeric<S: Into<String>>(name: S, array_positions: Vec<u64>, value: f64) -> Self {
        Field {
            name: name.into(),
            array_positions,
            value: FieldValue::Numeric(value),
            options: IndexingOptions::default(),
            analyzer: None,
        }
    }

    /// Create a datetime field.
    ///
    /// Fails when the instant cannot be represented as nanoseconds since the
    /// epoch in an `i64`.
    pub fn datetime<S: Into<String>>(
        name: S,
        array_positions: Vec<u64>,
        value: DateTime<Utc>,
    ) -> Result<Self> {
        let name = name.into();
        if value.timestamp_nanos_opt().is_none() {
            return Err(GlaiveError::analysis(format!(
                "datetime for field '{name}' is out of range: {value}"
            )));
        }
        Ok(Field {
            name,
            array_positions,
            value: FieldValue::DateTime(value),
            options: IndexingOptions::default(),
            analyzer: None,
        })
    }

    pub fn with_options(mut self, options: IndexingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn array_positions(&self) -> &[u64] {
        &self.array_positions
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn options(&self) -> IndexingOptions {
        self.options
    }

    pub fn analyzer(&self) -> Option<&Arc<dyn Analyzer>> {
        self.analyzer.as_ref()
    }

    /// Text content, if this is a text field.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Run the field through analysis and collect term frequencies.
    pub fn analyze(&self) -> Result<AnalyzedField> {
        let mut analyzed = AnalyzedField::default();
        match &self.value {
            FieldValue::Text(text) => match &self.analyzer {
                Some(analyzer) => {
                    for token in analyzer.analyze(text)? {
                        analyzed.length += 1;
                        self.record(
                            &mut analyzed,
                            token.text,
                            token.position as u64,
                            token.start_offset as u64,
                            token.end_offset as u64,
                        );
                    }
                }
                None => {
                    analyzed.length = 1;
                    self.record(&mut analyzed, text.clone(), 1, 0, text.len() as u64);
                }
            },
            FieldValue::Numeric(n) => {
                analyzed.length = 1;
                self.record(&mut analyzed, encode_f64(*n), 1, 0, 0);
            }
            FieldValue::DateTime(dt) => {
                let nanos = dt.timestamp_nanos_opt().ok_or_else(|| {
                    GlaiveError::analysis(format!("datetime out of range: {dt}"))
                })?;
                analyzed.length = 1;
                self.record(&mut analyzed, encode_i64(nanos), 1, 0, 0);
            }
        }
        Ok(analyzed)
    }

    fn record(&self, analyzed: &mut AnalyzedField, term: String, position: u64, start: u64, end: u64) {
        let entry = analyzed.terms.entry(term).or_default();
        entry.frequency += 1;
        if self.options.term_vectors {
            entry.locations.push(TermLocation {
                position,
                start,
                end,
                array_positions: self.array_positions.clone(),
            });
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("array_positions", &self.array_positions)
            .field("value", &self.value)
            .field("options", &self.options)
            .field("analyzer", &self.analyzer.as_ref().map(|a| a.name().to_string()))
            .finish()
    }
}

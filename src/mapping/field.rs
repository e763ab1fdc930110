//! Field mappings: how one property becomes one or more document fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Field, IndexingOptions};
use crate::mapping::index::WalkContext;
use crate::mapping::path::encode_path;

/// The kind of field a mapping produces.
///
/// Unknown names survive deserialization so that validation, not decoding,
/// reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    DateTime,
    Number,
    Unknown(String),
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "text" => FieldType::Text,
            "datetime" => FieldType::DateTime,
            "number" => FieldType::Number,
            _ => FieldType::Unknown(name),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::DateTime => write!(f, "datetime"),
            FieldType::Number => write!(f, "number"),
            FieldType::Unknown(name) => write!(f, "{name}"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Describes how a property is indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Overrides the last path segment in the produced field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Analyzer for text fields. Falls back to the enclosing mappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,

    #[serde(default = "default_true")]
    pub store: bool,

    #[serde(default = "default_true")]
    pub index: bool,

    #[serde(default = "default_true")]
    pub include_term_vectors: bool,

    #[serde(default = "default_true")]
    pub include_in_all: bool,

    /// Datetime parser for string values of datetime fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

impl FieldMapping {
    fn with_type(field_type: FieldType) -> Self {
        FieldMapping {
            name: None,
            field_type,
            analyzer: None,
            store: true,
            index: true,
            include_term_vectors: true,
            include_in_all: true,
            date_format: None,
        }
    }

    pub fn text() -> Self {
        Self::with_type(FieldType::Text)
    }

    pub fn number() -> Self {
        Self::with_type(FieldType::Number)
    }

    pub fn datetime() -> Self {
        Self::with_type(FieldType::DateTime)
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_analyzer<S: Into<String>>(mut self, analyzer: S) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn with_date_format<S: Into<String>>(mut self, parser: S) -> Self {
        self.date_format = Some(parser.into());
        self
    }

    pub fn with_store(mut self, store: bool) -> Self {
        self.store = store;
        self
    }

    pub fn with_index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn with_term_vectors(mut self, include: bool) -> Self {
        self.include_term_vectors = include;
        self
    }

    pub fn with_include_in_all(mut self, include: bool) -> Self {
        self.include_in_all = include;
        self
    }

    /// Indexing options carried onto produced fields.
    pub fn options(&self) -> IndexingOptions {
        IndexingOptions {
            index: self.index,
            store: self.store,
            term_vectors: self.include_term_vectors,
            include_in_all: self.include_in_all,
        }
    }

    /// Name of the produced field: parent path plus this mapping's name, or the
    /// full path when the mapping has no name.
    pub(crate) fn field_name(&self, path: &[String]) -> String {
        match &self.name {
            Some(name) if !path.is_empty() => {
                let mut parent: Vec<&str> = path[..path.len() - 1].iter().map(String::as_str).collect();
                parent.push(name);
                encode_path(&parent)
            }
            Some(name) => name.clone(),
            None => encode_path(path),
        }
    }

    pub(crate) fn process_string(
        &self,
        value: &str,
        path: &[String],
        indexes: &[u64],
        ctx: &mut WalkContext<'_>,
    ) {
        let name = self.field_name(path);
        match self.field_type {
            FieldType::Text => {
                let mut field =
                    Field::text(name, indexes.to_vec(), value).with_options(self.options());
                if let Some(analyzer) = ctx.analyzer_for_field(self, path) {
                    field = field.with_analyzer(analyzer);
                }
                ctx.doc.add_field(field);
            }
            FieldType::DateTime => {
                let mapping = ctx.mapping;
                let parser_name = self
                    .date_format
                    .as_deref()
                    .unwrap_or(&mapping.default_datetime_parser);
                let Some(parser) = mapping.datetime_parser_named(parser_name) else {
                    log::warn!("no datetime parser named '{parser_name}' for field '{name}'");
                    return;
                };
                match parser.parse_datetime(value) {
                    Ok(time) => self.process_time(time, path, indexes, ctx),
                    Err(e) => log::debug!("field '{name}' value '{value}' is not a date: {e}"),
                }
            }
            _ => {}
        }
    }

    pub(crate) fn process_number(
        &self,
        value: f64,
        path: &[String],
        indexes: &[u64],
        ctx: &mut WalkContext<'_>,
    ) {
        if self.field_type == FieldType::Number {
            let field = Field::numeric(self.field_name(path), indexes.to_vec(), value)
                .with_options(self.options());
            ctx.doc.add_field(field);
        }
    }

    pub(crate) fn process_time(
        &self,
        value: DateTime<Utc>,
        path: &[String],
        indexes: &[u64],
        ctx: &mut WalkContext<'_>,
    ) {
        if self.field_type != FieldType::DateTime {
            return;
        }
        match Field::datetime(self.field_name(path), indexes.to_vec(), value) {
            Ok(field) => ctx.doc.add_field(field.with_options(self.options())),
            Err(e) => log::warn!("could not build date field: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_field_name() {
        let unnamed = FieldMapping::text();
        assert_eq!(unnamed.field_name(&path(&["a", "b"])), "a.b");

        let named = FieldMapping::text().with_name("title");
        assert_eq!(named.field_name(&path(&["a", "b"])), "a.title");
        assert_eq!(named.field_name(&path(&["b"])), "title");
    }

    #[test]
    fn test_unknown_type_survives_decoding() {
        let fm: FieldMapping = serde_json::from_str(r#"{"type": "geo"}"#).unwrap();
        assert_eq!(fm.field_type, FieldType::Unknown("geo".to_string()));
        assert!(fm.store && fm.index && fm.include_in_all);

        let json = serde_json::to_value(FieldMapping::datetime()).unwrap();
        assert_eq!(json["type"], "datetime");
    }
}

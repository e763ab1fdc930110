//! Document mappings: a tree of per-property mappings mirroring the shape of
//! the documents they describe.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Value;
use crate::error::{GlaiveError, Result};
use crate::mapping::field::{FieldMapping, FieldType};
use crate::mapping::index::WalkContext;
use crate::mapping::path::decode_path;
use crate::registry::Registry;

fn default_true() -> bool {
    true
}

/// Mapping for a document type, or for one object-valued property within it.
///
/// A disabled mapping ignores its whole subtree. A dynamic mapping indexes
/// properties it has no explicit mapping for, inferring their type from the
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMapping {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub dynamic: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, DocumentMapping>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldMapping>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_analyzer: Option<String>,
}

impl Default for DocumentMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentMapping {
    /// An enabled, dynamic mapping with no explicit properties.
    pub fn new() -> Self {
        DocumentMapping {
            enabled: true,
            dynamic: true,
            properties: BTreeMap::new(),
            fields: Vec::new(),
            default_analyzer: None,
        }
    }

    /// A mapping that indexes only explicitly mapped properties.
    pub fn new_static() -> Self {
        DocumentMapping {
            dynamic: false,
            ..Self::new()
        }
    }

    /// A mapping whose subtree is ignored entirely.
    pub fn disabled() -> Self {
        DocumentMapping {
            enabled: false,
            dynamic: false,
            ..Self::new()
        }
    }

    pub fn with_default_analyzer<S: Into<String>>(mut self, analyzer: S) -> Self {
        self.default_analyzer = Some(analyzer.into());
        self
    }

    /// Map an object-valued property.
    pub fn add_sub_document<S: Into<String>>(&mut self, property: S, mapping: DocumentMapping) {
        self.properties.insert(property.into(), mapping);
    }

    /// Add a field mapping applying to the value at this mapping's own path.
    pub fn add_field(&mut self, field: FieldMapping) {
        self.fields.push(field);
    }

    /// Add a field mapping for a direct property, creating its sub-mapping
    /// when needed.
    pub fn add_field_at<S: Into<String>>(&mut self, property: S, field: FieldMapping) {
        self.properties
            .entry(property.into())
            .or_default()
            .fields
            .push(field);
    }

    /// Find the mapping registered exactly at a dotted path.
    pub fn document_mapping_for_path(&self, path: &str) -> Option<&DocumentMapping> {
        self.document_mapping_at(&decode_path(path))
    }

    /// Find the deepest mapping along a dotted path.
    pub fn closest_document_mapping(&self, path: &str) -> &DocumentMapping {
        self.closest_document_mapping_at(&decode_path(path))
    }

    /// Mapping at a segment path. The empty slice is this mapping itself.
    fn document_mapping_at<S: AsRef<str>>(&self, segments: &[S]) -> Option<&DocumentMapping> {
        segments
            .iter()
            .try_fold(self, |current, segment| current.properties.get(segment.as_ref()))
    }

    fn closest_document_mapping_at<S: AsRef<str>>(&self, segments: &[S]) -> &DocumentMapping {
        let mut current = self;
        for segment in segments {
            match current.properties.get(segment.as_ref()) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Default analyzer in effect at a path: the deepest non-empty one walking
    /// from this mapping toward the leaf.
    pub fn default_analyzer_name(&self, path: &[String]) -> Option<&str> {
        let mut name = self.default_analyzer.as_deref();
        let mut current = self;
        for segment in path {
            match current.properties.get(segment) {
                Some(next) => {
                    current = next;
                    if let Some(analyzer) = current.default_analyzer.as_deref() {
                        name = Some(analyzer);
                    }
                }
                None => break,
            }
        }
        name
    }

    /// Find the field mapping producing the field at a dotted path.
    ///
    /// Unnamed field mappings live at the path itself; named ones live on a
    /// sibling property under the same parent.
    pub fn field_mapping_for_path(&self, path: &str) -> Option<&FieldMapping> {
        if let Some(mapping) = self.document_mapping_for_path(path) {
            if let Some(field) = mapping.fields.iter().find(|f| f.name.is_none()) {
                return Some(field);
            }
        }

        let segments = decode_path(path);
        let (last, parent_path) = segments.split_last()?;
        let parent = self.document_mapping_at(parent_path)?;
        parent
            .properties
            .values()
            .flat_map(|property| property.fields.iter())
            .find(|f| f.name.as_deref() == Some(last.as_str()))
    }

    /// Check every analyzer, datetime parser and field type named in this
    /// tree. Returns the first problem found.
    pub fn validate(&self, registry: &Registry) -> Result<()> {
        if let Some(name) = &self.default_analyzer {
            if registry.analyzer_named(name).is_none() {
                return Err(GlaiveError::mapping(format!("analyzer named '{name}' not found")));
            }
        }
        for property in self.properties.values() {
            property.validate(registry)?;
        }
        for field in &self.fields {
            if let Some(name) = &field.analyzer {
                if registry.analyzer_named(name).is_none() {
                    return Err(GlaiveError::mapping(format!(
                        "analyzer named '{name}' not found"
                    )));
                }
            }
            if let Some(name) = &field.date_format {
                if registry.datetime_parser_named(name).is_none() {
                    return Err(GlaiveError::mapping(format!(
                        "datetime parser named '{name}' not found"
                    )));
                }
            }
            if let FieldType::Unknown(name) = &field.field_type {
                return Err(GlaiveError::mapping(format!("unknown field type: '{name}'")));
            }
        }
        Ok(())
    }

    /// Walk the children of an object or list value.
    pub(crate) fn walk_document(
        &self,
        value: &Value,
        path: &mut Vec<String>,
        indexes: &mut Vec<u64>,
        ctx: &mut WalkContext<'_>,
    ) {
        match value {
            Value::Object(entries) => {
                for (key, child) in entries {
                    path.push(key.clone());
                    self.process_property(child, path, indexes, ctx);
                    path.pop();
                }
            }
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    indexes.push(i as u64);
                    self.process_property(item, path, indexes, ctx);
                    indexes.pop();
                }
            }
            _ => {}
        }
    }

    fn process_property(
        &self,
        value: &Value,
        path: &mut Vec<String>,
        indexes: &mut Vec<u64>,
        ctx: &mut WalkContext<'_>,
    ) {
        let sub_mapping = self.document_mapping_at(path);
        if sub_mapping.is_some_and(|m| !m.enabled) {
            return;
        }
        let explicit = sub_mapping.filter(|m| !m.fields.is_empty());
        let dynamic = self.closest_document_mapping_at(path).dynamic;

        match value {
            Value::String(s) => {
                if let Some(mapping) = explicit {
                    for field in &mapping.fields {
                        field.process_string(s, path, indexes, ctx);
                    }
                } else if dynamic {
                    let mapping = ctx.mapping;
                    let parsed = mapping
                        .datetime_parser_named(&mapping.default_datetime_parser)
                        .and_then(|parser| parser.parse_datetime(s).ok());
                    match parsed {
                        Some(time) => FieldMapping::datetime().process_time(time, path, indexes, ctx),
                        None => FieldMapping::text().process_string(s, path, indexes, ctx),
                    }
                }
            }
            Value::Number(n) => {
                if let Some(mapping) = explicit {
                    for field in &mapping.fields {
                        field.process_number(*n, path, indexes, ctx);
                    }
                } else if dynamic {
                    FieldMapping::number().process_number(*n, path, indexes, ctx);
                }
            }
            Value::Time(t) => {
                if let Some(mapping) = explicit {
                    for field in &mapping.fields {
                        field.process_time(*t, path, indexes, ctx);
                    }
                } else if dynamic {
                    FieldMapping::datetime().process_time(*t, path, indexes, ctx);
                }
            }
            Value::Object(_) | Value::List(_) => self.walk_document(value, path, indexes, ctx),
            Value::Null | Value::Bool(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocumentMapping {
        let mut author = DocumentMapping::new().with_default_analyzer("simple");
        author.add_field_at("name", FieldMapping::text().with_analyzer("keyword"));

        let mut root = DocumentMapping::new().with_default_analyzer("standard");
        root.add_sub_document("author", author);
        root.add_sub_document("internal", DocumentMapping::disabled());
        root.add_field_at("body", FieldMapping::text().with_name("content"));
        root
    }

    #[test]
    fn test_path_lookup() {
        let mapping = sample();
        assert!(mapping.document_mapping_for_path("author.name").is_some());
        assert!(mapping.document_mapping_for_path("author.email").is_none());
        assert!(std::ptr::eq(
            mapping.closest_document_mapping("author.email"),
            mapping.document_mapping_for_path("author").unwrap()
        ));
    }

    #[test]
    fn test_empty_key_is_not_the_root() {
        let mut root = DocumentMapping::new_static();
        root.add_field_at("title", FieldMapping::text());
        assert!(root.document_mapping_for_path("").is_none());
        assert!(std::ptr::eq(root.closest_document_mapping(""), &root));

        root.add_field_at("", FieldMapping::number());
        let blank = root.document_mapping_for_path("").unwrap();
        assert!(!std::ptr::eq(blank, &root));
        assert_eq!(blank.fields[0].field_type, FieldType::Number);
        assert!(root.document_mapping_for_path(".title").is_none());
    }

    #[test]
    fn test_default_analyzer_is_deepest() {
        let mapping = sample();
        let path = vec!["author".to_string(), "bio".to_string()];
        assert_eq!(mapping.default_analyzer_name(&path), Some("simple"));
        assert_eq!(mapping.default_analyzer_name(&["title".to_string()]), Some("standard"));
    }

    #[test]
    fn test_field_mapping_for_named_field() {
        let mapping = sample();
        let fm = mapping.field_mapping_for_path("author.name").unwrap();
        assert_eq!(fm.analyzer.as_deref(), Some("keyword"));
        assert!(mapping.field_mapping_for_path("content").is_some());
        assert!(mapping.field_mapping_for_path("body").is_none());
    }

    #[test]
    fn test_validate_reports_unknown_names() {
        let registry = Registry::default();
        assert!(sample().validate(&registry).is_ok());

        let mut bad = sample();
        bad.add_field_at("x", FieldMapping::text().with_analyzer("klingon"));
        let err = bad.validate(&registry).unwrap_err();
        assert!(err.to_string().contains("klingon"));

        let mut bad_type = DocumentMapping::new();
        bad_type.add_field(FieldMapping {
            field_type: FieldType::Unknown("geo".to_string()),
            ..FieldMapping::text()
        });
        let err = bad_type.validate(&registry).unwrap_err();
        assert!(err.to_string().contains("unknown field type"));
    }
}

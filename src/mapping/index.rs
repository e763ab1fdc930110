//! Index mapping: the root of the mapping tree.
//!
//! # Examples
//!
//! ```
//! use glaive::document::Value;
//! use glaive::mapping::{DocumentMapping, FieldMapping, IndexMapping};
//!
//! let mut person = DocumentMapping::new();
//! person.add_field_at("name", FieldMapping::text().with_analyzer("keyword"));
//!
//! let mut mapping = IndexMapping::new();
//! mapping.add_document_mapping("person", person);
//! mapping.validate().unwrap();
//!
//! let value = Value::object([("_type", "person"), ("name", "Marty McFly")]);
//! let doc = mapping.map_document("a", &value).unwrap();
//! assert_eq!(doc.field("name").and_then(|f| f.as_text()), Some("Marty McFly"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, DateTimeParser};
use crate::document::{Document, Value};
use crate::error::{GlaiveError, Result};
use crate::mapping::document::DocumentMapping;
use crate::mapping::field::FieldMapping;
use crate::mapping::path::decode_path;
use crate::mapping::{
    DEFAULT_ANALYZER, DEFAULT_BYTE_ARRAY_CONVERTER, DEFAULT_DATETIME_PARSER, DEFAULT_FIELD,
    DEFAULT_TYPE, DEFAULT_TYPE_FIELD,
};
use crate::registry::Registry;

/// Decides the type of a value that carries no type field.
pub trait Classifier: Send + Sync + fmt::Debug {
    fn classify(&self, value: &Value) -> Option<String>;
}

fn default_type_field() -> String {
    DEFAULT_TYPE_FIELD.to_string()
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

fn default_analyzer() -> String {
    DEFAULT_ANALYZER.to_string()
}

fn default_datetime_parser() -> String {
    DEFAULT_DATETIME_PARSER.to_string()
}

fn default_field() -> String {
    DEFAULT_FIELD.to_string()
}

fn default_byte_array_converter() -> String {
    DEFAULT_BYTE_ARRAY_CONVERTER.to_string()
}

/// Root mapping: per-type document mappings plus index-wide defaults.
#[derive(Clone, Serialize, Deserialize)]
pub struct IndexMapping {
    #[serde(default, rename = "types", skip_serializing_if = "BTreeMap::is_empty")]
    pub type_mappings: BTreeMap<String, DocumentMapping>,

    #[serde(default)]
    pub default_mapping: DocumentMapping,

    #[serde(default = "default_type_field")]
    pub type_field: String,

    #[serde(default = "default_type")]
    pub default_type: String,

    #[serde(default = "default_analyzer")]
    pub default_analyzer: String,

    #[serde(default = "default_datetime_parser")]
    pub default_datetime_parser: String,

    #[serde(default = "default_field")]
    pub default_field: String,

    #[serde(default = "default_byte_array_converter")]
    pub byte_array_converter: String,

    #[serde(skip)]
    registry: Arc<Registry>,

    #[serde(skip)]
    classifier: Option<Arc<dyn Classifier>>,
}

impl Default for IndexMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexMapping {
    pub fn new() -> Self {
        IndexMapping {
            type_mappings: BTreeMap::new(),
            default_mapping: DocumentMapping::new(),
            type_field: default_type_field(),
            default_type: default_type(),
            default_analyzer: default_analyzer(),
            default_datetime_parser: default_datetime_parser(),
            default_field: default_field(),
            byte_array_converter: default_byte_array_converter(),
            registry: Arc::new(Registry::default()),
            classifier: None,
        }
    }

    /// Resolve component names against this registry from now on.
    pub fn set_registry(&mut self, registry: Arc<Registry>) {
        self.registry = registry;
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Consult a classifier for values without a type field.
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn add_document_mapping<S: Into<String>>(&mut self, type_name: S, mapping: DocumentMapping) {
        self.type_mappings.insert(type_name.into(), mapping);
    }

    /// Mapping used for a type, falling back to the default mapping.
    pub fn mapping_for_type(&self, type_name: &str) -> &DocumentMapping {
        self.type_mappings
            .get(type_name)
            .unwrap_or(&self.default_mapping)
    }

    /// Type name of a value: its type field, then the classifier, then the
    /// default type.
    pub fn determine_type(&self, value: &Value) -> String {
        let path = decode_path(&self.type_field);
        if let Some(type_name) = value.lookup_path(&path).and_then(Value::as_str) {
            return type_name.to_string();
        }
        if let Some(type_name) = self.classifier.as_ref().and_then(|c| c.classify(value)) {
            return type_name;
        }
        self.default_type.clone()
    }

    /// Check the defaults and every document mapping. Returns the first
    /// problem found.
    pub fn validate(&self) -> Result<()> {
        if self.registry.analyzer_named(&self.default_analyzer).is_none() {
            return Err(GlaiveError::mapping(format!(
                "analyzer named '{}' not found",
                self.default_analyzer
            )));
        }
        if self
            .registry
            .datetime_parser_named(&self.default_datetime_parser)
            .is_none()
        {
            return Err(GlaiveError::mapping(format!(
                "datetime parser named '{}' not found",
                self.default_datetime_parser
            )));
        }
        self.default_mapping.validate(&self.registry)?;
        for mapping in self.type_mappings.values() {
            mapping.validate(&self.registry)?;
        }
        Ok(())
    }

    /// Walk a value tree and produce the document to index.
    pub fn map_document(&self, id: &str, value: &Value) -> Result<Document> {
        let type_name = self.determine_type(value);
        let doc_mapping = self.mapping_for_type(&type_name);
        let mut ctx = WalkContext {
            mapping: self,
            doc_mapping,
            doc: Document::new(id),
        };
        if doc_mapping.enabled {
            doc_mapping.walk_document(value, &mut Vec::new(), &mut Vec::new(), &mut ctx);
        }
        Ok(ctx.doc)
    }

    /// Convert raw bytes with the configured converter, then map the result.
    pub fn map_bytes(&self, id: &str, bytes: &[u8]) -> Result<Document> {
        let converter = self
            .registry
            .byte_array_converter_named(&self.byte_array_converter)
            .ok_or_else(|| {
                GlaiveError::mapping(format!(
                    "byte array converter named '{}' not found",
                    self.byte_array_converter
                ))
            })?;
        let value = converter(bytes)?;
        self.map_document(id, &value)
    }

    pub fn analyzer_named(&self, name: &str) -> Option<Arc<dyn Analyzer>> {
        self.registry.analyzer_named(name)
    }

    pub fn datetime_parser_named(&self, name: &str) -> Option<Arc<dyn DateTimeParser>> {
        self.registry.datetime_parser_named(name)
    }

    /// Field mapping producing a field path, searching the type mappings first.
    pub fn field_mapping_for_path(&self, path: &str) -> Option<&FieldMapping> {
        self.type_mappings
            .values()
            .find_map(|m| m.field_mapping_for_path(path))
            .or_else(|| self.default_mapping.field_mapping_for_path(path))
    }

    /// Name of the analyzer queries should use for a field path.
    pub fn analyzer_name_for_path(&self, path: &str) -> String {
        if let Some(name) = self
            .field_mapping_for_path(path)
            .and_then(|fm| fm.analyzer.clone())
        {
            return name;
        }

        let segments = decode_path(path);
        self.type_mappings
            .values()
            .chain(std::iter::once(&self.default_mapping))
            .find_map(|m| m.default_analyzer_name(&segments))
            .map(str::to_string)
            .unwrap_or_else(|| self.default_analyzer.clone())
    }

    pub fn analyzer_for_path(&self, path: &str) -> Result<Arc<dyn Analyzer>> {
        let name = self.analyzer_name_for_path(path);
        self.analyzer_named(&name)
            .ok_or_else(|| GlaiveError::analysis(format!("analyzer named '{name}' not found")))
    }

    /// Name of the datetime parser for a field path.
    pub fn datetime_parser_name_for_path(&self, path: &str) -> String {
        self.field_mapping_for_path(path)
            .and_then(|fm| fm.date_format.clone())
            .unwrap_or_else(|| self.default_datetime_parser.clone())
    }

    pub fn datetime_parser_for_path(&self, path: &str) -> Result<Arc<dyn DateTimeParser>> {
        let name = self.datetime_parser_name_for_path(path);
        self.datetime_parser_named(&name).ok_or_else(|| {
            GlaiveError::analysis(format!("datetime parser named '{name}' not found"))
        })
    }
}

impl fmt::Debug for IndexMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexMapping")
            .field("type_mappings", &self.type_mappings)
            .field("default_mapping", &self.default_mapping)
            .field("type_field", &self.type_field)
            .field("default_type", &self.default_type)
            .field("default_analyzer", &self.default_analyzer)
            .field("default_datetime_parser", &self.default_datetime_parser)
            .field("default_field", &self.default_field)
            .field("byte_array_converter", &self.byte_array_converter)
            .field("classifier", &self.classifier)
            .finish()
    }
}

/// State threaded through one mapping walk.
pub(crate) struct WalkContext<'a> {
    pub(crate) mapping: &'a IndexMapping,
    pub(crate) doc_mapping: &'a DocumentMapping,
    pub(crate) doc: Document,
}

impl WalkContext<'_> {
    /// Analyzer for a text field: the field's own, then the deepest default on
    /// the document mapping, then the index default.
    pub(crate) fn analyzer_for_field(
        &self,
        field: &FieldMapping,
        path: &[String],
    ) -> Option<Arc<dyn Analyzer>> {
        let name = field
            .analyzer
            .as_deref()
            .or_else(|| self.doc_mapping.default_analyzer_name(path))
            .unwrap_or(&self.mapping.default_analyzer);
        let analyzer = self.mapping.analyzer_named(name);
        if analyzer.is_none() {
            log::warn!("no analyzer named '{name}', indexing field as a single term");
        }
        analyzer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct PrefixClassifier;

    impl Classifier for PrefixClassifier {
        fn classify(&self, value: &Value) -> Option<String> {
            value.get("sku").map(|_| "product".to_string())
        }
    }

    #[test]
    fn test_determine_type() {
        let mapping = IndexMapping::new().with_classifier(Arc::new(PrefixClassifier));

        let typed = Value::object([("_type", "person")]);
        assert_eq!(mapping.determine_type(&typed), "person");

        let classified = Value::object([("sku", "A-1")]);
        assert_eq!(mapping.determine_type(&classified), "product");

        let plain = Value::object([("name", "x")]);
        assert_eq!(mapping.determine_type(&plain), "_default");
    }

    #[test]
    fn test_json_round_trip_keeps_defaults() {
        let mut mapping = IndexMapping::new();
        let mut person = DocumentMapping::new();
        person.add_field_at("name", FieldMapping::text().with_analyzer("keyword"));
        mapping.add_document_mapping("person", person);

        let json = serde_json::to_string(&mapping).unwrap();
        let decoded: IndexMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.type_mappings, mapping.type_mappings);
        assert_eq!(decoded.default_field, "_all");
        assert!(decoded.validate().is_ok());

        let sparse: IndexMapping = serde_json::from_str("{}").unwrap();
        assert_eq!(sparse.type_field, "_type");
        assert_eq!(sparse.default_analyzer, "standard");
    }

    #[test]
    fn test_validate_unknown_default_analyzer() {
        let mut mapping = IndexMapping::new();
        mapping.default_analyzer = "missing".to_string();
        assert!(matches!(mapping.validate(), Err(GlaiveError::Mapping(_))));
    }

    #[test]
    fn test_analyzer_name_for_path() {
        let mut mapping = IndexMapping::new();
        let mut person = DocumentMapping::new();
        person.add_field_at("name", FieldMapping::text().with_analyzer("keyword"));
        person.add_sub_document("bio", DocumentMapping::new().with_default_analyzer("simple"));
        mapping.add_document_mapping("person", person);

        assert_eq!(mapping.analyzer_name_for_path("name"), "keyword");
        assert_eq!(mapping.analyzer_name_for_path("bio.text"), "simple");
        assert_eq!(mapping.analyzer_name_for_path("other"), "standard");
    }

    #[test]
    fn test_map_bytes() {
        let mapping = IndexMapping::new();
        let doc = mapping.map_bytes("1", br#"{"name": "marty"}"#).unwrap();
        assert_eq!(doc.field("name").and_then(|f| f.as_text()), Some("marty"));
        assert!(mapping.map_bytes("1", b"not json").is_err());
    }
}

//! Mapping engine: turns client value trees into typed documents.
//!
//! An [`IndexMapping`] picks a [`DocumentMapping`] per document type and walks
//! the value tree, emitting [`Field`](crate::document::Field)s according to
//! explicit [`FieldMapping`]s or, where the enclosing mapping is dynamic, by
//! inferring a field type from the value.

pub mod document;
pub mod field;
pub mod index;
pub mod path;

pub use document::DocumentMapping;
pub use field::{FieldMapping, FieldType};
pub use index::{Classifier, IndexMapping};
pub use path::{decode_path, encode_path};

/// Field on a value whose string content names its document type.
pub const DEFAULT_TYPE_FIELD: &str = "_type";

/// Type used when no type can be determined.
pub const DEFAULT_TYPE: &str = "_default";

/// Analyzer used when neither the field nor any enclosing mapping names one.
pub const DEFAULT_ANALYZER: &str = "standard";

/// Parser used for dynamic date detection and date range queries.
pub const DEFAULT_DATETIME_PARSER: &str = "datetime_optional";

/// Field searched by queries that do not name one.
pub const DEFAULT_FIELD: &str = "_all";

/// Converter used by [`IndexMapping::map_bytes`].
pub const DEFAULT_BYTE_ARRAY_CONVERTER: &str = "json";

/// Reserved internal key holding the serialized index mapping.
pub const MAPPING_INTERNAL_KEY: &[u8] = b"_mapping";

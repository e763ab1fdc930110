//! Documents: the flat, typed form of one indexed object.
//!
//! Client data enters as a [`Value`] tree and leaves the mapping engine as a
//! [`Document`] holding an ordered list of typed [`Field`]s.

#[allow(clippy::module_inception)]
pub mod document;
pub mod field;
pub mod value;

pub use document::Document;
pub use field::{AnalyzedField, Field, FieldValue, IndexingOptions, TermFrequency, TermLocation};
pub use value::Value;

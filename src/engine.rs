//! Index engines and the kv stores underneath them.
//!
//! The façade talks to an [`IndexEngine`] for writes and obtains
//! point-in-time [`IndexReader`]s for searches. Engines persist through a
//! [`KvStore`]. Both are chosen by name through the
//! [`Registry`](crate::registry::Registry).

pub mod inverted;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;

use crate::document::{Document, FieldValue, TermLocation};
use crate::error::Result;
use crate::index::batch::Batch;

pub use store::{FileStore, KvStore, MemoryStore, StoreConfig};

/// Engine-internal document number. Increases with every indexed document.
pub type DocNum = u64;

/// One document's entry in a term's postings list.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub doc: DocNum,
    pub frequency: u64,
    /// Length normalization factor for the field in this document.
    pub norm: f32,
    pub locations: Vec<TermLocation>,
}

/// A term in a field dictionary with the number of documents containing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub term: String,
    pub count: u64,
}

/// A raw row of index content, for debugging.
#[derive(Debug, Clone, PartialEq)]
pub enum DumpRow {
    Field {
        index: usize,
        name: String,
    },
    Term {
        field: String,
        term: String,
        doc_id: String,
        frequency: u64,
    },
    Stored {
        doc_id: String,
        field: String,
        array_positions: Vec<u64>,
        value: FieldValue,
    },
    BackIndex {
        doc_id: String,
        terms: BTreeMap<String, Vec<String>>,
    },
    Internal {
        key: Vec<u8>,
        value: Vec<u8>,
    },
}

impl fmt::Display for DumpRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpRow::Field { index, name } => write!(f, "Field: {index} Name: {name}"),
            DumpRow::Term {
                field,
                term,
                doc_id,
                frequency,
            } => write!(
                f,
                "Term: `{term}` Field: {field} DocId: `{doc_id}` Frequency: {frequency}"
            ),
            DumpRow::Stored {
                doc_id,
                field,
                array_positions,
                value,
            } => write!(
                f,
                "Document: `{doc_id}` Field: {field} ArrayPositions: {array_positions:?} Type: {} Value: {value}",
                value.type_name()
            ),
            DumpRow::BackIndex { doc_id, terms } => {
                write!(f, "Back Index DocId: `{doc_id}` Terms: {terms:?}")
            }
            DumpRow::Internal { key, value } => write!(
                f,
                "Internal Store: Key: {} Val: {}",
                String::from_utf8_lossy(key),
                String::from_utf8_lossy(value)
            ),
        }
    }
}

/// Write side of an index implementation.
pub trait IndexEngine: Send + Sync + fmt::Debug {
    /// Load persisted state. Called once before any other operation.
    fn open(&self) -> Result<()>;

    /// Release the underlying store.
    fn close(&self) -> Result<()>;

    /// Index a document, replacing any document with the same id.
    fn update(&self, doc: &Document) -> Result<()>;

    /// Remove a document. Unknown ids are not an error.
    fn delete(&self, id: &str) -> Result<()>;

    /// Apply every operation in a batch as one unit.
    fn batch(&self, batch: &Batch) -> Result<()>;

    fn set_internal(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn delete_internal(&self, key: &[u8]) -> Result<()>;

    /// Open a point-in-time reader. Later writes are not visible to it.
    fn reader(&self) -> Result<Box<dyn IndexReader>>;

    /// Engine-specific statistics.
    fn stats(&self) -> serde_json::Value;
}

/// Read side of an index implementation.
pub trait IndexReader: Send + Sync + fmt::Debug {
    fn doc_count(&self) -> u64;

    /// Stored fields of a document.
    fn document(&self, id: &str) -> Result<Option<Document>>;

    /// Names of every field ever indexed.
    fn fields(&self) -> Result<Vec<String>>;

    fn field_dict(&self, field: &str) -> Result<Vec<DictEntry>> {
        self.field_dict_range(field, None, None)
    }

    /// Terms between `start` and `end`, both inclusive.
    fn field_dict_range(
        &self,
        field: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<DictEntry>>;

    fn field_dict_prefix(&self, field: &str, prefix: &str) -> Result<Vec<DictEntry>>;

    /// Postings for a term, ordered by document number.
    fn term_postings(&self, field: &str, term: &str) -> Result<Vec<Posting>>;

    /// Every live document number, ascending.
    fn doc_numbers(&self) -> Vec<DocNum>;

    fn doc_number(&self, id: &str) -> Option<DocNum>;

    fn external_id(&self, doc: DocNum) -> Result<String>;

    /// Indexed terms of a document, keyed by field.
    fn document_field_terms(&self, doc: DocNum) -> Result<BTreeMap<String, Vec<String>>>;

    fn get_internal(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn dump_all(&self) -> Result<Vec<DumpRow>>;

    fn dump_doc(&self, id: &str) -> Result<Vec<DumpRow>>;

    fn dump_fields(&self) -> Result<Vec<DumpRow>>;

    fn close(&mut self) -> Result<()>;
}

//! Staged index operations applied as one unit.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::document::{Document, Value};
use crate::error::{GlaiveError, Result};
use crate::mapping::IndexMapping;

/// Pending index, delete and internal-key operations.
///
/// Documents are mapped when staged, so a batch is tied to the mapping of the
/// index that created it. Staging the same id or key twice keeps the last
/// operation. A batch is not meant to be shared between threads while it is
/// being filled; call [`Batch::reset`] to reuse it after it was applied.
///
/// # Examples
///
/// ```
/// use glaive::index::Index;
/// use glaive::mapping::IndexMapping;
///
/// let index = Index::new_memory_only(IndexMapping::new()).unwrap();
/// let mut batch = index.new_batch();
/// batch.index("a", &serde_json::json!({"title": "first"}).into()).unwrap();
/// batch.delete("b");
/// assert_eq!(batch.size(), 2);
///
/// index.batch(&batch).unwrap();
/// batch.reset();
/// assert_eq!(batch.size(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Batch {
    mapping: Arc<IndexMapping>,
    index_ops: BTreeMap<String, Option<Document>>,
    internal_ops: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl Batch {
    pub(crate) fn new(mapping: Arc<IndexMapping>) -> Self {
        Batch {
            mapping,
            index_ops: BTreeMap::new(),
            internal_ops: BTreeMap::new(),
        }
    }

    /// Map `value` and stage it under `id`.
    pub fn index(&mut self, id: &str, value: &Value) -> Result<()> {
        if id.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        let doc = self.mapping.map_document(id, value)?;
        self.index_ops.insert(id.to_string(), Some(doc));
        Ok(())
    }

    /// Stage the deletion of `id`. Empty ids are ignored.
    pub fn delete(&mut self, id: &str) {
        if !id.is_empty() {
            self.index_ops.insert(id.to_string(), None);
        }
    }

    /// Stage an internal key write. Empty keys are rejected.
    pub fn set_internal(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        self.internal_ops.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    pub fn delete_internal(&mut self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        self.internal_ops.insert(key.to_vec(), None);
        Ok(())
    }

    /// Number of staged operations.
    pub fn size(&self) -> usize {
        self.index_ops.len() + self.internal_ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Drop every staged operation.
    pub fn reset(&mut self) {
        self.index_ops.clear();
        self.internal_ops.clear();
    }

    /// Staged document operations; `None` marks a deletion.
    pub fn index_ops(&self) -> impl Iterator<Item = (&str, Option<&Document>)> {
        self.index_ops
            .iter()
            .map(|(id, doc)| (id.as_str(), doc.as_ref()))
    }

    /// Staged internal-key operations; `None` marks a deletion.
    pub fn internal_ops(&self) -> impl Iterator<Item = (&[u8], Option<&[u8]>)> {
        self.internal_ops
            .iter()
            .map(|(key, value)| (key.as_slice(), value.as_deref()))
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch ({} ops)", self.size())?;
        for (id, doc) in &self.index_ops {
            match doc {
                Some(doc) => writeln!(f, "\tINDEX ({id}) {doc}")?,
                None => writeln!(f, "\tDELETE ({id})")?,
            }
        }
        for (key, value) in &self.internal_ops {
            let key = String::from_utf8_lossy(key);
            match value {
                Some(value) => {
                    writeln!(f, "\tSET INTERNAL ({key}) {}", String::from_utf8_lossy(value))?
                }
                None => writeln!(f, "\tDELETE INTERNAL ({key})")?,
            }
        }
        Ok(())
    }
}

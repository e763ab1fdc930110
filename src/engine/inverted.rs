//! The `inverted` index type: an in-memory inverted index persisted as a
//! snapshot through a [`KvStore`].
//!
//! Writers build a new segment version under the write lock and swap it in;
//! readers clone the current `Arc<Segment>` and never observe later writes.

mod reader;
mod segment;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::json;

use crate::document::Document;
use crate::engine::{IndexEngine, IndexReader, KvStore};
use crate::error::{GlaiveError, Result};
use crate::index::batch::Batch;

pub use reader::InvertedIndexReader;
use segment::{AnalyzedDocument, Segment};

#[derive(Debug, Default)]
struct EngineStats {
    updates: AtomicU64,
    deletes: AtomicU64,
    batches: AtomicU64,
    persists: AtomicU64,
    analysis_time_ns: AtomicU64,
}

#[derive(Debug)]
pub struct InvertedIndex {
    store: Arc<dyn KvStore>,
    segment: RwLock<Arc<Segment>>,
    opened: AtomicBool,
    stats: EngineStats,
}

impl InvertedIndex {
    pub const NAME: &'static str = "inverted";

    pub fn new(store: Arc<dyn KvStore>) -> Self {
        InvertedIndex {
            store,
            segment: RwLock::new(Arc::new(Segment::default())),
            opened: AtomicBool::new(false),
            stats: EngineStats::default(),
        }
    }

    /// Index-type constructor registered under [`InvertedIndex::NAME`].
    pub fn create(store: Arc<dyn KvStore>) -> Result<Arc<dyn IndexEngine>> {
        Ok(Arc::new(Self::new(store)))
    }

    fn check_open(&self) -> Result<()> {
        if self.opened.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(GlaiveError::IndexClosed)
        }
    }

    fn analyze(&self, doc: &Document) -> Result<AnalyzedDocument> {
        let start = std::time::Instant::now();
        let analyzed = AnalyzedDocument::analyze(doc)?;
        self.stats
            .analysis_time_ns
            .fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
        Ok(analyzed)
    }

    /// Apply a change to the segment. Durable stores get a private copy that is
    /// published only after it persisted.
    fn apply<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Segment),
    {
        let mut current = self.segment.write();
        if !self.store.is_durable() {
            change(Arc::make_mut(&mut *current));
            return Ok(());
        }

        let mut next = Segment::clone(&**current);
        change(&mut next);
        let bytes = bincode::serialize(&next)
            .map_err(|e| GlaiveError::serialization(format!("failed to encode segment: {e}")))?;
        self.store.persist(&bytes)?;
        self.stats.persists.fetch_add(1, Ordering::Relaxed);
        *current = Arc::new(next);
        Ok(())
    }
}

impl IndexEngine for InvertedIndex {
    fn open(&self) -> Result<()> {
        if let Some(bytes) = self.store.load()? {
            let segment: Segment = bincode::deserialize(&bytes)
                .map_err(|e| GlaiveError::serialization(format!("failed to decode segment: {e}")))?;
            log::debug!(
                "loaded {} documents from {} store",
                segment.doc_count(),
                self.store.name()
            );
            *self.segment.write() = Arc::new(segment);
        }
        self.opened.store(true, Ordering::Release);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.opened.store(false, Ordering::Release);
        self.store.close()
    }

    fn update(&self, doc: &Document) -> Result<()> {
        self.check_open()?;
        let analyzed = self.analyze(doc)?;
        self.apply(|segment| segment.insert(analyzed))?;
        self.stats.updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.check_open()?;
        self.apply(|segment| {
            segment.remove(id);
        })?;
        self.stats.deletes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn batch(&self, batch: &Batch) -> Result<()> {
        self.check_open()?;

        let mut analyzed = Vec::with_capacity(batch.size());
        for (id, doc) in batch.index_ops() {
            match doc {
                Some(doc) => analyzed.push((id.to_string(), Some(self.analyze(doc)?))),
                None => analyzed.push((id.to_string(), None)),
            }
        }

        self.apply(|segment| {
            for (id, doc) in analyzed {
                match doc {
                    Some(doc) => segment.insert(doc),
                    None => {
                        segment.remove(&id);
                    }
                }
            }
            for (key, value) in batch.internal_ops() {
                match value {
                    Some(value) => {
                        segment.internal.insert(key.to_vec(), value.to_vec());
                    }
                    None => {
                        segment.internal.remove(key);
                    }
                }
            }
        })?;
        self.stats.batches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn set_internal(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_open()?;
        self.apply(|segment| {
            segment.internal.insert(key.to_vec(), value.to_vec());
        })
    }

    fn delete_internal(&self, key: &[u8]) -> Result<()> {
        self.check_open()?;
        self.apply(|segment| {
            segment.internal.remove(key);
        })
    }

    fn reader(&self) -> Result<Box<dyn IndexReader>> {
        self.check_open()?;
        let segment = Arc::clone(&*self.segment.read());
        Ok(Box::new(InvertedIndexReader::new(segment)))
    }

    fn stats(&self) -> serde_json::Value {
        let segment = self.segment.read();
        json!({
            "doc_count": segment.doc_count(),
            "field_count": segment.fields.len(),
            "updates": self.stats.updates.load(Ordering::Relaxed),
            "deletes": self.stats.deletes.load(Ordering::Relaxed),
            "batches": self.stats.batches.load(Ordering::Relaxed),
            "persists": self.stats.persists.load(Ordering::Relaxed),
            "analysis_time_ns": self.stats.analysis_time_ns.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Field;
    use crate::engine::store::{FileStore, MemoryStore};
    use tempfile::TempDir;

    fn open_engine(store: Arc<dyn KvStore>) -> InvertedIndex {
        let engine = InvertedIndex::new(store);
        engine.open().unwrap();
        engine
    }

    #[test]
    fn test_reader_is_point_in_time() {
        let engine = open_engine(Arc::new(MemoryStore::new()));
        engine
            .update(&Document::new("a").with_field(Field::text("k", vec![], "v")))
            .unwrap();

        let mut reader = engine.reader().unwrap();
        engine.delete("a").unwrap();

        assert_eq!(reader.doc_count(), 1);
        assert_eq!(engine.reader().unwrap().doc_count(), 0);
        reader.close().unwrap();
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn KvStore> = Arc::new(FileStore::open(dir.path(), true, false).unwrap());
        let engine = open_engine(store);
        engine
            .update(&Document::new("a").with_field(Field::numeric("n", vec![], 3.0)))
            .unwrap();
        engine.set_internal(b"k", b"v").unwrap();
        engine.close().unwrap();

        let store: Arc<dyn KvStore> = Arc::new(FileStore::open(dir.path(), false, false).unwrap());
        let engine = open_engine(store);
        let reader = engine.reader().unwrap();
        assert_eq!(reader.doc_count(), 1);
        assert_eq!(reader.get_internal(b"k").unwrap(), Some(b"v".to_vec()));
        let doc = reader.document("a").unwrap().unwrap();
        assert_eq!(doc.field("n").map(|f| f.value().clone()), Some(crate::document::FieldValue::Numeric(3.0)));
    }

    #[test]
    fn test_closed_engine_rejects_writes() {
        let engine = open_engine(Arc::new(MemoryStore::new()));
        engine.close().unwrap();
        assert!(matches!(
            engine.update(&Document::new("a")),
            Err(GlaiveError::IndexClosed)
        ));
    }
}

//! Integration tests for the index lifecycle, batches and concurrency.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use glaive::analysis::PipelineAnalyzer;
use glaive::config::Config;
use glaive::engine::inverted::InvertedIndex;
use glaive::engine::{IndexEngine, IndexReader, KvStore, StoreConfig};
use glaive::error::{GlaiveError, Result};
use glaive::index::{Batch, Index};
use glaive::mapping::{DocumentMapping, FieldMapping, IndexMapping};
use glaive::query::{MatchAllQuery, MatchQuery};
use glaive::registry::Registry;
use glaive::search::SearchRequest;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_empty_id_is_rejected_everywhere() -> Result<()> {
    let index = Index::new_memory_only(IndexMapping::new())?;
    let value = json!({"title": "x"}).into();

    assert!(matches!(index.index("", &value), Err(GlaiveError::EmptyId)));
    assert!(matches!(index.delete(""), Err(GlaiveError::EmptyId)));
    assert!(matches!(index.document(""), Err(GlaiveError::EmptyId)));
    assert!(matches!(index.dump_doc(""), Err(GlaiveError::EmptyId)));

    let mut batch = index.new_batch();
    assert!(matches!(batch.index("", &value), Err(GlaiveError::EmptyId)));
    assert_eq!(batch.size(), 0);

    assert_eq!(index.doc_count()?, 0);
    Ok(())
}

#[test]
fn test_index_update_delete() -> Result<()> {
    let index = Index::new_memory_only(IndexMapping::new())?;
    index.index("a", &json!({"title": "first version"}).into())?;
    index.index("a", &json!({"title": "second version"}).into())?;
    assert_eq!(index.doc_count()?, 1);

    let doc = index.document("a")?.expect("document a");
    assert_eq!(doc.field("title").and_then(|f| f.as_text()), Some("second version"));

    index.delete("a")?;
    index.delete("never-existed")?;
    assert_eq!(index.doc_count()?, 0);
    assert!(index.document("a")?.is_none());
    Ok(())
}

#[test]
fn test_batch_applies_and_resets() -> Result<()> {
    let index = Index::new_memory_only(IndexMapping::new())?;
    index.index("old", &json!({"title": "stale"}).into())?;

    let mut batch: Batch = index.new_batch();
    batch.index("a", &json!({"title": "alpha"}).into())?;
    batch.index("b", &json!({"title": "beta"}).into())?;
    batch.delete("old");
    batch.set_internal(b"checkpoint", b"42")?;
    assert!(batch.set_internal(b"", b"ignored").is_err());
    assert_eq!(batch.size(), 4);

    index.batch(&batch)?;
    assert_eq!(index.doc_count()?, 2);
    assert!(index.document("old")?.is_none());
    assert_eq!(index.get_internal(b"checkpoint")?, Some(b"42".to_vec()));

    batch.reset();
    assert_eq!(batch.size(), 0);
    batch.delete("a");
    index.batch(&batch)?;
    assert_eq!(index.doc_count()?, 1);
    Ok(())
}

#[test]
fn test_file_index_reopens() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("books");

    let mut mapping = IndexMapping::new();
    let mut book = DocumentMapping::new();
    book.add_field_at("isbn", FieldMapping::text().with_analyzer("keyword"));
    mapping.add_document_mapping("book", book);

    {
        let index = Index::new(&path, mapping)?;
        index.index("1", &json!({"_type": "book", "isbn": "978-0 13", "title": "Rust"}).into())?;
        index.close()?;
    }

    assert!(matches!(
        Index::new(&path, IndexMapping::new()),
        Err(GlaiveError::IndexExists(_))
    ));

    let (index, validation) = Index::open(&path)?;
    assert!(validation.is_none());
    assert_eq!(index.doc_count()?, 1);
    assert!(index.mapping().type_mappings.contains_key("book"));

    let request = SearchRequest::new(MatchQuery::new("978-0 13").with_field("isbn").into());
    assert_eq!(index.search(&request)?.total, 1);
    Ok(())
}

#[test]
fn test_open_missing_index() {
    let dir = TempDir::new().expect("tempdir");
    assert!(matches!(
        Index::open(dir.path().join("nope")),
        Err(GlaiveError::IndexNotFound(_))
    ));
    assert!(matches!(
        Index::open(dir.path()),
        Err(GlaiveError::IndexMetaMissing(_))
    ));
}

#[test]
fn test_invalid_mapping_fails_create() {
    let mut mapping = IndexMapping::new();
    mapping
        .default_mapping
        .add_field_at("title", FieldMapping::text().with_analyzer("no-such-analyzer"));
    assert!(matches!(
        Index::new_memory_only(mapping),
        Err(GlaiveError::Mapping(_) | GlaiveError::Analysis(_))
    ));
}

#[test]
fn test_open_with_invalid_mapping_is_partial_success() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("custom");

    let mut registry = Registry::default();
    registry.register_analyzer("shouting", Arc::new(PipelineAnalyzer::whitespace()));
    let config = Config::default().with_registry(Arc::new(registry));

    let mut mapping = IndexMapping::new();
    mapping
        .default_mapping
        .add_field_at("title", FieldMapping::text().with_analyzer("shouting"));
    {
        let index = Index::new_using(
            &path,
            mapping,
            InvertedIndex::NAME,
            "file",
            StoreConfig::new(),
            config,
        )?;
        index.index("1", &json!({"title": "LOUD NOISES"}).into())?;
    }

    let (index, validation) = Index::open(&path)?;
    assert!(validation.is_some());
    assert!(index.is_open());
    assert_eq!(index.doc_count()?, 1);
    Ok(())
}

#[test]
fn test_closed_index_rejects_operations() -> Result<()> {
    let index = Index::new_memory_only(IndexMapping::new())?;
    index.close()?;

    assert!(matches!(
        index.index("a", &json!({}).into()),
        Err(GlaiveError::IndexClosed)
    ));
    assert!(matches!(index.delete("a"), Err(GlaiveError::IndexClosed)));
    assert!(matches!(
        index.batch(&index.new_batch()),
        Err(GlaiveError::IndexClosed)
    ));
    assert!(matches!(index.fields(), Err(GlaiveError::IndexClosed)));
    assert!(matches!(index.field_dict("a"), Err(GlaiveError::IndexClosed)));
    assert!(matches!(index.advanced(), Err(GlaiveError::IndexClosed)));
    Ok(())
}

#[test]
fn test_field_dict_and_dumps() -> Result<()> {
    let index = Index::new_memory_only(IndexMapping::new())?;
    index.index("1", &json!({"tags": ["apple", "banana", "cherry"]}).into())?;
    index.index("2", &json!({"tags": ["banana"]}).into())?;

    let dict = index.field_dict("tags")?;
    let entries: Vec<(String, u64)> = dict.map(|e| (e.term, e.count)).collect();
    assert_eq!(
        entries,
        vec![
            ("apple".to_string(), 1),
            ("banana".to_string(), 2),
            ("cherry".to_string(), 1)
        ]
    );

    let dict = index.field_dict_range("tags", Some("b"), Some("c"))?;
    let terms: Vec<String> = dict.map(|e| e.term).collect();
    assert_eq!(terms, vec!["banana"]);

    let dict = index.field_dict_prefix("tags", "ch")?;
    let terms: Vec<String> = dict.map(|e| e.term).collect();
    assert_eq!(terms, vec!["cherry"]);

    assert!(index.fields()?.contains(&"tags".to_string()));
    assert!(!index.dump_doc("2")?.is_empty());
    assert!(index.dump_all()?.len() > index.dump_doc("2")?.len());
    assert!(!index.dump_fields()?.is_empty());
    Ok(())
}

#[test]
fn test_field_dict_holds_close() -> Result<()> {
    let index = Index::new_memory_only(IndexMapping::new())?;
    index.index("1", &json!({"tags": ["a", "b"]}).into())?;

    let closed = AtomicBool::new(false);
    let mut dict = index.field_dict("tags")?;

    thread::scope(|s| {
        let closer = s.spawn(|| {
            let result = index.close();
            closed.store(true, Ordering::SeqCst);
            result
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!closed.load(Ordering::SeqCst));
        assert_eq!(dict.next().map(|e| e.term), Some("a".to_string()));

        dict.close().expect("close dictionary");
        closer.join().expect("closer thread").expect("close index");
    });

    assert!(closed.load(Ordering::SeqCst));
    assert!(!index.is_open());
    Ok(())
}

static READERS_ENTERED: AtomicUsize = AtomicUsize::new(0);

/// An inverted index whose readers take a while to open.
#[derive(Debug)]
struct SlowIndex {
    inner: InvertedIndex,
}

impl SlowIndex {
    const NAME: &'static str = "slow";

    fn create(store: Arc<dyn KvStore>) -> Result<Arc<dyn IndexEngine>> {
        Ok(Arc::new(SlowIndex {
            inner: InvertedIndex::new(store),
        }))
    }
}

impl IndexEngine for SlowIndex {
    fn open(&self) -> Result<()> {
        self.inner.open()
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }

    fn update(&self, doc: &glaive::document::Document) -> Result<()> {
        self.inner.update(doc)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id)
    }

    fn batch(&self, batch: &Batch) -> Result<()> {
        self.inner.batch(batch)
    }

    fn set_internal(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.set_internal(key, value)
    }

    fn delete_internal(&self, key: &[u8]) -> Result<()> {
        self.inner.delete_internal(key)
    }

    fn reader(&self) -> Result<Box<dyn IndexReader>> {
        READERS_ENTERED.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        self.inner.reader()
    }

    fn stats(&self) -> serde_json::Value {
        self.inner.stats()
    }
}

#[test]
fn test_close_waits_for_in_flight_searches() -> Result<()> {
    let mut registry = Registry::default();
    registry.register_index_type(SlowIndex::NAME, SlowIndex::create);
    let config = Config::default().with_registry(Arc::new(registry));

    let index = Index::new_using(
        "",
        IndexMapping::new(),
        SlowIndex::NAME,
        "mem",
        StoreConfig::new(),
        config,
    )?;
    index.index("1", &json!({"title": "one"}).into())?;
    index.index("2", &json!({"title": "two"}).into())?;

    const SEARCHES: usize = 4;
    READERS_ENTERED.store(0, Ordering::SeqCst);

    thread::scope(|s| {
        let searches: Vec<_> = (0..SEARCHES)
            .map(|_| {
                s.spawn(|| index.search(&SearchRequest::new(MatchAllQuery::new().into())))
            })
            .collect();

        let closer = s.spawn(|| {
            while READERS_ENTERED.load(Ordering::SeqCst) < SEARCHES {
                thread::yield_now();
            }
            index.close()
        });

        for search in searches {
            let result = search.join().expect("search thread").expect("search");
            assert_eq!(result.total, 2);
        }
        closer.join().expect("closer thread").expect("close");
    });

    assert!(matches!(
        index.search(&SearchRequest::new(MatchAllQuery::new().into())),
        Err(GlaiveError::IndexClosed)
    ));
    Ok(())
}

#[test]
fn test_concurrent_writers() -> Result<()> {
    let index = Index::new_memory_only(IndexMapping::new())?;
    thread::scope(|s| {
        for t in 0..4 {
            let index = &index;
            s.spawn(move || {
                for i in 0..25 {
                    let id = format!("{t}-{i}");
                    index
                        .index(&id, &json!({"n": i}).into())
                        .expect("index document");
                }
            });
        }
    });
    assert_eq!(index.doc_count()?, 100);
    Ok(())
}

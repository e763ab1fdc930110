//! The index façade.
//!
//! An [`Index`] ties a validated [`IndexMapping`] to an index engine and its
//! kv store. Every data operation takes the index's read lock and fails with
//! [`GlaiveError::IndexClosed`] once the index was closed; [`Index::close`]
//! takes the write lock, so it waits for in-flight operations and open
//! [`FieldDict`] cursors.
//!
//! # Examples
//!
//! ```
//! use glaive::index::Index;
//! use glaive::mapping::IndexMapping;
//! use glaive::query::{MatchQuery, Query};
//! use glaive::search::SearchRequest;
//! use serde_json::json;
//!
//! let index = Index::new_memory_only(IndexMapping::new()).unwrap();
//! index
//!     .index("1", &json!({"title": "The quick brown fox"}).into())
//!     .unwrap();
//! index
//!     .index("2", &json!({"title": "A lazy dog"}).into())
//!     .unwrap();
//!
//! let request = SearchRequest::new(Query::from(MatchQuery::new("fox")));
//! let result = index.search(&request).unwrap();
//! assert_eq!(result.total, 1);
//! assert_eq!(result.hits[0].id, "1");
//! ```

pub mod batch;
pub mod dict;
pub mod meta;
pub mod stats;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::json;
use uuid::Uuid;

use crate::config::Config;
use crate::document::{Document, Value};
use crate::engine::store::StoreConfig;
use crate::engine::{DictEntry, DumpRow, IndexEngine, IndexReader, KvStore};
use crate::error::{GlaiveError, Result, first_error};
use crate::mapping::{IndexMapping, MAPPING_INTERNAL_KEY};
use crate::search::facet::{
    DateTimeFacetBuilder, FacetBuilder, FacetsBuilder, NumericFacetBuilder, TermsFacetBuilder,
};
use crate::search::{FacetRequest, SearchRequest, SearchResult, TopNCollector};

pub use batch::Batch;
pub use dict::FieldDict;
pub use meta::IndexMeta;
pub use stats::{IndexStat, StatsRegistry};

/// Directory under the index path holding the kv store's files.
const STORE_DIR: &str = "store";

#[derive(Debug)]
pub(crate) struct IndexState {
    open: bool,
    name: String,
}

/// A searchable index.
#[derive(Debug)]
pub struct Index {
    path: Option<PathBuf>,
    meta: IndexMeta,
    config: Config,
    engine: Arc<dyn IndexEngine>,
    store: Arc<dyn KvStore>,
    mapping: Arc<IndexMapping>,
    stats: Arc<IndexStat>,
    state: RwLock<IndexState>,
}

fn store_config_for(path: &Path, mut config: StoreConfig, create: bool) -> StoreConfig {
    config.insert(
        "path".to_string(),
        json!(path.join(STORE_DIR).to_string_lossy()),
    );
    config.insert("create_if_missing".to_string(), json!(create));
    config.insert("error_if_exists".to_string(), json!(create));
    config
}

/// Look up the store and engine constructors and open the engine.
fn open_engine(
    config: &Config,
    meta: &IndexMeta,
    store_config: &StoreConfig,
) -> Result<(Arc<dyn IndexEngine>, Arc<dyn KvStore>)> {
    let store_ctor = config
        .registry
        .kv_store_named(&meta.storage)
        .ok_or_else(|| GlaiveError::UnknownStorageType(meta.storage.clone()))?;
    let engine_ctor = config
        .registry
        .index_type_named(&meta.index_type)
        .ok_or_else(|| GlaiveError::UnknownIndexType(meta.index_type.clone()))?;

    let store = store_ctor(store_config)?;
    let engine = engine_ctor(Arc::clone(&store))?;
    engine
        .open()
        .map_err(|e| e.context("error opening index engine"))?;
    Ok((engine, store))
}

/// Close an engine whose index could not be assembled, keeping the original error.
fn abandon<T>(engine: &dyn IndexEngine, err: GlaiveError) -> Result<T> {
    if let Err(close_err) = engine.close() {
        log::warn!("error closing abandoned index engine: {close_err}");
    }
    Err(err)
}

impl Index {
    /// Create an index at `path` with the configured default index type and
    /// kv store.
    pub fn new<P: AsRef<Path>>(path: P, mapping: IndexMapping) -> Result<Index> {
        let config = Config::default();
        let index_type = config.default_index_type.clone();
        let kv_store = config.default_kv_store.clone();
        Self::new_using(path, mapping, &index_type, &kv_store, StoreConfig::new(), config)
    }

    /// Create an index that lives only in memory.
    pub fn new_memory_only(mapping: IndexMapping) -> Result<Index> {
        Self::new_memory_only_using(mapping, Config::default())
    }

    pub fn new_memory_only_using(mapping: IndexMapping, config: Config) -> Result<Index> {
        let index_type = config.default_index_type.clone();
        let kv_store = config.default_mem_kv_store.clone();
        Self::new_using("", mapping, &index_type, &kv_store, StoreConfig::new(), config)
    }

    /// Create an index with an explicit index type, kv store and store
    /// configuration. An empty `path` creates a memory-only index.
    ///
    /// The mapping is validated before anything is written. An on-disk index
    /// fails with [`GlaiveError::IndexExists`] if `path` already exists.
    pub fn new_using<P: AsRef<Path>>(
        path: P,
        mut mapping: IndexMapping,
        index_type: &str,
        kv_store: &str,
        kv_config: StoreConfig,
        config: Config,
    ) -> Result<Index> {
        mapping.set_registry(Arc::clone(&config.registry));
        mapping.validate()?;

        if config.registry.kv_store_named(kv_store).is_none() {
            return Err(GlaiveError::UnknownStorageType(kv_store.to_string()));
        }
        if config.registry.index_type_named(index_type).is_none() {
            return Err(GlaiveError::UnknownIndexType(index_type.to_string()));
        }

        let path = path.as_ref();
        let meta = IndexMeta::new(kv_store, index_type, kv_config.clone());
        let (path, name, store_config) = if path.as_os_str().is_empty() {
            (None, Uuid::new_v4().to_string(), kv_config)
        } else {
            meta.write(path)?;
            let store_config = store_config_for(path, kv_config, true);
            (
                Some(path.to_path_buf()),
                path.display().to_string(),
                store_config,
            )
        };

        let (engine, store) = open_engine(&config, &meta, &store_config)?;

        let mapping_bytes = match serde_json::to_vec(&mapping) {
            Ok(bytes) => bytes,
            Err(e) => return abandon(engine.as_ref(), e.into()),
        };
        if let Err(e) = engine.set_internal(MAPPING_INTERNAL_KEY, &mapping_bytes) {
            return abandon(engine.as_ref(), e);
        }

        log::debug!("created index {name} ({index_type} over {kv_store})");
        Ok(Self::assemble(path, meta, config, engine, store, mapping, name))
    }

    /// Open an existing index with the default configuration.
    ///
    /// See [`Index::open_using`] for the returned pair.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Index, Option<GlaiveError>)> {
        Self::open_using(path, StoreConfig::new(), Config::default())
    }

    /// Open an existing index. `runtime_config` entries override the store
    /// configuration persisted at creation.
    ///
    /// The index is returned open even when its persisted mapping fails
    /// validation; the validation error is returned next to it.
    pub fn open_using<P: AsRef<Path>>(
        path: P,
        runtime_config: StoreConfig,
        config: Config,
    ) -> Result<(Index, Option<GlaiveError>)> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GlaiveError::IndexNotFound(path.display().to_string()));
        }
        let meta = IndexMeta::read(path)?;

        let mut store_config = store_config_for(path, meta.config.clone(), false);
        store_config.extend(runtime_config);

        let (engine, store) = open_engine(&config, &meta, &store_config)?;

        let mut mapping = match Self::load_mapping(engine.as_ref()) {
            Ok(mapping) => mapping,
            Err(e) => return abandon(engine.as_ref(), e),
        };
        mapping.set_registry(Arc::clone(&config.registry));

        let name = path.display().to_string();
        let index = Self::assemble(
            Some(path.to_path_buf()),
            meta,
            config,
            engine,
            store,
            mapping,
            name,
        );

        log::debug!("opened index {}", index.name());
        let validation = index.mapping.validate().err();
        if let Some(e) = &validation {
            log::warn!("opened index {} with an invalid mapping: {e}", index.name());
        }
        Ok((index, validation))
    }

    fn load_mapping(engine: &dyn IndexEngine) -> Result<IndexMapping> {
        let mut reader = engine.reader()?;
        let bytes = first_error(reader.get_internal(MAPPING_INTERNAL_KEY), reader.close())?;
        let bytes = bytes.ok_or_else(|| GlaiveError::mapping("index has no persisted mapping"))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| GlaiveError::mapping(format!("cannot decode persisted mapping: {e}")))
    }

    fn assemble(
        path: Option<PathBuf>,
        meta: IndexMeta,
        config: Config,
        engine: Arc<dyn IndexEngine>,
        store: Arc<dyn KvStore>,
        mapping: IndexMapping,
        name: String,
    ) -> Index {
        let stats = Arc::new(IndexStat::new(Arc::clone(&engine)));
        config.stats.register(name.clone(), Arc::clone(&stats));
        Index {
            path,
            meta,
            config,
            engine,
            store,
            mapping: Arc::new(mapping),
            stats,
            state: RwLock::new(IndexState { open: true, name }),
        }
    }

    fn read_open(&self) -> Result<RwLockReadGuard<'_, IndexState>> {
        let state = self.state.read();
        if !state.open {
            return Err(GlaiveError::IndexClosed);
        }
        Ok(state)
    }

    /// Run `f` against a fresh reader, closing it afterwards.
    fn with_reader<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn IndexReader) -> Result<T>,
    {
        let _state = self.read_open()?;
        let mut reader = self.engine.reader()?;
        let result = f(reader.as_ref());
        first_error(
            result,
            reader
                .close()
                .map_err(|e| e.context("error closing index reader")),
        )
    }

    /// Map `value` and index it under `id`, replacing any previous document.
    pub fn index(&self, id: &str, value: &Value) -> Result<()> {
        if id.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        let _state = self.read_open()?;
        let doc = self.mapping.map_document(id, value)?;
        self.engine.update(&doc)
    }

    /// Decode raw bytes with the mapping's byte-array converter and index them.
    pub fn index_bytes(&self, id: &str, bytes: &[u8]) -> Result<()> {
        if id.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        let _state = self.read_open()?;
        let doc = self.mapping.map_bytes(id, bytes)?;
        self.engine.update(&doc)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        let _state = self.read_open()?;
        self.engine.delete(id)
    }

    /// A batch mapped with this index's mapping.
    pub fn new_batch(&self) -> Batch {
        Batch::new(Arc::clone(&self.mapping))
    }

    /// Apply every staged operation of `batch`.
    pub fn batch(&self, batch: &Batch) -> Result<()> {
        let _state = self.read_open()?;
        self.engine.batch(batch)
    }

    /// The stored fields of a document.
    pub fn document(&self, id: &str) -> Result<Option<Document>> {
        if id.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        self.with_reader(|reader| reader.document(id))
    }

    pub fn doc_count(&self) -> Result<u64> {
        self.with_reader(|reader| Ok(reader.doc_count()))
    }

    /// Names of every indexed field.
    pub fn fields(&self) -> Result<Vec<String>> {
        self.with_reader(|reader| reader.fields())
    }

    /// Every term of `field`.
    pub fn field_dict(&self, field: &str) -> Result<FieldDict<'_>> {
        self.open_field_dict(|reader| reader.field_dict(field))
    }

    /// Terms of `field` between `start` and `end`, both inclusive.
    pub fn field_dict_range(
        &self,
        field: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<FieldDict<'_>> {
        self.open_field_dict(|reader| reader.field_dict_range(field, start, end))
    }

    pub fn field_dict_prefix(&self, field: &str, prefix: &str) -> Result<FieldDict<'_>> {
        self.open_field_dict(|reader| reader.field_dict_prefix(field, prefix))
    }

    fn open_field_dict<F>(&self, entries: F) -> Result<FieldDict<'_>>
    where
        F: FnOnce(&dyn IndexReader) -> Result<Vec<DictEntry>>,
    {
        let state = self.read_open()?;
        let mut reader = self.engine.reader()?;
        match entries(reader.as_ref()) {
            Ok(entries) => Ok(FieldDict::new(state, reader, entries)),
            Err(e) => first_error(Err(e), reader.close()),
        }
    }

    pub fn get_internal(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        self.with_reader(|reader| reader.get_internal(key))
    }

    pub fn set_internal(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        let _state = self.read_open()?;
        self.engine.set_internal(key, value)
    }

    pub fn delete_internal(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        let _state = self.read_open()?;
        self.engine.delete_internal(key)
    }

    /// Run a search.
    ///
    /// The query is validated before it is compiled. Hits carry this index's
    /// name, requested highlights and requested stored fields (`*` selects
    /// all of them).
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResult> {
        let state = self.read_open()?;
        let start = Instant::now();

        request.query.validate()?;

        let mut reader = self.engine.reader()?;
        let result = self.search_in_context(request, reader.as_ref(), &state.name);
        let mut result = first_error(
            result,
            reader
                .close()
                .map_err(|e| e.context("error closing index reader")),
        )?;

        let took = start.elapsed();
        result.took = took;
        self.stats.record_search(took);
        if self.config.is_slow_search(took) {
            log::warn!("slow search took {took:?}: {request}");
        }
        Ok(result)
    }

    fn search_in_context(
        &self,
        request: &SearchRequest,
        reader: &dyn IndexReader,
        name: &str,
    ) -> Result<SearchResult> {
        let mut collector = TopNCollector::new(request.size, request.from);
        if !request.facets.is_empty() {
            let mut facets = FacetsBuilder::new();
            for (facet_name, facet) in &request.facets {
                facets.add(facet_name.clone(), self.facet_builder(facet)?);
            }
            collector.set_facets_builder(facets);
        }

        let mut searcher = request
            .query
            .searcher(reader, &self.mapping, request.explain)?;

        let collected = collector.collect(searcher.as_mut(), reader);
        first_error(collected, searcher.close())?;

        let highlighter = match &request.highlight {
            Some(highlight) => {
                let style = highlight
                    .style
                    .as_deref()
                    .unwrap_or(&self.config.default_highlighter);
                let highlighter = self
                    .config
                    .registry
                    .highlighter_named(style)
                    .ok_or_else(|| {
                        GlaiveError::query(format!("no highlighter named '{style}' registered"))
                    })?;
                Some((highlight, highlighter))
            }
            None => None,
        };
        let all_fields = request.fields.iter().any(|f| f == "*");

        let total = collector.total();
        let max_score = collector.max_score();
        let facets = collector.facet_results();
        let mut hits = collector.into_results();

        for hit in &mut hits {
            hit.index = name.to_string();
            if highlighter.is_none() && request.fields.is_empty() {
                continue;
            }
            let Some(doc) = reader.document(&hit.id)? else {
                continue;
            };

            if let Some((highlight, highlighter)) = &highlighter {
                let fields: Vec<String> = if highlight.fields.is_empty() {
                    hit.locations.keys().cloned().collect()
                } else {
                    highlight.fields.clone()
                };
                for field in fields {
                    let fragments = highlighter.best_fragments(hit, &doc, &field, 1);
                    if !fragments.is_empty() {
                        hit.fragments.insert(field, fragments);
                    }
                }
            }

            for field in doc.fields() {
                if all_fields || request.fields.iter().any(|f| f == field.name()) {
                    hit.add_field_value(field.name(), field.value().to_json());
                }
            }
        }

        Ok(SearchResult {
            request: request.clone(),
            hits,
            total,
            max_score,
            took: Duration::ZERO,
            facets,
        })
    }

    fn facet_builder(&self, facet: &FacetRequest) -> Result<Box<dyn FacetBuilder>> {
        if !facet.numeric_ranges.is_empty() {
            let mut builder = NumericFacetBuilder::new(facet.field.clone(), facet.size);
            for range in &facet.numeric_ranges {
                builder.add_range(range.name.clone(), range.min, range.max);
            }
            return Ok(Box::new(builder));
        }

        if !facet.date_ranges.is_empty() {
            let parser = self.mapping.datetime_parser_for_path(&facet.field)?;
            let parse = |bound: &Option<String>| -> Result<_> {
                match bound.as_deref().filter(|s| !s.is_empty()) {
                    Some(input) => parser.parse_datetime(input).map(Some).map_err(|e| {
                        GlaiveError::query(format!("invalid date range bound '{input}': {e}"))
                    }),
                    None => Ok(None),
                }
            };
            let mut builder = DateTimeFacetBuilder::new(facet.field.clone(), facet.size);
            for range in &facet.date_ranges {
                builder.add_range(range.name.clone(), parse(&range.start)?, parse(&range.end)?);
            }
            return Ok(Box::new(builder));
        }

        Ok(Box::new(TermsFacetBuilder::new(
            facet.field.clone(),
            facet.size,
        )))
    }

    /// Close the index. Waits for in-flight operations; later data operations
    /// fail with [`GlaiveError::IndexClosed`]. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        if !state.open {
            return Ok(());
        }
        state.open = false;
        self.config.stats.unregister(&state.name);
        log::debug!("closing index {}", state.name);
        self.engine.close()
    }

    pub fn is_open(&self) -> bool {
        self.state.read().open
    }

    /// The index's logical name. Defaults to its path, or a random id for
    /// memory-only indexes.
    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    /// Rename the index, moving its statistics registration.
    pub fn set_name<S: Into<String>>(&self, name: S) {
        let mut state = self.state.write();
        let name = name.into();
        log::debug!("renaming index {} to {name}", state.name);
        if state.open {
            self.config.stats.unregister(&state.name);
            self.config.stats.register(name.clone(), Arc::clone(&self.stats));
        }
        state.name = name;
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn mapping(&self) -> &IndexMapping {
        &self.mapping
    }

    pub fn stats(&self) -> &Arc<IndexStat> {
        &self.stats
    }

    /// Search counters and engine statistics as JSON.
    pub fn stats_map(&self) -> serde_json::Value {
        self.stats.to_json()
    }

    /// The engine and kv store behind this index.
    pub fn advanced(&self) -> Result<(Arc<dyn IndexEngine>, Arc<dyn KvStore>)> {
        let _state = self.read_open()?;
        Ok((Arc::clone(&self.engine), Arc::clone(&self.store)))
    }

    /// Every row of the index, for debugging.
    pub fn dump_all(&self) -> Result<Vec<DumpRow>> {
        self.with_reader(|reader| reader.dump_all())
    }

    /// The rows belonging to one document.
    pub fn dump_doc(&self, id: &str) -> Result<Vec<DumpRow>> {
        if id.is_empty() {
            return Err(GlaiveError::EmptyId);
        }
        self.with_reader(|reader| reader.dump_doc(id))
    }

    pub fn dump_fields(&self) -> Result<Vec<DumpRow>> {
        self.with_reader(|reader| reader.dump_fields())
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("error closing index on drop: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{MatchAllQuery, Query};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_index_lifecycle() {
        let index = Index::new_memory_only(IndexMapping::new()).unwrap();
        assert!(index.path().is_none());
        assert!(Uuid::parse_str(&index.name()).is_ok());

        index.index("a", &json!({"n": 1}).into()).unwrap();
        assert_eq!(index.doc_count().unwrap(), 1);

        index.close().unwrap();
        index.close().unwrap();
        assert!(!index.is_open());
        assert!(matches!(index.doc_count(), Err(GlaiveError::IndexClosed)));
        assert!(matches!(
            index.search(&SearchRequest::new(Query::from(MatchAllQuery::new()))),
            Err(GlaiveError::IndexClosed)
        ));
    }

    #[test]
    fn test_unknown_types_leave_no_trace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("idx");
        let err = Index::new_using(
            &path,
            IndexMapping::new(),
            "inverted",
            "nope",
            StoreConfig::new(),
            Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GlaiveError::UnknownStorageType(_)));

        let err = Index::new_using(
            &path,
            IndexMapping::new(),
            "nope",
            "file",
            StoreConfig::new(),
            Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GlaiveError::UnknownIndexType(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_set_name_moves_stats() {
        let config = Config::default();
        let stats = Arc::clone(&config.stats);
        let index = Index::new_memory_only_using(IndexMapping::new(), config).unwrap();
        let original = index.name();
        assert!(stats.get(&original).is_some());

        index.set_name("products");
        assert_eq!(index.name(), "products");
        assert!(stats.get(&original).is_none());
        assert!(stats.get("products").is_some());

        index.close().unwrap();
        assert!(stats.get("products").is_none());
    }

    #[test]
    fn test_internal_keys() {
        let index = Index::new_memory_only(IndexMapping::new()).unwrap();
        index.set_internal(b"k", b"v").unwrap();
        assert_eq!(index.get_internal(b"k").unwrap(), Some(b"v".to_vec()));
        index.delete_internal(b"k").unwrap();
        assert_eq!(index.get_internal(b"k").unwrap(), None);
        assert!(matches!(index.get_internal(b""), Err(GlaiveError::EmptyId)));
        assert!(matches!(index.set_internal(b"", b"v"), Err(GlaiveError::EmptyId)));
    }

    #[test]
    fn test_slow_search_is_still_answered() {
        let config = Config::default().with_slow_search_log_threshold(Duration::ZERO);
        let index = Index::new_memory_only_using(IndexMapping::new(), config).unwrap();
        index.index("a", &json!({"title": "slow"}).into()).unwrap();

        let result = index
            .search(&SearchRequest::new(Query::from(MatchAllQuery::new())))
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.hits[0].id, "a");
        assert_eq!(index.stats().searches(), 1);
        assert_eq!(index.config.is_slow_search(result.took), result.took > Duration::ZERO);
    }
}

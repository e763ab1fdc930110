//! Named component registry.
//!
//! Mappings and the index façade refer to analyzers, datetime parsers,
//! highlighters, byte-array converters, index types and kv stores by name.
//! A [`Registry`] resolves those names. [`Registry::default`] holds the
//! built-in components; callers extend it before wrapping it in an `Arc` and
//! handing it to [`Config`](crate::config::Config).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::analysis::{Analyzer, DateTimeParser, FlexibleDateTimeParser, PipelineAnalyzer};
use crate::document::Value;
use crate::engine::inverted::InvertedIndex;
use crate::engine::store::{FileStore, MemoryStore};
use crate::engine::{IndexEngine, KvStore, StoreConfig};
use crate::error::Result;
use crate::search::highlight::{Highlighter, SimpleHighlighter};

/// Builds an index engine on top of an opened kv store.
pub type IndexTypeConstructor = fn(Arc<dyn KvStore>) -> Result<Arc<dyn IndexEngine>>;

/// Builds a kv store from its configuration map.
pub type KvStoreConstructor = fn(&StoreConfig) -> Result<Arc<dyn KvStore>>;

/// Turns raw bytes into a value tree for mapping.
pub type ByteArrayConverter = fn(&[u8]) -> Result<Value>;

/// Parse bytes as JSON.
pub fn json_converter(bytes: &[u8]) -> Result<Value> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(Value::from(value))
}

/// Name-to-component lookup tables.
#[derive(Clone)]
pub struct Registry {
    analyzers: HashMap<String, Arc<dyn Analyzer>>,
    datetime_parsers: HashMap<String, Arc<dyn DateTimeParser>>,
    highlighters: HashMap<String, Arc<dyn Highlighter>>,
    byte_array_converters: HashMap<String, ByteArrayConverter>,
    index_types: HashMap<String, IndexTypeConstructor>,
    kv_stores: HashMap<String, KvStoreConstructor>,
}

impl Registry {
    /// Create an empty registry with no components.
    pub fn empty() -> Self {
        Registry {
            analyzers: HashMap::new(),
            datetime_parsers: HashMap::new(),
            highlighters: HashMap::new(),
            byte_array_converters: HashMap::new(),
            index_types: HashMap::new(),
            kv_stores: HashMap::new(),
        }
    }

    pub fn register_analyzer<S: Into<String>>(&mut self, name: S, analyzer: Arc<dyn Analyzer>) {
        self.analyzers.insert(name.into(), analyzer);
    }

    pub fn register_datetime_parser<S: Into<String>>(
        &mut self,
        name: S,
        parser: Arc<dyn DateTimeParser>,
    ) {
        self.datetime_parsers.insert(name.into(), parser);
    }

    pub fn register_highlighter<S: Into<String>>(
        &mut self,
        name: S,
        highlighter: Arc<dyn Highlighter>,
    ) {
        self.highlighters.insert(name.into(), highlighter);
    }

    pub fn register_byte_array_converter<S: Into<String>>(
        &mut self,
        name: S,
        converter: ByteArrayConverter,
    ) {
        self.byte_array_converters.insert(name.into(), converter);
    }

    pub fn register_index_type<S: Into<String>>(&mut self, name: S, ctor: IndexTypeConstructor) {
        self.index_types.insert(name.into(), ctor);
    }

    pub fn register_kv_store<S: Into<String>>(&mut self, name: S, ctor: KvStoreConstructor) {
        self.kv_stores.insert(name.into(), ctor);
    }

    pub fn analyzer_named(&self, name: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.get(name).cloned()
    }

    pub fn datetime_parser_named(&self, name: &str) -> Option<Arc<dyn DateTimeParser>> {
        self.datetime_parsers.get(name).cloned()
    }

    pub fn highlighter_named(&self, name: &str) -> Option<Arc<dyn Highlighter>> {
        self.highlighters.get(name).cloned()
    }

    pub fn byte_array_converter_named(&self, name: &str) -> Option<ByteArrayConverter> {
        self.byte_array_converters.get(name).copied()
    }

    pub fn index_type_named(&self, name: &str) -> Option<IndexTypeConstructor> {
        self.index_types.get(name).copied()
    }

    pub fn kv_store_named(&self, name: &str) -> Option<KvStoreConstructor> {
        self.kv_stores.get(name).copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Registry::empty();

        for analyzer in [
            PipelineAnalyzer::standard(),
            PipelineAnalyzer::simple(),
            PipelineAnalyzer::whitespace(),
            PipelineAnalyzer::keyword(),
        ] {
            let name = analyzer.name().to_string();
            registry.register_analyzer(name, Arc::new(analyzer));
        }

        for parser in [
            FlexibleDateTimeParser::datetime_optional(),
            FlexibleDateTimeParser::rfc3339(),
        ] {
            let name = parser.name().to_string();
            registry.register_datetime_parser(name, Arc::new(parser));
        }

        registry.register_highlighter("html", Arc::new(SimpleHighlighter::html()));
        registry.register_highlighter("ansi", Arc::new(SimpleHighlighter::ansi()));

        registry.register_byte_array_converter("json", json_converter);

        registry.register_index_type(InvertedIndex::NAME, InvertedIndex::create);

        registry.register_kv_store(MemoryStore::NAME, MemoryStore::create);
        registry.register_kv_store(FileStore::NAME, FileStore::create);

        registry
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn names<V>(map: &HashMap<String, V>) -> Vec<&str> {
            let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
            names.sort_unstable();
            names
        }

        f.debug_struct("Registry")
            .field("analyzers", &names(&self.analyzers))
            .field("datetime_parsers", &names(&self.datetime_parsers))
            .field("highlighters", &names(&self.highlighters))
            .field("byte_array_converters", &names(&self.byte_array_converters))
            .field("index_types", &names(&self.index_types))
            .field("kv_stores", &names(&self.kv_stores))
            .finish()
    }
}

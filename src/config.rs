//! Library-wide configuration.
//!
//! [`Config`] carries the defaults the index façade falls back to when a
//! caller does not name an index type, kv store or highlighter, plus the
//! shared [`Registry`] and [`StatsRegistry`]. It is passed explicitly to
//! index constructors instead of living in process-wide state.

use std::sync::Arc;
use std::time::Duration;

use crate::engine::inverted::InvertedIndex;
use crate::engine::store::{FileStore, MemoryStore};
use crate::index::stats::StatsRegistry;
use crate::registry::Registry;

/// Configuration for creating and opening indexes.
#[derive(Debug, Clone)]
pub struct Config {
    /// Index type used by [`Index::new`](crate::index::Index::new).
    pub default_index_type: String,

    /// Kv store used for on-disk indexes.
    pub default_kv_store: String,

    /// Kv store used for memory-only indexes.
    pub default_mem_kv_store: String,

    /// Highlighter used when a highlight request names no style.
    pub default_highlighter: String,

    /// Searches taking longer than this are logged at warn level.
    pub slow_search_log_threshold: Option<Duration>,

    /// Component lookup tables.
    pub registry: Arc<Registry>,

    /// Per-index statistics, keyed by index name.
    pub stats: Arc<StatsRegistry>,
}

impl Config {
    pub fn with_default_index_type<S: Into<String>>(mut self, name: S) -> Self {
        self.default_index_type = name.into();
        self
    }

    pub fn with_default_kv_store<S: Into<String>>(mut self, name: S) -> Self {
        self.default_kv_store = name.into();
        self
    }

    pub fn with_default_mem_kv_store<S: Into<String>>(mut self, name: S) -> Self {
        self.default_mem_kv_store = name.into();
        self
    }

    pub fn with_default_highlighter<S: Into<String>>(mut self, name: S) -> Self {
        self.default_highlighter = name.into();
        self
    }

    pub fn with_slow_search_log_threshold(mut self, threshold: Duration) -> Self {
        self.slow_search_log_threshold = Some(threshold);
        self
    }

    /// Whether a search taking `took` crosses the slow-search threshold.
    pub fn is_slow_search(&self, took: Duration) -> bool {
        self.slow_search_log_threshold
            .is_some_and(|threshold| took > threshold)
    }

    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_stats(mut self, stats: Arc<StatsRegistry>) -> Self {
        self.stats = stats;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_index_type: InvertedIndex::NAME.to_string(),
            default_kv_store: FileStore::NAME.to_string(),
            default_mem_kv_store: MemoryStore::NAME.to_string(),
            default_highlighter: "html".to_string(),
            slow_search_log_threshold: None,
            registry: Arc::new(Registry::default()),
            stats: Arc::new(StatsRegistry::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.default_index_type, "inverted");
        assert_eq!(config.default_kv_store, "file");
        assert_eq!(config.default_mem_kv_store, "mem");
        assert_eq!(config.default_highlighter, "html");
        assert!(config.slow_search_log_threshold.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::default()
            .with_default_kv_store("mem")
            .with_slow_search_log_threshold(Duration::from_millis(250));
        assert_eq!(config.default_kv_store, "mem");
        assert_eq!(
            config.slow_search_log_threshold,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_slow_search_threshold() {
        let config = Config::default();
        assert!(!config.is_slow_search(Duration::from_secs(3600)));

        let config = config.with_slow_search_log_threshold(Duration::from_millis(250));
        assert!(!config.is_slow_search(Duration::from_millis(250)));
        assert!(config.is_slow_search(Duration::from_millis(251)));

        let config = Config::default().with_slow_search_log_threshold(Duration::ZERO);
        assert!(!config.is_slow_search(Duration::ZERO));
        assert!(config.is_slow_search(Duration::from_nanos(1)));
    }
}

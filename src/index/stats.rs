//! Search statistics per index.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::json;

use crate::engine::IndexEngine;

/// Counters for one index, plus the engine's own statistics.
#[derive(Debug)]
pub struct IndexStat {
    engine: Arc<dyn IndexEngine>,
    searches: AtomicU64,
    search_time_ns: AtomicU64,
}

impl IndexStat {
    pub fn new(engine: Arc<dyn IndexEngine>) -> Self {
        IndexStat {
            engine,
            searches: AtomicU64::new(0),
            search_time_ns: AtomicU64::new(0),
        }
    }

    pub fn record_search(&self, took: Duration) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.search_time_ns
            .fetch_add(took.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn searches(&self) -> u64 {
        self.searches.load(Ordering::Relaxed)
    }

    pub fn search_time(&self) -> Duration {
        Duration::from_nanos(self.search_time_ns.load(Ordering::Relaxed))
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "searches": self.searches(),
            "search_time": self.search_time_ns.load(Ordering::Relaxed),
            "index": self.engine.stats(),
        })
    }
}

/// Statistics of every open index, keyed by index name.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    indexes: RwLock<BTreeMap<String, Arc<IndexStat>>>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Into<String>>(&self, name: S, stat: Arc<IndexStat>) {
        self.indexes.write().insert(name.into(), stat);
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<IndexStat>> {
        self.indexes.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<IndexStat>> {
        self.indexes.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.indexes.read().keys().cloned().collect()
    }

    /// Every registered index's statistics as one JSON object.
    pub fn snapshot(&self) -> serde_json::Value {
        let indexes = self.indexes.read();
        serde_json::Value::Object(
            indexes
                .iter()
                .map(|(name, stat)| (name.clone(), stat.to_json()))
                .collect(),
        )
    }
}

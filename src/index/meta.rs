//! The on-disk descriptor naming an index's type and storage.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::inverted::InvertedIndex;
use crate::engine::store::StoreConfig;
use crate::error::{GlaiveError, Result};

pub const META_FILENAME: &str = "index_meta.json";

fn default_index_type() -> String {
    InvertedIndex::NAME.to_string()
}

/// Which engine and kv store an index was created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub storage: String,
    /// Absent in descriptors written before index types were selectable.
    #[serde(default = "default_index_type")]
    pub index_type: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub config: StoreConfig,
}

impl IndexMeta {
    pub fn new<S: Into<String>>(storage: S, index_type: S, config: StoreConfig) -> Self {
        IndexMeta {
            storage: storage.into(),
            index_type: index_type.into(),
            config,
        }
    }

    /// Read the descriptor from an index directory.
    pub fn read<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(META_FILENAME);
        let bytes = fs::read(&path)
            .map_err(|e| GlaiveError::IndexMetaMissing(format!("{}: {e}", path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| GlaiveError::IndexMetaMissing(format!("{}: {e}", path.display())))
    }

    /// Write the descriptor, creating the directory. Fails if one exists.
    pub fn write<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if dir.exists() {
            return Err(GlaiveError::IndexExists(dir.display().to_string()));
        }
        fs::create_dir_all(dir)?;
        let bytes = serde_json::to_vec_pretty(self)?;
        fs::write(dir.join(META_FILENAME), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("idx");
        let mut config = StoreConfig::new();
        config.insert("path".to_string(), serde_json::json!("store"));
        let meta = IndexMeta::new("file", "inverted", config);

        meta.write(&path).unwrap();
        assert_eq!(IndexMeta::read(&path).unwrap(), meta);
        assert!(matches!(meta.write(&path), Err(GlaiveError::IndexExists(_))));
    }

    #[test]
    fn test_missing_index_type_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(META_FILENAME), br#"{"storage": "file"}"#).unwrap();
        let meta = IndexMeta::read(dir.path()).unwrap();
        assert_eq!(meta.index_type, InvertedIndex::NAME);
        assert!(meta.config.is_empty());
    }

    #[test]
    fn test_missing_descriptor() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            IndexMeta::read(dir.path()),
            Err(GlaiveError::IndexMetaMissing(_))
        ));
    }
}

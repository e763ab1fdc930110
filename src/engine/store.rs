//! Kv stores: where an engine keeps its persisted state.
//!
//! The `file` store writes a single checksummed snapshot:
//!
//! ```text
//! magic "GLVS" | version u32 | length u64 | crc32 u32 | payload
//! ```
//!
//! All integers are little-endian. The snapshot is written to a temporary
//! file and renamed into place.

use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{GlaiveError, Result};

/// Store configuration, persisted in the index meta descriptor.
pub type StoreConfig = serde_json::Map<String, serde_json::Value>;

/// A persistence backend for engine snapshots.
pub trait KvStore: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Whether persisted snapshots survive the process.
    fn is_durable(&self) -> bool {
        true
    }

    /// Load the last persisted snapshot.
    fn load(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the persisted snapshot.
    fn persist(&self, snapshot: &[u8]) -> Result<()>;

    fn close(&self) -> Result<()>;
}

fn config_bool(config: &StoreConfig, key: &str, default: bool) -> bool {
    config.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

/// Keeps nothing; state lives only in the engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    closed: AtomicBool,
}

impl MemoryStore {
    pub const NAME: &'static str = "mem";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(_config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
        Ok(Arc::new(Self::new()))
    }
}

impl KvStore for MemoryStore {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn persist(&self, _snapshot: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GlaiveError::storage("store is closed"));
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

const SNAPSHOT_FILE: &str = "store.snap";
const SNAPSHOT_TMP_FILE: &str = "store.snap.tmp";
const SNAPSHOT_MAGIC: &[u8; 4] = b"GLVS";
const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot file in a directory.
///
/// Recognized config keys: `path` (required), `create_if_missing` (default
/// true) and `error_if_exists` (default false).
#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
    closed: AtomicBool,
    bytes_written: AtomicU64,
}

impl FileStore {
    pub const NAME: &'static str = "file";

    pub fn open<P: AsRef<Path>>(
        directory: P,
        create_if_missing: bool,
        error_if_exists: bool,
    ) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        if directory.join(SNAPSHOT_FILE).exists() && error_if_exists {
            return Err(GlaiveError::storage(format!(
                "store already exists: {}",
                directory.display()
            )));
        }
        if !directory.exists() {
            if !create_if_missing {
                return Err(GlaiveError::storage(format!(
                    "store does not exist: {}",
                    directory.display()
                )));
            }
            fs::create_dir_all(&directory)
                .map_err(|e| GlaiveError::storage(format!("failed to create directory: {e}")))?;
        }
        if !directory.is_dir() {
            return Err(GlaiveError::storage(format!(
                "path is not a directory: {}",
                directory.display()
            )));
        }

        Ok(FileStore {
            directory,
            closed: AtomicBool::new(false),
            bytes_written: AtomicU64::new(0),
        })
    }

    pub fn create(config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
        let path = config
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GlaiveError::storage("file store requires a 'path'"))?;
        let store = Self::open(
            path,
            config_bool(config, "create_if_missing", true),
            config_bool(config, "error_if_exists", false),
        )?;
        Ok(Arc::new(store))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Total snapshot bytes written since the store was opened.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

impl KvStore for FileStore {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn load(&self) -> Result<Option<Vec<u8>>> {
        let path = self.directory.join(SNAPSHOT_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path)?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != SNAPSHOT_MAGIC {
            return Err(GlaiveError::storage(format!(
                "not a snapshot file: {}",
                path.display()
            )));
        }
        let version = file.read_u32::<LittleEndian>()?;
        if version != SNAPSHOT_VERSION {
            return Err(GlaiveError::storage(format!(
                "unsupported snapshot version {version}"
            )));
        }
        let length = file.read_u64::<LittleEndian>()?;
        let checksum = file.read_u32::<LittleEndian>()?;

        let mut payload = Vec::new();
        file.read_to_end(&mut payload)?;
        if payload.len() as u64 != length {
            return Err(GlaiveError::storage(format!(
                "snapshot truncated: expected {length} bytes, found {}",
                payload.len()
            )));
        }
        if crc32fast::hash(&payload) != checksum {
            return Err(GlaiveError::storage("snapshot checksum mismatch"));
        }
        Ok(Some(payload))
    }

    fn persist(&self, snapshot: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GlaiveError::storage("store is closed"));
        }

        let tmp = self.directory.join(SNAPSHOT_TMP_FILE);
        {
            let mut file = File::create(&tmp)?;
            file.write_all(SNAPSHOT_MAGIC)?;
            file.write_u32::<LittleEndian>(SNAPSHOT_VERSION)?;
            file.write_u64::<LittleEndian>(snapshot.len() as u64)?;
            file.write_u32::<LittleEndian>(crc32fast::hash(snapshot))?;
            file.write_all(snapshot)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, self.directory.join(SNAPSHOT_FILE))?;

        self.bytes_written
            .fetch_add(snapshot.len() as u64, Ordering::Relaxed);
        log::trace!(
            "persisted {} byte snapshot to {}",
            snapshot.len(),
            self.directory.display()
        );
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("store"), true, false).unwrap();
        assert!(store.load().unwrap().is_none());

        store.persist(b"hello snapshot").unwrap();
        assert_eq!(store.load().unwrap().unwrap(), b"hello snapshot");
        assert_eq!(store.bytes_written(), 14);

        store.close().unwrap();
        assert!(store.persist(b"late").is_err());
    }

    #[test]
    fn test_file_store_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store");

        assert!(FileStore::open(&path, false, false).is_err());

        let store = FileStore::open(&path, true, true).unwrap();
        store.persist(b"x").unwrap();

        assert!(FileStore::open(&path, false, true).is_err());
        assert!(FileStore::open(&path, false, false).is_ok());
    }

    #[test]
    fn test_corrupt_snapshot_detected() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), true, false).unwrap();
        store.persist(b"payload").unwrap();

        let path = dir.path().join(SNAPSHOT_FILE);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(store.load(), Err(GlaiveError::Storage(_))));
    }

    #[test]
    fn test_oversized_length_header_detected() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path(), true, false).unwrap();
        store.persist(b"payload").unwrap();

        let path = dir.path().join(SNAPSHOT_FILE);
        let mut bytes = fs::read(&path).unwrap();
        bytes[8..16].copy_from_slice(&u64::MAX.to_le_bytes());
        fs::write(&path, bytes).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, GlaiveError::Storage(_)));
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_create_from_config() {
        let dir = TempDir::new().unwrap();
        let mut config = StoreConfig::new();
        assert!(FileStore::create(&config).is_err());

        config.insert(
            "path".to_string(),
            serde_json::Value::String(dir.path().join("s").to_string_lossy().into_owned()),
        );
        let store = FileStore::create(&config).unwrap();
        assert_eq!(store.name(), "file");
    }
}

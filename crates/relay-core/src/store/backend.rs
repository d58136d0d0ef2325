//! Physical key-value backends.
//!
//! A backend is the single map every [`Store`](super::Store) view of a
//! process shares. Backends know nothing about namespaces; they only see
//! physical keys.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreResult;

/// The physical map behind every store view.
///
/// Implementations must tolerate concurrent calls from any thread.
pub trait Backend: Send + Sync {
    /// Returns the value under `key`, if present.
    fn get(&self, key: &str) -> Option<Value>;

    /// Returns `true` if `key` is present.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces the value under `key`.
    fn set(&self, key: &str, value: Value);

    /// Removes `key`, returning the previous value.
    fn remove(&self, key: &str) -> Option<Value>;

    /// Returns every physical key starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;

    /// Persists pending writes. A no-op for purely in-memory backends.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

// =============================================================================
// MemoryBackend
// =============================================================================

/// An in-memory backend guarded by a read-write lock.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    map: RwLock<BTreeMap<String, Value>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_map(map: BTreeMap<String, Value>) -> Self {
        Self {
            map: RwLock::new(map),
        }
    }

    fn snapshot(&self) -> BTreeMap<String, Value> {
        self.map.read().clone()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Option<Value> {
        self.map.read().get(key).cloned()
    }

    fn contains(&self, key: &str) -> bool {
        self.map.read().contains_key(key)
    }

    fn set(&self, key: &str, value: Value) {
        self.map.write().insert(key.to_owned(), value);
    }

    fn remove(&self, key: &str) -> Option<Value> {
        self.map.write().remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        // BTreeMap keys are ordered, so the matching keys are one contiguous run.
        self.map
            .read()
            .range(prefix.to_owned()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }
}

// =============================================================================
// JsonFileBackend
// =============================================================================

/// A backend kept in memory and persisted as one JSON object on flush.
///
/// Writes are only durable after [`flush`](Backend::flush); the runtime
/// flushes when it closes the store.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    inner: MemoryBackend,
}

impl JsonFileBackend {
    /// Opens `path`, loading its contents when the file exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let map = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        info!(path = %path.display(), keys = map.len(), "Opened storage file");

        Ok(Self {
            path,
            inner: MemoryBackend::from_map(map),
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for JsonFileBackend {
    fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key)
    }

    fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    fn set(&self, key: &str, value: Value) {
        self.inner.set(key, value);
    }

    fn remove(&self, key: &str) -> Option<Value> {
        self.inner.remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.inner.keys_with_prefix(prefix)
    }

    fn flush(&self) -> StoreResult<()> {
        let snapshot = self.inner.snapshot();
        let encoded = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling file first so a crash never leaves a torn file.
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), keys = snapshot.len(), "Flushed storage file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefix_scan_is_exact() {
        let backend = MemoryBackend::new();
        backend.set("a:1", json!(1));
        backend.set("a:2", json!(2));
        backend.set("ab", json!(3));
        backend.set("b:1", json!(4));

        assert_eq!(backend.keys_with_prefix("a:"), vec!["a:1", "a:2"]);
        assert_eq!(backend.keys_with_prefix("a").len(), 3);
        assert_eq!(backend.keys_with_prefix("").len(), 4);
        assert!(backend.keys_with_prefix("c").is_empty());
    }

    #[test]
    fn test_file_backend_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("relay.storage.json");

        let backend = JsonFileBackend::open(&path).unwrap();
        backend.set("greeting", json!("hello"));
        backend.set("nothing", Value::Null);
        backend.flush().unwrap();

        let reopened = JsonFileBackend::open(&path).unwrap();
        assert_eq!(reopened.get("greeting"), Some(json!("hello")));
        assert_eq!(reopened.get("nothing"), Some(Value::Null));
        assert!(reopened.contains("nothing"));
    }

    #[test]
    fn test_unflushed_writes_are_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.storage.json");

        let backend = JsonFileBackend::open(&path).unwrap();
        backend.set("draft", json!(true));
        drop(backend);

        let reopened = JsonFileBackend::open(&path).unwrap();
        assert!(reopened.get("draft").is_none());
    }
}

//! The namespaced store.
//!
//! One physical [`Backend`] exists per process. Every [`Store`] is a view over
//! it with a key prefix: a view with prefix `P` maps logical key `K` to the
//! physical key `P + K`. Views are cheap to clone and to derive.
//!
//! - Writes through any view are visible to every view that resolves to the
//!   same physical key.
//! - [`keys`](Store::keys) and [`clear`](Store::clear) only see keys under the
//!   view's own prefix.
//! - [`with_prefix`](Store::with_prefix) appends, so namespaces nest.
//!
//! Isolation is a naming convention only; nothing stops a view with prefix
//! `"a"` from reading keys written by a view with prefix `"ab"` if the logical
//! keys line up. The runtime gives each plugin `"<name>:"` to keep them apart.
//!
//! # Example
//!
//! ```rust
//! use relay_core::Store;
//!
//! let root = Store::in_memory();
//! let todo = root.with_prefix("todo:");
//!
//! todo.set("count", &3).unwrap();
//! assert_eq!(todo.get_as::<u32>("count").unwrap(), 3);
//! assert!(root.keys().contains("todo:count"));
//! assert!(todo.keys().contains("count"));
//! ```

mod backend;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

pub use backend::{Backend, JsonFileBackend, MemoryBackend};

/// A prefix-scoped view over the process-wide key-value backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
    prefix: Arc<str>,
}

impl Store {
    /// Creates a root view (empty prefix) over `backend`.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            prefix: Arc::from(""),
        }
    }

    /// Creates a root view over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Creates a root view over a JSON file, loading it if it exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(Arc::new(JsonFileBackend::open(path)?)))
    }

    /// Returns this view's full prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn physical(&self, key: &str) -> String {
        let mut physical = String::with_capacity(self.prefix.len() + key.len());
        physical.push_str(&self.prefix);
        physical.push_str(key);
        physical
    }

    /// Returns the value under `key`.
    ///
    /// Fails with [`StoreError::NotFound`] when the key is absent; a stored
    /// `null` is returned as `Value::Null`.
    pub fn get(&self, key: &str) -> StoreResult<Value> {
        self.backend
            .get(&self.physical(key))
            .ok_or_else(|| StoreError::NotFound(key.to_owned()))
    }

    /// Returns the value under `key`, or `None` when absent.
    pub fn try_get(&self, key: &str) -> Option<Value> {
        self.backend.get(&self.physical(key))
    }

    /// Returns the value under `key` deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> StoreResult<T> {
        let value = self.get(key)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.backend.contains(&self.physical(key))
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let value = serde_json::to_value(value)?;
        self.backend.set(&self.physical(key), value);
        Ok(())
    }

    /// Removes `key`, returning its value.
    ///
    /// Fails with [`StoreError::NotFound`] when the key is absent.
    pub fn delete(&self, key: &str) -> StoreResult<Value> {
        self.backend
            .remove(&self.physical(key))
            .ok_or_else(|| StoreError::NotFound(key.to_owned()))
    }

    /// Returns the logical keys of this namespace, prefix stripped.
    pub fn keys(&self) -> BTreeSet<String> {
        self.backend
            .keys_with_prefix(&self.prefix)
            .into_iter()
            .filter_map(|k| k.strip_prefix(&*self.prefix).map(str::to_owned))
            .collect()
    }

    /// Deletes every key returned by [`keys`](Self::keys).
    pub fn clear(&self) {
        for key in self.backend.keys_with_prefix(&self.prefix) {
            self.backend.remove(&key);
        }
    }

    /// Returns a view over the same backend with `sub_prefix` appended.
    pub fn with_prefix(&self, sub_prefix: &str) -> Store {
        Store {
            backend: Arc::clone(&self.backend),
            prefix: Arc::from(self.physical(sub_prefix)),
        }
    }

    /// Persists pending writes of the whole backend.
    pub fn flush(&self) -> StoreResult<()> {
        self.backend.flush()
    }

    /// Flushes and releases this handle.
    ///
    /// Other views stay usable; the backend is dropped with the last one.
    pub fn close(self) -> StoreResult<()> {
        self.flush()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

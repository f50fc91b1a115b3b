//! Flat key-value namespace shared by the controller and its observers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::StoreError;

/// A set of writes and removals applied atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub set: Vec<(String, Value)>,
    pub remove: Vec<String>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set.push((key.to_string(), value.into()));
        self
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.remove.push(key.to_string());
        self
    }
}

/// Backing storage for the shared namespace.
///
/// Last write wins; there is no locking across actors.
pub trait KeyValueStore {
    /// Fetch the given keys in one consistent read. Absent keys are omitted.
    fn load(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError>;

    /// Apply every write and removal in `batch` atomically.
    fn commit(&self, batch: Batch) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn load(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        (**self).load(keys)
    }

    fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        (**self).commit(batch)
    }
}

/// In-process store. Clones share the same map, which lets tests wire a
/// controller and several observers to one namespace.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    map: HashMap<String, Value>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches committed so far.
    pub fn commit_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).commits
    }

    /// Raw access for tests that simulate torn or foreign writes.
    pub fn put_raw(&self, key: &str, value: Value) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.map.insert(key.to_string(), value);
    }

    pub fn get_raw(&self, key: &str) -> Option<Value> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.map.get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .map
            .is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(keys
            .iter()
            .filter_map(|k| inner.map.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        for key in batch.remove {
            inner.map.remove(&key);
        }
        for (key, value) in batch.set {
            inner.map.insert(key, value);
        }
        inner.commits += 1;
        Ok(())
    }
}

//! In-Memory Record Store
//!
//! A `BTreeMap`-backed store used when no database is configured, and by the
//! test suite. Ordered storage keeps `list` output stable without sorting.

use super::{RecordStore, StoreError, StoreResult};
use std::collections::BTreeMap;

/// Record store that keeps every entry in process memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    data: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.data.get(key).cloned())
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.data.contains_key(key))
    }

    fn insert(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if self.data.contains_key(key) {
            return Err(StoreError::DuplicateKey(key.to_string()));
        }
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(slot) = self.data.get_mut(key) {
            *slot = value.to_string();
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        self.data.remove(key);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<(String, String)>> {
        Ok(self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

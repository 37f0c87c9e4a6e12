use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Result, StoreError};
use crate::{SecretStore, Tags};

/// One call made against a [`MemoryStore`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put(String),
    Get(String),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub value: String,
    pub tags: Tags,
    pub secure: bool,
}

/// In-process secret store. Thread-safe via Mutex; records every call so
/// tests can assert on the exact sequence of store operations.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, name: &str) -> Option<StoredEntry> {
        self.entries.lock().unwrap().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().unwrap().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted names of all stored entries.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SecretStore for MemoryStore {
    fn put(&self, name: &str, value: &str, tags: &Tags, secure: bool) -> Result<()> {
        self.record(StoreCall::Put(name.to_string()));
        self.entries.lock().unwrap().insert(
            name.to_string(),
            StoredEntry {
                value: value.to_string(),
                tags: tags.clone(),
                secure,
            },
        );
        Ok(())
    }

    fn get(&self, name: &str, _decrypt: bool) -> Result<String> {
        self.record(StoreCall::Get(name.to_string()));
        self.entries
            .lock()
            .unwrap()
            .get(name)
            .map(|e| e.value.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.record(StoreCall::Delete(name.to_string()));
        match self.entries.lock().unwrap().remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }
}

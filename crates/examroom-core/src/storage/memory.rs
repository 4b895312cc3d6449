//! In-process key-value store.
//!
//! Handles made with [`MemoryStore::handle`] share one map, the way two
//! browser tabs share one origin's storage: each handle sees the others'
//! writes as external changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::KvStore;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct Shared {
    entries: HashMap<String, String>,
    /// Bumped on every write through any handle.
    version: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<Shared>>,
    seen_version: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Another view of the same entries.
    pub fn handle(&self) -> Self {
        let seen_version = self.shared.lock().map(|s| s.version).unwrap_or(0);
        Self {
            shared: Arc::clone(&self.shared),
            seen_version,
        }
    }

    fn write<F>(&mut self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mut shared = self.shared.lock().map_err(|_| StorageError::Poisoned)?;
        let external = shared.version != self.seen_version;
        f(&mut shared.entries);
        shared.version += 1;
        // Keep an unseen foreign write visible to the next poll.
        if !external {
            self.seen_version = shared.version;
        }
        Ok(())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let shared = self.shared.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(shared.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.write(|entries| {
            entries.remove(key);
        })
    }

    fn poll_external_change(&mut self) -> Result<bool, StorageError> {
        let shared = self.shared.lock().map_err(|_| StorageError::Poisoned)?;
        let changed = shared.version != self.seen_version;
        self.seen_version = shared.version;
        Ok(changed)
    }
}

use std::collections::HashMap;
use std::sync::Mutex;

use super::{KeyValueStore, LocalStateError};

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().expect("store lock poisoned");
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), LocalStateError> {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

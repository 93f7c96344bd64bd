// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod file;

pub use file::FileStorage;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

/// Synchronous string key-value store backing all persisted listening state.
///
/// Callers JSON-encode their own values. A failing operation is expected to
/// be caught at the call site and degraded to "no data" so that playback and
/// favouriting keep working without persistence.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`, if any
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Enumerate every stored key
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// A shared reference to a storage backend
pub type SharedStorage = Arc<dyn Storage>;

/// In-memory storage backend. Never fails; the default for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty MemoryStorage wrapped in an Arc
    pub fn shared() -> SharedStorage {
        Arc::new(Self::default())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }
}

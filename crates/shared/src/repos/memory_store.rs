use std::collections::HashMap;
use std::sync::Mutex;

use super::{BlobStore, StoreError};

/// In-process blob store, mostly for tests and ephemeral clients.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn read_blob(&self, key: &str) -> Result<Option<String>, StoreError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    fn write_blob(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        blobs.insert(key.to_string(), contents.to_string());
        Ok(())
    }
}

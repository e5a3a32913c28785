//! Process-local object store. Contents vanish when the process exits.

use dashmap::DashMap;
use longmem_core::storage::object_store::ObjectStore;
use longmem_types::error::StorageError;

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: DashMap<String, Vec<u8>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for InMemoryObjectStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .get(path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn upload(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.objects.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.objects
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

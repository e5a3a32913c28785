//! BoxObjectStore -- object-safe dynamic dispatch wrapper for ObjectStore.
//!
//! 1. Define an object-safe `ObjectStoreDyn` trait with boxed futures
//! 2. Blanket-impl `ObjectStoreDyn` for all `T: ObjectStore`
//! 3. `BoxObjectStore` wraps `Box<dyn ObjectStoreDyn>` and implements
//!    `ObjectStore` itself, so it plugs into the generic services

use std::future::Future;
use std::pin::Pin;

use longmem_types::error::StorageError;

use super::object_store::ObjectStore;

type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Object-safe version of [`ObjectStore`] with boxed futures.
pub trait ObjectStoreDyn: Send + Sync {
    fn download_boxed<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Vec<u8>>;

    fn upload_boxed<'a>(&'a self, path: &'a str, data: &'a [u8]) -> StorageFuture<'a, ()>;

    fn delete_boxed<'a>(&'a self, path: &'a str) -> StorageFuture<'a, ()>;
}

impl<T: ObjectStore> ObjectStoreDyn for T {
    fn download_boxed<'a>(&'a self, path: &'a str) -> StorageFuture<'a, Vec<u8>> {
        Box::pin(self.download(path))
    }

    fn upload_boxed<'a>(&'a self, path: &'a str, data: &'a [u8]) -> StorageFuture<'a, ()> {
        Box::pin(self.upload(path, data))
    }

    fn delete_boxed<'a>(&'a self, path: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(self.delete(path))
    }
}

/// Type-erased object store for runtime backend selection.
///
/// The storage backend is chosen from configuration at startup (filesystem,
/// DIAL, in-memory); `BoxObjectStore` lets the memory service stay generic
/// while the binary picks the concrete store.
pub struct BoxObjectStore {
    inner: Box<dyn ObjectStoreDyn + Send + Sync>,
}

impl BoxObjectStore {
    /// Wrap a concrete `ObjectStore` in a type-erased box.
    pub fn new<T: ObjectStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }
}

impl ObjectStore for BoxObjectStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.download_boxed(path).await
    }

    async fn upload(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.inner.upload_boxed(path, data).await
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.inner.delete_boxed(path).await
    }
}

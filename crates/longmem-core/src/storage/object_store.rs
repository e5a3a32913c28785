//! Object store trait.
//!
//! A durable, path-keyed blob store with overwrite-on-upload semantics
//! (the DIAL file API, a local directory, an in-memory map in tests).

use longmem_types::error::StorageError;

/// Trait for path-keyed byte blob storage.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in longmem-infra.
pub trait ObjectStore: Send + Sync {
    /// Fetch the bytes stored at `path`.
    ///
    /// Returns `StorageError::NotFound` when nothing is stored there.
    fn download(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, StorageError>> + Send;

    /// Store `data` at `path`, replacing any previous object (PUT semantics).
    fn upload(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Remove the object at `path`.
    ///
    /// Returns `StorageError::NotFound` when nothing is stored there; callers
    /// that only care about absence treat that as success.
    fn delete(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}

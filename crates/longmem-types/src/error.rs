use thiserror::Error;

/// Errors from the durable object store (download/upload/delete of blobs).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object does not exist at the requested path.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Network or backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from memory store operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("importance must be within [0, 1], got {0}")]
    InvalidImportance(f32),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl MemoryError {
    /// Whether this error came from the object store reporting a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MemoryError::Storage(StorageError::NotFound(_)))
    }
}

//! Embedder trait for text-to-vector conversion.
//!
//! The embedding model is an opaque capability: text in, fixed-length vector
//! out. Implementations (fastembed in longmem-infra, mocks in tests) decide
//! where inference runs; the core only relies on determinism and on a fixed
//! `dimension()` for the lifetime of the process.

use longmem_types::error::MemoryError;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait Embedder: Send + Sync {
    /// Embed one or more texts, returning one vector per input in order.
    ///
    /// Failures surface as `MemoryError::Embedding` and are never retried.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, MemoryError>> + Send;

    /// The model name recorded alongside stored vectors.
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}

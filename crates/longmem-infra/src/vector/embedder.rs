//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `longmem-core` with the
//! all-MiniLM-L6-v2 sentence model (384 dimensions) on the ONNX runtime.
//! Inference is CPU-bound, so every call moves the model onto the blocking
//! pool and takes it back afterwards.

use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use longmem_core::memory::embedder::Embedder;
use longmem_types::config::EmbeddingConfig;
use longmem_types::error::MemoryError;
use tokio::sync::Mutex;

pub const MODEL_NAME: &str = "all-MiniLM-L6-v2";
pub const DIMENSION: usize = 384;

pub struct FastEmbedder {
    /// `None` only while a batch is running on the blocking pool.
    model: Mutex<Option<TextEmbedding>>,
}

impl FastEmbedder {
    /// Load the model, downloading it into the cache directory on first use.
    pub async fn load(config: &EmbeddingConfig) -> Result<Self, MemoryError> {
        let cache_dir = config.cache_dir.clone();
        let model = tokio::task::spawn_blocking(move || init_model(cache_dir))
            .await
            .map_err(|e| MemoryError::Task(e.to_string()))??;

        Ok(Self {
            model: Mutex::new(Some(model)),
        })
    }
}

fn init_model(cache_dir: Option<PathBuf>) -> Result<TextEmbedding, MemoryError> {
    tracing::info!(model = MODEL_NAME, "initializing embedding model");
    let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
    if let Some(dir) = cache_dir {
        options = options.with_cache_dir(dir);
    }
    TextEmbedding::try_new(options).map_err(|e| MemoryError::Embedding(e.to_string()))
}

impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut guard = self.model.lock().await;
        let mut model = guard
            .take()
            .ok_or_else(|| MemoryError::Embedding("embedding model unavailable".to_string()))?;
        let texts = texts.to_vec();

        let (result, model) = tokio::task::spawn_blocking(move || {
            let result = model.embed(texts, None);
            (result, model)
        })
        .await
        .map_err(|e| MemoryError::Task(e.to_string()))?;
        *guard = Some(model);

        result.map_err(|e| MemoryError::Embedding(e.to_string()))
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

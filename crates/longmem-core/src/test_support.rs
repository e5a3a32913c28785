//! Mock embedder and object store shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use longmem_types::error::{MemoryError, StorageError};
use longmem_types::memory::Memory;

use crate::memory::embedder::Embedder;
use crate::storage::object_store::ObjectStore;

pub fn sample_memory(id: i64, importance: f32, embedding: Vec<f32>) -> Memory {
    Memory {
        id,
        content: format!("memory {id}"),
        importance,
        category: "context".to_string(),
        topics: Vec::new(),
        embedding,
    }
}

/// Unit vector along axis `axis` in `dimension` dimensions.
pub fn one_hot(axis: usize, dimension: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimension];
    v[axis % dimension] = 1.0;
    v
}

/// Bag-of-words embedder: every distinct lowercase word gets its own axis.
///
/// Texts sharing words are similar, identical word sets embed identically.
/// Words beyond `dimension` wrap around.
pub struct MockEmbedder {
    dimension: usize,
    vocabulary: Mutex<HashMap<String, usize>>,
    overrides: Mutex<HashMap<String, Vec<f32>>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vocabulary: Mutex::new(HashMap::new()),
            overrides: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Force `text` to embed as `vector`.
    pub fn with_vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.overrides
            .lock()
            .unwrap()
            .insert(text.to_string(), vector);
        self
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        if let Some(vector) = self.overrides.lock().unwrap().get(text) {
            return vector.clone();
        }

        let mut vocabulary = self.vocabulary.lock().unwrap();
        let mut vector = vec![0.0; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let next = vocabulary.len();
            let axis = *vocabulary.entry(word.to_lowercase()).or_insert(next);
            vector[axis % self.dimension] += 1.0;
        }
        vector
    }
}

impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MemoryError::Embedding("model unavailable".to_string()));
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model_name(&self) -> &str {
        "mock-bag-of-words"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// In-memory object store with switchable failures and call counters.
#[derive(Default)]
pub struct MockObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_downloads: AtomicBool,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    downloads: AtomicUsize,
    uploads: AtomicUsize,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }
}

impl ObjectStore for MockObjectStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("connection reset".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn upload(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("503 Service Unavailable".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("403 Forbidden".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

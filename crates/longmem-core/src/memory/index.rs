//! Exact cosine-similarity nearest-neighbor index.
//!
//! Vectors are L2-normalized on insertion and at query time, so cosine
//! similarity reduces to an inner product in [-1, 1]. The index is flat:
//! every query scans the whole corpus. With per-user corpora in the low
//! thousands that is cheap and keeps recall exact. A batch of n queries costs
//! O(n * corpus * dimension); switching to an approximate index would be a
//! deliberate trade of recall for sub-quadratic dedup.

use std::cmp::Ordering;

use longmem_types::error::MemoryError;

/// One search hit: position in the indexed corpus and its cosine similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub similarity: f32,
}

/// Scale `vector` to unit Euclidean length. A zero vector stays zero.
pub fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return vec![0.0; vector.len()];
    }
    vector.iter().map(|x| x / norm).collect()
}

/// Flat (exhaustive) inner-product index over normalized vectors.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    /// Row-major normalized vectors, `len * dimension` values.
    data: Vec<f32>,
    len: usize,
}

impl FlatIndex {
    /// Build an index over `vectors`. All vectors must share one non-zero dimension.
    pub fn build<'a, I>(vectors: I) -> Result<Self, MemoryError>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut dimension = None;
        let mut data = Vec::new();
        let mut len = 0;

        for vector in vectors {
            if vector.is_empty() {
                return Err(MemoryError::MalformedSnapshot(
                    "cannot index an empty vector".to_string(),
                ));
            }
            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(MemoryError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            data.extend(normalize(vector));
            len += 1;
        }

        Ok(Self {
            dimension: dimension.unwrap_or(0),
            data,
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `k` most similar corpus entries to `vector`, most similar first.
    ///
    /// `k` is clamped to the corpus size. Equal similarities are ordered by
    /// ascending corpus position.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>, MemoryError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if vector.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let query = normalize(vector);
        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(index, row)| Neighbor {
                index,
                similarity: dot(row, &query),
            })
            .collect();

        let k = k.min(self.len);
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, rank);
            hits.truncate(k);
        }
        hits.sort_unstable_by(rank);
        Ok(hits)
    }

    /// Answer one [`query`](Self::query) per input vector against this index.
    pub fn query_batch<'a, I>(&self, vectors: I, k: usize) -> Result<Vec<Vec<Neighbor>>, MemoryError>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        vectors
            .into_iter()
            .map(|vector| self.query(vector, k))
            .collect()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Descending similarity, then ascending position.
fn rank(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then(a.index.cmp(&b.index))
}

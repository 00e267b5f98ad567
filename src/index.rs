//! In-memory vector index using cosine similarity.
//!
//! Entries live in a `Vec` behind a `tokio::sync::RwLock`: queries take the
//! read lock and may run concurrently, while [`build`](VectorIndex::build)
//! and [`add`](VectorIndex::add) take the write lock, so readers observe
//! either the pre- or post-update index, never a partially written one.

use tokio::sync::RwLock;

use crate::document::{EmbeddedChunk, ScoredChunk};
use crate::error::{AssistantError, Result};

/// An in-memory vector index over embedded policy chunks.
///
/// Created with a fixed dimension; every inserted vector is checked against
/// it before any entry is written, so a bad batch can never corrupt the
/// index. Entries keep their insertion order, which breaks score ties in
/// query results.
#[derive(Debug)]
pub struct VectorIndex {
    dimensions: usize,
    entries: RwLock<Vec<EmbeddedChunk>>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, entries: RwLock::new(Vec::new()) }
    }

    /// The vector dimension this index was created with.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of entries currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the index holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Replace the index contents with the given chunks.
    ///
    /// Rebuilding with the same input yields an equivalent index.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::DimensionMismatch`] if any vector's length
    /// differs from the index dimension; the existing contents are untouched
    /// in that case.
    pub async fn build(&self, chunks: Vec<EmbeddedChunk>) -> Result<()> {
        self.check_dimensions(&chunks)?;
        let mut entries = self.entries.write().await;
        *entries = chunks;
        Ok(())
    }

    /// Append chunks to the index without touching existing entries.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::DimensionMismatch`] if any vector's length
    /// differs from the index dimension; nothing is appended in that case.
    pub async fn add(&self, chunks: Vec<EmbeddedChunk>) -> Result<()> {
        self.check_dimensions(&chunks)?;
        let mut entries = self.entries.write().await;
        entries.extend(chunks);
        Ok(())
    }

    /// Return up to `k` entries nearest to `vector` by cosine similarity.
    ///
    /// Results are ordered by descending score; equal scores keep insertion
    /// order. An empty index yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::InvalidQuery`] if `k == 0` and
    /// [`AssistantError::DimensionMismatch`] if the query vector's length
    /// differs from the index dimension.
    pub async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(AssistantError::InvalidQuery("k must be greater than zero".to_string()));
        }
        if vector.len() != self.dimensions {
            return Err(AssistantError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        let entries = self.entries.read().await;
        let mut scored = entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.vector, vector),
            })
            .collect::<Vec<_>>();

        // Stable sort: ties keep the original chunk order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn check_dimensions(&self, chunks: &[EmbeddedChunk]) -> Result<()> {
        for chunk in chunks {
            if chunk.vector.len() != self.dimensions {
                return Err(AssistantError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: chunk.vector.len(),
                });
            }
        }
        Ok(())
    }
}

/// Cosine similarity between two vectors; 0.0 if either has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

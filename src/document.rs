//! Data types for policy documents, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// A source policy document loaded from the corpus.
///
/// Immutable once loaded; one per corpus file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyDocument {
    /// Identifier of the source, normally the file name.
    pub source_id: String,
    /// The full text content of the document.
    pub text: String,
}

impl PolicyDocument {
    /// Create a document from a source identifier and its text.
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), text: text.into() }
    }
}

/// A bounded contiguous slice of a [`PolicyDocument`] used as a retrieval unit.
///
/// Consecutive chunks of the same document may share overlapping text at
/// their boundaries. `sequence_index` is strictly increasing within a source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk, including any overlap prefix.
    pub text: String,
    /// The `source_id` of the parent [`PolicyDocument`].
    pub source_id: String,
    /// Position of this chunk within its source document, starting at 0.
    pub sequence_index: usize,
}

/// A [`Chunk`] paired with its embedding vector.
///
/// Owned by the vector index; the vector length must equal the index
/// dimension, which is enforced on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    /// The underlying chunk.
    pub chunk: Chunk,
    /// The embedding vector for the chunk's text.
    pub vector: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a similarity score (higher is closer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity between the query vector and the chunk's vector.
    pub score: f32,
}

//! Configuration for the policy assistant.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AssistantError, Result};

/// Configuration parameters for ingestion, retrieval, and provider calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantConfig {
    /// Directory containing the policy documents.
    pub corpus_dir: PathBuf,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to retrieve per question.
    pub top_k: usize,
    /// Minimum similarity score for retrieved chunks (lower scores are dropped).
    pub similarity_threshold: f32,
    /// Deadline for a single embedding or completion call, in seconds.
    pub request_timeout_secs: u64,
    /// Model name used for embedding requests.
    pub embedding_model: String,
    /// Model name used for completion requests.
    pub completion_model: String,
    /// Optional cap on retained conversation turns (oldest evicted first).
    pub max_turns: Option<usize>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("docs/university_policies"),
            chunk_size: 512,
            chunk_overlap: 100,
            top_k: 4,
            similarity_threshold: 0.0,
            request_timeout_secs: 8,
            embedding_model: "text-embedding-3-small".to_string(),
            completion_model: "gpt-4o-mini".to_string(),
            max_turns: None,
        }
    }
}

impl AssistantConfig {
    /// Create a new builder for constructing an [`AssistantConfig`].
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder::default()
    }

    /// The provider call deadline as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for constructing a validated [`AssistantConfig`].
#[derive(Debug, Clone, Default)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    /// Set the corpus directory.
    pub fn corpus_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.corpus_dir = dir.into();
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks to retrieve per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for retrieved chunks.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the provider call deadline in seconds.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Set the embedding model name.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the completion model name.
    pub fn completion_model(mut self, model: impl Into<String>) -> Self {
        self.config.completion_model = model.into();
        self
    }

    /// Cap the number of retained conversation turns.
    pub fn max_turns(mut self, turns: usize) -> Self {
        self.config.max_turns = Some(turns);
        self
    }

    /// Build the [`AssistantConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `request_timeout_secs == 0`
    pub fn build(self) -> Result<AssistantConfig> {
        if self.config.chunk_size == 0 {
            return Err(AssistantError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(AssistantError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(AssistantError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.request_timeout_secs == 0 {
            return Err(AssistantError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

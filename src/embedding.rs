//! Embedding provider capability trait.

use async_trait::async_trait;

use crate::error::Result;

/// Maps text to fixed-length vectors for similarity search.
///
/// Implementations wrap a concrete embedding backend behind a unified async
/// interface, so deterministic stand-ins can be substituted in tests. The
/// default [`embed_batch`](EmbeddingProvider::embed_batch) calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends with a native
/// batch endpoint should override it. Both must preserve input order and
/// return one vector per input.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::ProviderUnavailable`](crate::AssistantError::ProviderUnavailable)
    /// when the backend cannot be reached or rejects the request, and
    /// [`AssistantError::ProviderTimeout`](crate::AssistantError::ProviderTimeout)
    /// when it misses the configured deadline.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// The fixed length of vectors produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short backend name used in logs and error messages.
    fn name(&self) -> &str;
}

//! Completion model capability trait.

use async_trait::async_trait;

use crate::error::Result;

/// A single-turn text completion backend used for grounded answer synthesis.
///
/// The synthesizer assembles the full grounded prompt (context, history,
/// question); implementations only transport it to a concrete model and
/// return the generated text verbatim.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Generate a completion for the given system instruction and prompt.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::ProviderUnavailable`](crate::AssistantError::ProviderUnavailable)
    /// when the backend cannot be reached or rejects the request, and
    /// [`AssistantError::ProviderTimeout`](crate::AssistantError::ProviderTimeout)
    /// when it misses the configured deadline.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Short backend name used in logs and error messages.
    fn name(&self) -> &str;
}

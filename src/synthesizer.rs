//! Grounded answer synthesis over retrieved policy chunks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::completion::CompletionModel;
use crate::document::ScoredChunk;
use crate::error::{AssistantError, Result};
use crate::memory::{ConversationTurn, Role};

/// Builds a grounded prompt from retrieved chunks and conversation history
/// and sends it to a [`CompletionModel`], returning the model text verbatim.
///
/// The completion call is wrapped in a deadline; a slow model surfaces as
/// [`AssistantError::ProviderTimeout`] so the caller can route to the
/// fallback answer path.
pub struct AnswerSynthesizer {
    model: Arc<dyn CompletionModel>,
    timeout: Duration,
}

impl AnswerSynthesizer {
    /// Create a synthesizer over the given completion model and deadline.
    pub fn new(model: Arc<dyn CompletionModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Synthesize an answer to `question` grounded in `retrieved` chunks.
    ///
    /// # Errors
    ///
    /// Propagates provider errors and maps a missed deadline to
    /// [`AssistantError::ProviderTimeout`].
    pub async fn answer(
        &self,
        question: &str,
        retrieved: &[ScoredChunk],
        history: &[ConversationTurn],
        current_time: DateTime<Utc>,
    ) -> Result<String> {
        let system = system_instruction(current_time);
        let prompt = grounded_prompt(question, retrieved, history);
        debug!(
            model = self.model.name(),
            context_chunks = retrieved.len(),
            history_turns = history.len(),
            "synthesizing grounded answer"
        );

        tokio::time::timeout(self.timeout, self.model.complete(&system, &prompt))
            .await
            .map_err(|_| AssistantError::ProviderTimeout {
                provider: self.model.name().to_string(),
                seconds: self.timeout.as_secs(),
            })?
    }
}

fn system_instruction(current_time: DateTime<Utc>) -> String {
    format!(
        "You are a university attendance policy assistant. The current date and time is {}. \
         Answer the student's question using only the policy excerpts provided. When the \
         excerpts contain policy section numbers (for example, Section 4.1), cite them in your \
         answer. If the excerpts do not cover the question, say so plainly instead of guessing.",
        current_time.format("%Y-%m-%d %H:%M UTC")
    )
}

fn grounded_prompt(
    question: &str,
    retrieved: &[ScoredChunk],
    history: &[ConversationTurn],
) -> String {
    let mut prompt = String::from("Policy excerpts:\n");
    if retrieved.is_empty() {
        prompt.push_str("(none retrieved)\n");
    }
    for scored in retrieved {
        prompt.push_str(&format!(
            "[{}#{}] {}\n",
            scored.chunk.source_id, scored.chunk.sequence_index, scored.chunk.text
        ));
    }

    if !history.is_empty() {
        prompt.push_str("\nConversation so far:\n");
        for turn in history {
            let speaker = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            prompt.push_str(&format!("{speaker}: {}\n", turn.content));
        }
    }

    prompt.push_str(&format!("\nQuestion: {question}\n"));
    prompt
}

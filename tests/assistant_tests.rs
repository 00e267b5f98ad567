//! End-to-end scenarios for the policy assistant, using deterministic
//! stand-ins for the embedding and completion backends.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use policy_assistant::{
    AnswerSynthesizer, AssistantConfig, AssistantError, AssistantState, CompletionModel,
    EmbeddingProvider, PolicyAssistant, Role,
};
use tokio::sync::Mutex;

const DIM: usize = 8;

/// Deterministic embedding provider: the vector depends only on the text.
struct StubEmbeddings;

#[async_trait]
impl EmbeddingProvider for StubEmbeddings {
    async fn embed(&self, text: &str) -> policy_assistant::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIM];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % DIM] += f32::from(byte) / 255.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "stub-embeddings"
    }
}

/// Completion model that records every prompt and replies with a fixed text.
struct RecordingModel {
    prompts: Mutex<Vec<String>>,
    reply: String,
}

impl RecordingModel {
    fn new(reply: &str) -> Self {
        Self { prompts: Mutex::new(Vec::new()), reply: reply.to_string() }
    }
}

#[async_trait]
impl CompletionModel for RecordingModel {
    async fn complete(&self, _system: &str, prompt: &str) -> policy_assistant::Result<String> {
        self.prompts.lock().await.push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording-model"
    }
}

/// Embedding provider that is always unreachable.
struct UnreachableEmbeddings;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbeddings {
    async fn embed(&self, _text: &str) -> policy_assistant::Result<Vec<f32>> {
        Err(AssistantError::ProviderUnavailable {
            provider: self.name().to_string(),
            message: "connection refused".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "unreachable-embeddings"
    }
}

/// Completion model that is always unreachable.
struct UnreachableModel;

#[async_trait]
impl CompletionModel for UnreachableModel {
    async fn complete(&self, _system: &str, _prompt: &str) -> policy_assistant::Result<String> {
        Err(AssistantError::ProviderUnavailable {
            provider: self.name().to_string(),
            message: "connection refused".to_string(),
        })
    }

    fn name(&self) -> &str {
        "unreachable-model"
    }
}

/// Embedding provider whose batch calls hang far past any deadline.
struct SlowBatchEmbeddings;

#[async_trait]
impl EmbeddingProvider for SlowBatchEmbeddings {
    async fn embed(&self, text: &str) -> policy_assistant::Result<Vec<f32>> {
        StubEmbeddings.embed(text).await
    }

    async fn embed_batch(&self, _texts: &[&str]) -> policy_assistant::Result<Vec<Vec<f32>>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "slow-batch-embeddings"
    }
}

/// Embedding provider that ingests promptly but hangs on single-text embeds,
/// so only question-time retrieval misses the deadline.
struct SlowQueryEmbeddings;

#[async_trait]
impl EmbeddingProvider for SlowQueryEmbeddings {
    async fn embed(&self, text: &str) -> policy_assistant::Result<Vec<f32>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        StubEmbeddings.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> policy_assistant::Result<Vec<Vec<f32>>> {
        StubEmbeddings.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "slow-query-embeddings"
    }
}

/// Completion model that hangs far past any deadline.
struct SlowModel;

#[async_trait]
impl CompletionModel for SlowModel {
    async fn complete(&self, _system: &str, _prompt: &str) -> policy_assistant::Result<String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too slow to matter".to_string())
    }

    fn name(&self) -> &str {
        "slow-model"
    }
}

/// Embedding provider that counts how many batch calls actually reach it.
struct CountingEmbeddings {
    batch_calls: AtomicUsize,
}

impl CountingEmbeddings {
    fn new() -> Self {
        Self { batch_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbeddings {
    async fn embed(&self, text: &str) -> policy_assistant::Result<Vec<f32>> {
        StubEmbeddings.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> policy_assistant::Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        StubEmbeddings.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "counting-embeddings"
    }
}

fn config_for(corpus_dir: &Path) -> AssistantConfig {
    AssistantConfig::builder()
        .corpus_dir(corpus_dir)
        .top_k(2)
        .request_timeout_secs(2)
        .build()
        .unwrap()
}

fn fallback_only_assistant(corpus_dir: &Path) -> PolicyAssistant {
    PolicyAssistant::builder().config(config_for(corpus_dir)).build().unwrap()
}

fn write_lateness_corpus(dir: &Path) {
    fs::write(
        dir.join("policy.txt"),
        "Section 4.1: arriving more than 15 minutes late counts as absence.",
    )
    .unwrap();
}

#[tokio::test]
async fn fallback_mode_answers_lateness_question_with_canned_text() {
    let temp = tempfile::tempdir().unwrap();
    write_lateness_corpus(temp.path());

    // No providers configured: first question lands in fallback mode.
    let assistant = fallback_only_assistant(temp.path());
    let answer = assistant.answer_question("What happens if I'm late?").await;

    assert!(answer.contains("15 minutes"));
    assert_eq!(assistant.state().await, AssistantState::FallbackMode);
}

#[tokio::test]
async fn answer_question_never_fails_without_provider_or_corpus() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("no_such_dir");

    let assistant = fallback_only_assistant(&missing);
    let outcome = assistant.initialize().await;
    assert!(!outcome.success);
    assert!(!outcome.message.is_empty());
    assert_eq!(assistant.state().await, AssistantState::FallbackMode);

    let answer = assistant.answer_question("Is attendance mandatory?").await;
    assert!(!answer.trim().is_empty());
}

#[tokio::test]
async fn two_questions_leave_four_turns_in_call_order() {
    let temp = tempfile::tempdir().unwrap();
    let assistant = fallback_only_assistant(temp.path());

    let first_answer = assistant.answer_question("What happens if I'm late?").await;
    let second_answer = assistant.answer_question("Can I appeal?").await;

    let history = assistant.history().await;
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "What happens if I'm late?");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, first_answer);
    assert_eq!(history[2].role, Role::User);
    assert_eq!(history[2].content, "Can I appeal?");
    assert_eq!(history[3].role, Role::Assistant);
    assert_eq!(history[3].content, second_answer);
}

#[tokio::test]
async fn ready_assistant_grounds_answers_in_retrieved_chunks() {
    let temp = tempfile::tempdir().unwrap();
    write_lateness_corpus(temp.path());

    let model = Arc::new(RecordingModel::new("Per Section 4.1, that counts as an absence."));
    let assistant = PolicyAssistant::builder()
        .config(config_for(temp.path()))
        .embedding_provider(Arc::new(StubEmbeddings))
        .completion_model(model.clone())
        .build()
        .unwrap();

    let outcome = assistant.initialize().await;
    assert!(outcome.success, "unexpected init failure: {}", outcome.message);
    assert!(outcome.message.contains("Indexed"));
    assert_eq!(assistant.state().await, AssistantState::Ready);

    let answer = assistant.answer_question("What happens if I'm late?").await;
    assert_eq!(answer, "Per Section 4.1, that counts as an absence.");

    // The model saw the retrieved policy text and the question.
    let prompts = model.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Section 4.1"));
    assert!(prompts[0].contains("Question: What happens if I'm late?"));
}

#[tokio::test]
async fn conversation_history_reaches_the_model_on_later_questions() {
    let temp = tempfile::tempdir().unwrap();
    write_lateness_corpus(temp.path());

    let model = Arc::new(RecordingModel::new("Grounded answer."));
    let assistant = PolicyAssistant::builder()
        .config(config_for(temp.path()))
        .embedding_provider(Arc::new(StubEmbeddings))
        .completion_model(model.clone())
        .build()
        .unwrap();

    assistant.initialize().await;
    assistant.answer_question("What happens if I'm late?").await;
    assistant.answer_question("And can I appeal that?").await;

    let prompts = model.prompts.lock().await;
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("user: What happens if I'm late?"));
    assert!(prompts[1].contains("assistant: Grounded answer."));
}

#[tokio::test]
async fn unreachable_providers_settle_in_fallback_mode() {
    let temp = tempfile::tempdir().unwrap();
    write_lateness_corpus(temp.path());

    let assistant = PolicyAssistant::builder()
        .config(config_for(temp.path()))
        .embedding_provider(Arc::new(UnreachableEmbeddings))
        .completion_model(Arc::new(UnreachableModel))
        .build()
        .unwrap();

    let outcome = assistant.initialize().await;
    assert!(!outcome.success);
    assert_eq!(assistant.state().await, AssistantState::FallbackMode);

    let answer = assistant.answer_question("What happens if I'm late?").await;
    assert!(answer.contains("15 minutes"));
}

#[tokio::test]
async fn completion_failure_mid_flight_falls_back_without_erroring() {
    let temp = tempfile::tempdir().unwrap();
    write_lateness_corpus(temp.path());

    // Embeddings work, so initialization succeeds; only answering fails.
    let assistant = PolicyAssistant::builder()
        .config(config_for(temp.path()))
        .embedding_provider(Arc::new(StubEmbeddings))
        .completion_model(Arc::new(UnreachableModel))
        .build()
        .unwrap();

    let outcome = assistant.initialize().await;
    assert!(outcome.success);

    let answer = assistant.answer_question("What happens if I'm late?").await;
    assert!(answer.contains("15 minutes"));
    assert_eq!(assistant.state().await, AssistantState::Ready);
}

#[tokio::test]
async fn missing_corpus_indexes_the_builtin_policy() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("no_such_dir");

    let model = Arc::new(RecordingModel::new("Grounded answer."));
    let assistant = PolicyAssistant::builder()
        .config(config_for(&missing))
        .embedding_provider(Arc::new(StubEmbeddings))
        .completion_model(model.clone())
        .build()
        .unwrap();

    let outcome = assistant.initialize().await;
    assert!(outcome.success, "unexpected init failure: {}", outcome.message);

    assistant.answer_question("What happens if I'm late?").await;
    let prompts = model.prompts.lock().await;
    assert!(prompts[0].contains("builtin_attendance_policy"));
}

#[tokio::test]
async fn reinitializing_after_fallback_can_recover() {
    let temp = tempfile::tempdir().unwrap();
    write_lateness_corpus(temp.path());

    let assistant = PolicyAssistant::builder()
        .config(config_for(temp.path()))
        .embedding_provider(Arc::new(StubEmbeddings))
        .completion_model(Arc::new(RecordingModel::new("Grounded answer.")))
        .build()
        .unwrap();

    // A ready assistant stays ready across explicit re-initialization.
    assert!(assistant.initialize().await.success);
    assert!(assistant.initialize().await.success);
    assert_eq!(assistant.state().await, AssistantState::Ready);
}

#[tokio::test(start_paused = true)]
async fn slow_embedding_batch_times_out_into_fallback_mode() {
    let temp = tempfile::tempdir().unwrap();
    write_lateness_corpus(temp.path());

    let assistant = PolicyAssistant::builder()
        .config(config_for(temp.path()))
        .embedding_provider(Arc::new(SlowBatchEmbeddings))
        .completion_model(Arc::new(RecordingModel::new("Grounded answer.")))
        .build()
        .unwrap();

    // The batch embed sleeps past the 2s deadline, so the build is cut off
    // and reported as a provider timeout rather than hanging.
    let outcome = assistant.initialize().await;
    assert!(!outcome.success);
    assert!(outcome.message.contains("Provider timeout"), "message: {}", outcome.message);
    assert_eq!(assistant.state().await, AssistantState::FallbackMode);

    let answer = assistant.answer_question("What happens if I'm late?").await;
    assert!(answer.contains("15 minutes"));
}

#[tokio::test(start_paused = true)]
async fn slow_query_embedding_times_out_into_canned_answer() {
    let temp = tempfile::tempdir().unwrap();
    write_lateness_corpus(temp.path());

    let assistant = PolicyAssistant::builder()
        .config(config_for(temp.path()))
        .embedding_provider(Arc::new(SlowQueryEmbeddings))
        .completion_model(Arc::new(RecordingModel::new("Grounded answer.")))
        .build()
        .unwrap();

    assert!(assistant.initialize().await.success);

    // Question-time embedding misses the deadline; the caller still gets the
    // canned answer and the assistant stays ready.
    let answer = assistant.answer_question("What happens if I'm late?").await;
    assert!(answer.contains("15 minutes"));
    assert_eq!(assistant.state().await, AssistantState::Ready);
}

#[tokio::test(start_paused = true)]
async fn slow_completion_times_out_into_canned_answer() {
    let temp = tempfile::tempdir().unwrap();
    write_lateness_corpus(temp.path());

    let assistant = PolicyAssistant::builder()
        .config(config_for(temp.path()))
        .embedding_provider(Arc::new(StubEmbeddings))
        .completion_model(Arc::new(SlowModel))
        .build()
        .unwrap();

    assert!(assistant.initialize().await.success);

    let answer = assistant.answer_question("What happens if I'm late?").await;
    assert!(answer.contains("15 minutes"));
    assert_eq!(assistant.state().await, AssistantState::Ready);
}

#[tokio::test(start_paused = true)]
async fn missed_completion_deadline_maps_to_provider_timeout() {
    let synthesizer = AnswerSynthesizer::new(Arc::new(SlowModel), Duration::from_secs(2));
    let result = synthesizer.answer("What happens if I'm late?", &[], &[], Utc::now()).await;
    assert!(matches!(
        result,
        Err(AssistantError::ProviderTimeout { seconds: 2, ref provider }) if provider == "slow-model"
    ));
}

#[tokio::test]
async fn rebuilds_reuse_cached_embeddings_and_drop_removed_text() {
    let temp = tempfile::tempdir().unwrap();
    let corpus = temp.path();
    let lateness = "Section 4.1: arriving more than 15 minutes late counts as absence.";
    fs::write(corpus.join("late.txt"), lateness).unwrap();

    let embeddings = Arc::new(CountingEmbeddings::new());
    let model = Arc::new(RecordingModel::new("Grounded answer."));
    let assistant = PolicyAssistant::builder()
        .config(config_for(corpus))
        .embedding_provider(embeddings.clone())
        .completion_model(model.clone())
        .build()
        .unwrap();

    assert!(assistant.initialize().await.success);
    assert_eq!(embeddings.batch_calls.load(Ordering::SeqCst), 1);

    // Unchanged corpus: the rebuild is served entirely from the cache, and
    // the cached vectors still retrieve the right chunk.
    assert!(assistant.initialize().await.success);
    assert_eq!(embeddings.batch_calls.load(Ordering::SeqCst), 1);
    assistant.answer_question("What happens if I'm late?").await;
    assert!(model.prompts.lock().await[0].contains("Section 4.1"));

    // Replacing the corpus embeds the new text and drops the old entry.
    fs::remove_file(corpus.join("late.txt")).unwrap();
    fs::write(corpus.join("appeals.txt"), "Section 6.1: appeals go to the department chair.")
        .unwrap();
    assert!(assistant.initialize().await.success);
    assert_eq!(embeddings.batch_calls.load(Ordering::SeqCst), 2);

    // Restoring the removed document needs a fresh embed, not a stale hit.
    fs::remove_file(corpus.join("appeals.txt")).unwrap();
    fs::write(corpus.join("late.txt"), lateness).unwrap();
    assert!(assistant.initialize().await.success);
    assert_eq!(embeddings.batch_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn clear_history_empties_the_session_memory() {
    let temp = tempfile::tempdir().unwrap();
    let assistant = fallback_only_assistant(temp.path());

    assistant.answer_question("What happens if I'm late?").await;
    assert_eq!(assistant.history().await.len(), 2);

    assistant.clear_history().await;
    assert!(assistant.history().await.is_empty());
}

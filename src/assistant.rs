//! The policy assistant orchestrator.
//!
//! [`PolicyAssistant`] owns the full ingest-and-answer workflow: corpus
//! loading, chunking, embedding, indexing, retrieval, grounded synthesis,
//! and conversation memory. Its public surface is two operations,
//! [`initialize`](PolicyAssistant::initialize) and
//! [`answer_question`](PolicyAssistant::answer_question), and the latter
//! never fails: any pipeline problem degrades to the canned fallback path.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::chunking::SeparatorChunker;
use crate::completion::CompletionModel;
use crate::config::AssistantConfig;
use crate::corpus::{default_policy_document, load_corpus};
use crate::document::{Chunk, EmbeddedChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{AssistantError, Result};
use crate::fallback::fallback_answer;
use crate::index::VectorIndex;
use crate::memory::{ConversationMemory, ConversationTurn, Role};
use crate::openai::{API_KEY_ENV, OpenAiCompletions, OpenAiEmbeddings};
use crate::synthesizer::AnswerSynthesizer;

/// Lifecycle state of the assistant.
///
/// `Ready` and `FallbackMode` are both stable: the assistant never leaves
/// `FallbackMode` on its own, but a caller may invoke
/// [`initialize`](PolicyAssistant::initialize) again to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantState {
    /// No initialization attempt has been made yet.
    Uninitialized,
    /// An initialization attempt is in progress.
    Initializing,
    /// The retrieval pipeline is built and answering questions.
    Ready,
    /// Initialization failed; questions get canned fallback answers.
    FallbackMode,
}

/// Result of an [`initialize`](PolicyAssistant::initialize) attempt.
#[derive(Debug, Clone)]
pub struct InitOutcome {
    /// Whether the retrieval pipeline came up.
    pub success: bool,
    /// A human-readable summary of what happened.
    pub message: String,
}

/// The retrieval half of the assistant, present only when providers are
/// configured.
struct Engine {
    embeddings: Arc<dyn EmbeddingProvider>,
    synthesizer: AnswerSynthesizer,
    index: VectorIndex,
}

/// Retrieval-augmented assistant for attendance policy questions.
///
/// One instance serves one interactive session and owns that session's
/// conversation memory. Construct via [`builder()`](PolicyAssistant::builder)
/// with explicit providers, or [`from_env()`](PolicyAssistant::from_env) to
/// wire up the OpenAI backends from the `OPENAI_API_KEY` environment
/// variable (its absence yields a fallback-only assistant, not an error).
pub struct PolicyAssistant {
    config: AssistantConfig,
    chunker: SeparatorChunker,
    engine: Option<Engine>,
    memory: Mutex<ConversationMemory>,
    embed_cache: Mutex<HashMap<[u8; 32], Vec<f32>>>,
    state: RwLock<AssistantState>,
}

impl PolicyAssistant {
    /// Create a new [`PolicyAssistantBuilder`].
    pub fn builder() -> PolicyAssistantBuilder {
        PolicyAssistantBuilder::default()
    }

    /// Build an assistant with OpenAI providers from the environment.
    ///
    /// A missing or empty `OPENAI_API_KEY` is not an error: the assistant is
    /// built without providers and will settle in
    /// [`AssistantState::FallbackMode`] on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the configuration is invalid.
    pub fn from_env(config: AssistantConfig) -> Result<Self> {
        let mut builder = Self::builder();
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => {
                let timeout = config.request_timeout();
                let embeddings =
                    OpenAiEmbeddings::new(key.clone(), &config.embedding_model, timeout)?;
                let completions =
                    OpenAiCompletions::new(key, &config.completion_model, timeout)?;
                builder = builder
                    .embedding_provider(Arc::new(embeddings))
                    .completion_model(Arc::new(completions));
            }
            _ => {
                warn!("{API_KEY_ENV} is not set; assistant will use fallback answers only");
            }
        }
        builder.config(config).build()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// The current lifecycle state.
    pub async fn state(&self) -> AssistantState {
        *self.state.read().await
    }

    /// Snapshot of the session's conversation turns, oldest first.
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.memory.lock().await.history().to_vec()
    }

    /// Discard the session's conversation memory.
    pub async fn clear_history(&self) {
        self.memory.lock().await.clear();
    }

    /// Build (or rebuild) the retrieval pipeline.
    ///
    /// On any failure (missing credential, unreachable provider, dimension
    /// mismatch) the assistant enters [`AssistantState::FallbackMode`] and
    /// keeps answering from the canned fallback path. An empty or missing
    /// corpus alone is not a failure: the built-in sample policy is indexed
    /// instead.
    pub async fn initialize(&self) -> InitOutcome {
        *self.state.write().await = AssistantState::Initializing;

        match self.build_index().await {
            Ok(message) => {
                *self.state.write().await = AssistantState::Ready;
                info!(message = %message, "assistant ready");
                InitOutcome { success: true, message }
            }
            Err(e) => {
                *self.state.write().await = AssistantState::FallbackMode;
                warn!(error = %e, "initialization failed, entering fallback mode");
                InitOutcome {
                    success: false,
                    message: format!("Initialization failed: {e}. Canned policy answers remain available."),
                }
            }
        }
    }

    /// Answer a question about the attendance policy.
    ///
    /// Never fails and never returns empty text. In `Ready` state the full
    /// retrieval pipeline is used; in `FallbackMode` (or when the pipeline
    /// errors mid-flight) the canned keyword-matched answer is returned. The
    /// question and answer are appended to the conversation memory as two
    /// turns, user first.
    pub async fn answer_question(&self, question: &str) -> String {
        if *self.state.read().await == AssistantState::Uninitialized {
            self.initialize().await;
        }

        let answer = if *self.state.read().await == AssistantState::Ready {
            match self.grounded_answer(question).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!("model returned empty text, using fallback answer");
                    fallback_answer(question)
                }
                Err(e) => {
                    warn!(error = %e, "retrieval pipeline failed, using fallback answer");
                    fallback_answer(question)
                }
            }
        } else {
            fallback_answer(question)
        };

        let mut memory = self.memory.lock().await;
        memory.append(ConversationTurn::now(Role::User, question));
        memory.append(ConversationTurn::now(Role::Assistant, answer.clone()));
        answer
    }

    /// Chunk, embed, and index the corpus (or the built-in sample policy).
    async fn build_index(&self) -> Result<String> {
        let engine = self.require_engine()?;

        let documents = match load_corpus(&self.config.corpus_dir) {
            Ok(documents) => documents,
            Err(AssistantError::EmptyCorpus) => {
                info!("corpus unavailable, indexing the built-in sample policy");
                vec![default_policy_document()]
            }
            Err(e) => return Err(e),
        };

        let mut chunks = Vec::new();
        for document in &documents {
            chunks.extend(self.chunker.split(document));
        }

        let chunk_count = chunks.len();
        let embedded = self.embed_chunks(engine, chunks).await?;
        engine.index.build(embedded).await?;

        Ok(format!("Indexed {chunk_count} policy chunks from {} documents", documents.len()))
    }

    /// Embed chunks, reusing cached vectors for unchanged chunk text.
    ///
    /// After each build the cache holds exactly the keys of that build, so
    /// entries for text removed from the corpus do not accumulate across
    /// rebuilds.
    async fn embed_chunks(&self, engine: &Engine, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>> {
        let keys = chunks.iter().map(|c| content_hash(&c.text)).collect::<Vec<_>>();
        let mut cache = self.embed_cache.lock().await;

        let mut vectors = keys.iter().map(|key| cache.get(key).cloned()).collect::<Vec<_>>();
        let missing = vectors
            .iter()
            .enumerate()
            .filter(|(_, vector)| vector.is_none())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        if !missing.is_empty() {
            let texts = missing.iter().map(|&i| chunks[i].text.as_str()).collect::<Vec<_>>();
            let fresh = self
                .with_deadline(engine.embeddings.name(), engine.embeddings.embed_batch(&texts))
                .await?;

            if fresh.len() != texts.len() {
                return Err(AssistantError::ProviderUnavailable {
                    provider: engine.embeddings.name().to_string(),
                    message: format!(
                        "provider returned {} vectors for {} inputs",
                        fresh.len(),
                        texts.len()
                    ),
                });
            }

            let expected = engine.embeddings.dimensions();
            for (&i, vector) in missing.iter().zip(fresh) {
                if vector.len() != expected {
                    return Err(AssistantError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                cache.insert(keys[i], vector.clone());
                vectors[i] = Some(vector);
            }
        } else {
            info!(chunk_count = chunks.len(), "all chunk embeddings served from cache");
        }

        // Keep only this build's entries.
        let keep = keys.iter().copied().collect::<HashSet<_>>();
        cache.retain(|key, _| keep.contains(key));

        let mut embedded = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            let Some(vector) = vector else {
                return Err(AssistantError::ProviderUnavailable {
                    provider: engine.embeddings.name().to_string(),
                    message: "embedding missing for an indexed chunk".to_string(),
                });
            };
            embedded.push(EmbeddedChunk { chunk, vector });
        }
        Ok(embedded)
    }

    /// Run the full embed → retrieve → synthesize path for one question.
    async fn grounded_answer(&self, question: &str) -> Result<String> {
        let engine = self.require_engine()?;

        let vector = self
            .with_deadline(engine.embeddings.name(), engine.embeddings.embed(question))
            .await?;
        let retrieved = engine.index.query(&vector, self.config.top_k).await?;
        let retrieved = retrieved
            .into_iter()
            .filter(|r| r.score >= self.config.similarity_threshold)
            .collect::<Vec<_>>();

        let history = self.memory.lock().await.history().to_vec();
        engine.synthesizer.answer(question, &retrieved, &history, Utc::now()).await
    }

    fn require_engine(&self) -> Result<&Engine> {
        self.engine.as_ref().ok_or_else(|| AssistantError::ProviderUnavailable {
            provider: "openai".to_string(),
            message: format!("no API credential configured (set {API_KEY_ENV})"),
        })
    }

    /// Apply the configured deadline to a provider call.
    async fn with_deadline<T>(
        &self,
        provider: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.config.request_timeout(), call).await.map_err(|_| {
            AssistantError::ProviderTimeout {
                provider: provider.to_string(),
                seconds: self.config.request_timeout_secs,
            }
        })?
    }
}

fn content_hash(text: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.finalize().into()
}

/// Builder for constructing a [`PolicyAssistant`].
///
/// Providers are optional but must be given together: an assistant built
/// without them only ever serves fallback answers.
#[derive(Default)]
pub struct PolicyAssistantBuilder {
    config: Option<AssistantConfig>,
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    model: Option<Arc<dyn CompletionModel>>,
}

impl PolicyAssistantBuilder {
    /// Set the assistant configuration.
    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings = Some(provider);
        self
    }

    /// Set the completion model.
    pub fn completion_model(mut self, model: Arc<dyn CompletionModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Build the [`PolicyAssistant`].
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the configuration is missing or
    /// invalid, or if only one of the two providers was supplied.
    pub fn build(self) -> Result<PolicyAssistant> {
        let config =
            self.config.ok_or_else(|| AssistantError::Config("config is required".to_string()))?;
        let chunker = SeparatorChunker::new(config.chunk_size, config.chunk_overlap)?;

        let engine = match (self.embeddings, self.model) {
            (Some(embeddings), Some(model)) => Some(Engine {
                index: VectorIndex::new(embeddings.dimensions()),
                synthesizer: AnswerSynthesizer::new(model, config.request_timeout()),
                embeddings,
            }),
            (None, None) => None,
            _ => {
                return Err(AssistantError::Config(
                    "embedding provider and completion model must be configured together"
                        .to_string(),
                ));
            }
        };

        let memory = match config.max_turns {
            Some(cap) => ConversationMemory::with_max_turns(cap),
            None => ConversationMemory::new(),
        };

        Ok(PolicyAssistant {
            config,
            chunker,
            engine,
            memory: Mutex::new(memory),
            embed_cache: Mutex::new(HashMap::new()),
            state: RwLock::new(AssistantState::Uninitialized),
        })
    }
}

//! # policy-assistant
//!
//! Retrieval-augmented question answering over university attendance policy
//! documents, with a deterministic fallback mode that never fails.
//!
//! ## Overview
//!
//! At build time, documents from a corpus directory are chunked, embedded,
//! and stored in an in-memory vector index. At question time, the question
//! is embedded, the nearest chunks are retrieved, and a completion model
//! synthesizes a grounded answer with the session's conversation history as
//! context. When any of that is unavailable (no API credential, provider
//! unreachable or slow) the assistant degrades to canned, citation-bearing
//! answers matched by keyword, so the caller always gets text back.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use policy_assistant::{AssistantConfig, PolicyAssistant};
//!
//! let config = AssistantConfig::builder()
//!     .corpus_dir("docs/university_policies")
//!     .build()?;
//! let assistant = PolicyAssistant::from_env(config)?;
//!
//! let outcome = assistant.initialize().await;
//! println!("{}", outcome.message);
//!
//! let answer = assistant.answer_question("What happens if I'm late?").await;
//! println!("{answer}");
//! ```
//!
//! The two operations the surrounding presentation layer depends on are
//! [`PolicyAssistant::initialize`] and [`PolicyAssistant::answer_question`].
//!
//! ## Testing
//!
//! The embedding and completion backends sit behind the
//! [`EmbeddingProvider`] and [`CompletionModel`] traits, so deterministic
//! stand-ins can be swapped in via [`PolicyAssistant::builder`].

pub mod assistant;
pub mod chunking;
pub mod completion;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fallback;
pub mod index;
pub mod memory;
pub mod openai;
pub mod synthesizer;

pub use assistant::{AssistantState, InitOutcome, PolicyAssistant, PolicyAssistantBuilder};
pub use chunking::SeparatorChunker;
pub use completion::CompletionModel;
pub use config::{AssistantConfig, AssistantConfigBuilder};
pub use corpus::{DEFAULT_POLICY_TEXT, default_policy_document, load_corpus};
pub use document::{Chunk, EmbeddedChunk, PolicyDocument, ScoredChunk};
pub use embedding::EmbeddingProvider;
pub use error::{AssistantError, Result};
pub use fallback::fallback_answer;
pub use index::VectorIndex;
pub use memory::{ConversationMemory, ConversationTurn, Role};
pub use openai::{OpenAiCompletions, OpenAiEmbeddings};
pub use synthesizer::AnswerSynthesizer;

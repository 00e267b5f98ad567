//! Error types for the `policy-assistant` crate.

use thiserror::Error;

/// Errors that can occur while ingesting, indexing, or answering.
///
/// Every variant here is recoverable from the caller's point of view except
/// [`DimensionMismatch`](AssistantError::DimensionMismatch), which aborts an
/// index build rather than corrupt it. None of them reach the end user: the
/// orchestrator converts failures into the canned fallback answer path.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The corpus directory is missing or contains no readable documents.
    #[error("no readable policy documents found in corpus")]
    EmptyCorpus,

    /// An external provider could not be reached or returned an error status.
    #[error("Provider unavailable ({provider}): {message}")]
    ProviderUnavailable {
        /// The backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An external provider call exceeded the configured deadline.
    #[error("Provider timeout ({provider}): no response within {seconds}s")]
    ProviderTimeout {
        /// The backend that timed out.
        provider: String,
        /// The deadline that was exceeded, in seconds.
        seconds: u64,
    },

    /// An embedding vector's length did not match the index dimension.
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension the index was created with.
        expected: usize,
        /// The dimension of the offending vector.
        actual: usize,
    },

    /// A corpus file could not be read or decoded.
    #[error("Malformed document '{path}': {message}")]
    MalformedDocument {
        /// Path of the offending file.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// An invalid retrieval parameter, such as `k == 0`.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;

//! Error types for the CareGuide domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! The pipeline surfaces provider and retrieval failures through `Error`;
//! the other bounded contexts report their own error types directly.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all CareGuide operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Query embedding failed: {0}")]
    Embedding(String),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Embedding dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Log file is corrupted: {0}")]
    Corrupted(String),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio support is disabled")]
    Disabled,

    #[error("Speech capability failed: {0}")]
    Capability(String),

    #[error("Speech {operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    #[error("Audio artifact is empty or missing: {}", path.display())]
    EmptyArtifact { path: PathBuf },

    #[error("Audio storage error: {0}")]
    Storage(String),

    #[error("Invalid audio file name: {0}")]
    InvalidFilename(String),

    #[error("Nothing to synthesize after cleaning the text")]
    EmptyText,
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge source {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("Knowledge source {} produced no chunks", path.display())]
    EmptySource { path: PathBuf },

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Index cache error: {0}")]
    Cache(String),
}

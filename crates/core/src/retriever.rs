//! Retriever trait: the knowledge lookup capability.
//!
//! Given the caregiver's raw question, a retriever returns the most
//! relevant passages of the knowledge base, best first.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::RetrievalError;

/// A passage returned by a retriever. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// The passage text
    pub text: String,

    /// 1-based relevance rank (1 = most relevant)
    pub rank: usize,

    /// Similarity score reported by the index
    #[serde(default)]
    pub score: f32,
}

/// The core Retriever trait.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// A human-readable name for this retriever.
    fn name(&self) -> &str;

    /// Return at most `k` passages relevant to `query`, ordered by rank.
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<RetrievedPassage>, RetrievalError>;
}

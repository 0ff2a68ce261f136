//! `Retriever` over the knowledge index.

use async_trait::async_trait;
use careguide_core::error::RetrievalError;
use careguide_core::provider::Provider;
use careguide_core::retriever::{RetrievedPassage, Retriever};
use std::sync::Arc;
use tracing::debug;

use crate::index::{KnowledgeBase, embed_texts};
use crate::vector::vector_search;

/// Embeds the query with the same model the index was built with and
/// returns the nearest chunks.
pub struct KnowledgeRetriever {
    base: Arc<KnowledgeBase>,
    embedder: Arc<dyn Provider>,
}

impl KnowledgeRetriever {
    pub fn new(base: Arc<KnowledgeBase>, embedder: Arc<dyn Provider>) -> Self {
        Self { base, embedder }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.base
    }
}

#[async_trait]
impl Retriever for KnowledgeRetriever {
    fn name(&self) -> &str {
        "knowledge"
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        if self.base.is_empty() {
            return Err(RetrievalError::IndexUnavailable("knowledge index is empty".into()));
        }

        let mut vectors = embed_texts(
            self.embedder.as_ref(),
            self.base.embedding_model(),
            &[query.to_string()],
        )
        .await
        .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let query_embedding = vectors
            .pop()
            .ok_or_else(|| RetrievalError::Embedding("no embedding returned".into()))?;

        if query_embedding.len() != self.base.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.base.dimension(),
                actual: query_embedding.len(),
            });
        }

        let passages = vector_search(self.base.chunks(), &query_embedding, k);
        debug!(k, found = passages.len(), "Retrieved passages");
        Ok(passages)
    }
}

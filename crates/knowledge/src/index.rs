//! The in-memory knowledge index and its build procedure.
//!
//! Building reads the source document, splits it, embeds every chunk and
//! persists a snapshot. A valid snapshot whose fingerprint matches the
//! current source and parameters is loaded instead of rebuilding.

use careguide_config::KnowledgeConfig;
use careguide_core::error::{KnowledgeError, ProviderError};
use careguide_core::provider::{EmbeddingRequest, Provider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::cache::SnapshotCache;
use crate::chunker::TextSplitter;

/// Bumped whenever the snapshot layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Texts per `/embeddings` call.
const EMBED_BATCH_SIZE: usize = 64;

/// One chunk of the source document with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// The persisted form of the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub format_version: u32,
    /// SHA-256 over the document and the indexing parameters
    pub fingerprint: String,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub created_at: DateTime<Utc>,
    pub chunks: Vec<IndexedChunk>,
}

impl IndexSnapshot {
    /// Embedding dimension, taken from the first chunk.
    pub fn dimension(&self) -> usize {
        self.chunks.first().map(|c| c.embedding.len()).unwrap_or(0)
    }

    /// Check that the snapshot is usable for `expected_fingerprint`.
    pub fn validate(&self, expected_fingerprint: &str) -> Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "format version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.fingerprint != expected_fingerprint {
            return Err("source or parameters changed".into());
        }
        if self.chunks.is_empty() {
            return Err("snapshot has no chunks".into());
        }
        let dim = self.dimension();
        if dim == 0 || self.chunks.iter().any(|c| c.embedding.len() != dim) {
            return Err("inconsistent embedding dimensions".into());
        }
        Ok(())
    }
}

/// Fingerprint of a source document under the given indexing parameters.
pub fn fingerprint(
    document: &[u8],
    chunk_size: usize,
    chunk_overlap: usize,
    embedding_model: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document);
    hasher.update(chunk_size.to_le_bytes());
    hasher.update(chunk_overlap.to_le_bytes());
    hasher.update(embedding_model.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Embed `texts` in batches, preserving order.
pub async fn embed_texts(
    embedder: &dyn Provider,
    model: &str,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, ProviderError> {
    let mut embeddings = Vec::with_capacity(texts.len());

    for batch in texts.chunks(EMBED_BATCH_SIZE) {
        let response = embedder
            .embed(EmbeddingRequest {
                model: model.to_string(),
                inputs: batch.to_vec(),
            })
            .await?;

        if response.embeddings.len() != batch.len() {
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                ),
            });
        }
        embeddings.extend(response.embeddings);
    }

    Ok(embeddings)
}

/// The loaded knowledge index. Immutable once built.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    snapshot: IndexSnapshot,
    from_cache: bool,
}

impl KnowledgeBase {
    /// Load the cached snapshot if it matches the source, otherwise rebuild.
    pub async fn load_or_build(
        config: &KnowledgeConfig,
        embedder: &dyn Provider,
    ) -> Result<Self, KnowledgeError> {
        let document = read_source(&config.source_path).await?;
        let fp = fingerprint(
            document.as_bytes(),
            config.chunk_size,
            config.chunk_overlap,
            &config.embedding_model,
        );

        let cache = SnapshotCache::new(config.snapshot_dir());
        if let Some(snapshot) = cache.load(&fp).await {
            info!(
                chunks = snapshot.chunks.len(),
                path = %cache.path().display(),
                "Loaded knowledge index from cache"
            );
            return Ok(Self {
                snapshot,
                from_cache: true,
            });
        }

        Self::build_and_save(config, &document, fp, embedder, &cache).await
    }

    /// Rebuild from the source, ignoring any cached snapshot.
    pub async fn rebuild(
        config: &KnowledgeConfig,
        embedder: &dyn Provider,
    ) -> Result<Self, KnowledgeError> {
        let document = read_source(&config.source_path).await?;
        let fp = fingerprint(
            document.as_bytes(),
            config.chunk_size,
            config.chunk_overlap,
            &config.embedding_model,
        );
        let cache = SnapshotCache::new(config.snapshot_dir());
        Self::build_and_save(config, &document, fp, embedder, &cache).await
    }

    async fn build_and_save(
        config: &KnowledgeConfig,
        document: &str,
        fingerprint: String,
        embedder: &dyn Provider,
        cache: &SnapshotCache,
    ) -> Result<Self, KnowledgeError> {
        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
        let texts = splitter.split(document);
        if texts.is_empty() {
            return Err(KnowledgeError::EmptySource {
                path: config.source_path.clone(),
            });
        }

        info!(
            chunks = texts.len(),
            model = %config.embedding_model,
            "Building knowledge index"
        );

        let embeddings = embed_texts(embedder, &config.embedding_model, &texts)
            .await
            .map_err(|e| KnowledgeError::EmbeddingFailed(e.to_string()))?;

        let chunks: Vec<IndexedChunk> = texts
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexedChunk { text, embedding })
            .collect();

        let snapshot = IndexSnapshot {
            format_version: FORMAT_VERSION,
            fingerprint,
            embedding_model: config.embedding_model.clone(),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            created_at: Utc::now(),
            chunks,
        };

        snapshot
            .validate(&snapshot.fingerprint)
            .map_err(KnowledgeError::EmbeddingFailed)?;

        if let Err(e) = cache.save(&snapshot).await {
            warn!(error = %e, "Could not persist knowledge index; continuing in memory");
        } else {
            debug!(path = %cache.path().display(), "Knowledge index saved");
        }

        Ok(Self {
            snapshot,
            from_cache: false,
        })
    }

    /// Wrap an existing snapshot.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Self {
        Self {
            snapshot,
            from_cache: false,
        }
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.snapshot.chunks
    }

    pub fn len(&self) -> usize {
        self.snapshot.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.snapshot.dimension()
    }

    pub fn fingerprint(&self) -> &str {
        &self.snapshot.fingerprint
    }

    pub fn embedding_model(&self) -> &str {
        &self.snapshot.embedding_model
    }

    /// Whether this index came from a cached snapshot.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }
}

async fn read_source(path: &Path) -> Result<String, KnowledgeError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| KnowledgeError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

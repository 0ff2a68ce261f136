//! Vector similarity search over the flat chunk index.

use careguide_core::retriever::RetrievedPassage;

use crate::index::IndexedChunk;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank chunks by cosine similarity to a query embedding.
///
/// Returns at most `limit` passages, most similar first, with 1-based ranks.
/// Ties keep index order so results are stable across runs.
pub fn vector_search(
    chunks: &[IndexedChunk],
    query_embedding: &[f32],
    limit: usize,
) -> Vec<RetrievedPassage> {
    let mut scored: Vec<(usize, f32)> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| (i, cosine_similarity(&chunk.embedding, query_embedding)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    scored
        .into_iter()
        .enumerate()
        .map(|(rank, (i, score))| RetrievedPassage {
            text: chunks[i].text.clone(),
            rank: rank + 1,
            score,
        })
        .collect()
}

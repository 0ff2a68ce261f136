//! Knowledge base for CareGuide.
//!
//! The caregiver manual is split into overlapping chunks, embedded once,
//! and kept as a flat cosine index. Snapshots are cached on disk keyed by a
//! fingerprint of the source and the indexing parameters.

pub mod cache;
pub mod chunker;
pub mod index;
pub mod retriever;
pub mod vector;

pub use cache::SnapshotCache;
pub use chunker::TextSplitter;
pub use index::{IndexSnapshot, IndexedChunk, KnowledgeBase};
pub use retriever::KnowledgeRetriever;
pub use vector::{cosine_similarity, vector_search};

//! ConversationLog trait: append-only store of completed exchanges.
//!
//! Writes only ever append; reads are always bounded by a limit so the
//! prompt never grows with the lifetime of the log.

use async_trait::async_trait;
use crate::error::LogError;
use crate::exchange::Exchange;

/// The core ConversationLog trait.
///
/// Implementations: JSON file (production), in-memory (tests, ephemeral runs).
#[async_trait]
pub trait ConversationLog: Send + Sync {
    /// The backend name (e.g., "json_file", "in_memory").
    fn name(&self) -> &str;

    /// Append one exchange at the end of the log.
    async fn append(&self, exchange: Exchange) -> std::result::Result<(), LogError>;

    /// The last `limit` exchanges, oldest first.
    async fn recent(&self, limit: usize) -> std::result::Result<Vec<Exchange>, LogError>;

    /// Total number of logged exchanges.
    async fn count(&self) -> std::result::Result<usize, LogError>;
}

/// Slice the tail of an ordered history, keeping chronological order.
pub fn tail(entries: &[Exchange], limit: usize) -> &[Exchange] {
    let start = entries.len().saturating_sub(limit);
    &entries[start..]
}

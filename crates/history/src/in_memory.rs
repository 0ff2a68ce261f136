//! In-memory log: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use careguide_core::error::LogError;
use careguide_core::exchange::Exchange;
use careguide_core::history::{ConversationLog, tail};
use tokio::sync::RwLock;

/// A conversation log held in a Vec. Lost on restart.
#[derive(Default)]
pub struct InMemoryLog {
    entries: RwLock<Vec<Exchange>>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing exchanges, oldest first.
    pub fn with_entries(entries: Vec<Exchange>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Every logged exchange, oldest first.
    pub async fn all(&self) -> Vec<Exchange> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl ConversationLog for InMemoryLog {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, exchange: Exchange) -> Result<(), LogError> {
        self.entries.write().await.push(exchange);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Exchange>, LogError> {
        let entries = self.entries.read().await;
        Ok(tail(&entries, limit).to_vec())
    }

    async fn count(&self) -> Result<usize, LogError> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_and_count() {
        let log = InMemoryLog::new();
        log.append(Exchange::now("q", "a", true)).await.unwrap();
        log.append(Exchange::now("q2", "a2", false)).await.unwrap();
        assert_eq!(log.count().await.unwrap(), 2);
        assert!(!log.all().await[1].was_safe);
    }

    #[tokio::test]
    async fn recent_is_bounded() {
        let log = InMemoryLog::with_entries(
            (0..3).map(|i| Exchange::now(format!("q{i}"), "a", true)).collect(),
        );
        let recent = log.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].user_text, "q1");
    }
}

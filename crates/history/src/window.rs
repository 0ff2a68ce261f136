//! History window: the recent transcript injected into each prompt.

use careguide_core::exchange::Exchange;
use careguide_core::history::ConversationLog;
use std::sync::Arc;
use tracing::warn;

/// Rendered in place of the transcript when there is no prior conversation.
pub const NO_HISTORY: &str = "Nenhuma conversa anterior.";

const USER_LABEL: &str = "Usuário";
const ASSISTANT_LABEL: &str = "Assistente";

/// A recency-bounded view over a [`ConversationLog`].
#[derive(Clone)]
pub struct HistoryWindow {
    log: Arc<dyn ConversationLog>,
    limit: usize,
}

impl HistoryWindow {
    pub fn new(log: Arc<dyn ConversationLog>, limit: usize) -> Self {
        Self { log, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn log(&self) -> &Arc<dyn ConversationLog> {
        &self.log
    }

    /// The last `limit` exchanges, oldest first.
    ///
    /// An unreadable log yields an empty window so the turn can still be
    /// answered without context.
    pub async fn recent(&self) -> Vec<Exchange> {
        match self.log.recent(self.limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(log = self.log.name(), error = %e, "History unavailable; continuing without it");
                Vec::new()
            }
        }
    }

    /// Format exchanges as an alternating transcript.
    pub fn render(entries: &[Exchange]) -> String {
        if entries.is_empty() {
            return NO_HISTORY.to_string();
        }

        entries
            .iter()
            .flat_map(|e| {
                [
                    format!("{USER_LABEL}: {}", e.user_text),
                    format!("{ASSISTANT_LABEL}: {}", e.assistant_text),
                ]
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryLog, JsonFileLog};

    #[test]
    fn empty_history_renders_sentinel() {
        assert_eq!(HistoryWindow::render(&[]), "Nenhuma conversa anterior.");
    }

    #[test]
    fn renders_alternating_lines() {
        let entries = vec![
            Exchange::now("Ele não dorme", "Evite cafeína à tarde.", true),
            Exchange::now("E à noite?", "Luz baixa e silêncio.", true),
        ];
        assert_eq!(
            HistoryWindow::render(&entries),
            "Usuário: Ele não dorme\nAssistente: Evite cafeína à tarde.\nUsuário: E à noite?\nAssistente: Luz baixa e silêncio."
        );
    }

    #[tokio::test]
    async fn window_is_bounded_to_limit() {
        let log = Arc::new(InMemoryLog::with_entries(
            (0..8).map(|i| Exchange::now(format!("q{i}"), format!("a{i}"), true)).collect(),
        ));
        let window = HistoryWindow::new(log, 5);
        let recent = window.recent().await;
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].user_text, "q3");
        assert_eq!(recent[4].user_text, "q7");
    }

    #[tokio::test]
    async fn unreadable_log_yields_empty_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, "not json").unwrap();

        let window = HistoryWindow::new(Arc::new(JsonFileLog::new(path)), 5);
        assert!(window.recent().await.is_empty());
        assert_eq!(HistoryWindow::render(&window.recent().await), NO_HISTORY);
    }
}

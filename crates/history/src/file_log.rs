//! JSON file conversation log.
//!
//! The file holds a single pretty-printed JSON array of exchanges, the same
//! layout earlier deployments wrote, so existing logs keep working.
//!
//! Appends are serialized through a mutex and land through a temp file plus
//! rename, so concurrent turns in one process never lose an entry and
//! readers never observe a half-written file. A log that fails to parse is
//! reported as corrupted and is never overwritten.

use async_trait::async_trait;
use careguide_core::error::LogError;
use careguide_core::exchange::Exchange;
use careguide_core::history::{ConversationLog, tail};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

pub struct JsonFileLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole log. A missing or blank file is an empty log.
    async fn read_all(&self) -> Result<Vec<Exchange>, LogError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LogError::Storage(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| LogError::Corrupted(format!("{}: {e}", self.path.display())))
    }

    async fn write_all(&self, entries: &[Exchange]) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LogError::Storage(format!("Failed to create log directory: {e}"))
            })?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| LogError::Storage(format!("Failed to serialize log: {e}")))?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| LogError::Storage(format!("Failed to write log: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| LogError::Storage(format!("Failed to replace log: {e}")))
    }
}

#[async_trait]
impl ConversationLog for JsonFileLog {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn append(&self, exchange: Exchange) -> Result<(), LogError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.push(exchange);
        self.write_all(&entries).await?;
        debug!(path = %self.path.display(), total = entries.len(), "Exchange appended");
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Exchange>, LogError> {
        let entries = self.read_all().await?;
        Ok(tail(&entries, limit).to_vec())
    }

    async fn count(&self) -> Result<usize, LogError> {
        Ok(self.read_all().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn log_in(dir: &tempfile::TempDir) -> JsonFileLog {
        JsonFileLog::new(dir.path().join("historico_conversas.json"))
    }

    #[tokio::test]
    async fn append_and_read_back_persists() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        log.append(Exchange::now("Como lidar com a insônia?", "Mantenha horários fixos.", true))
            .await
            .unwrap();

        let reopened = log_in(&dir);
        let entries = reopened.recent(5).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_text, "Como lidar com a insônia?");
    }

    #[tokio::test]
    async fn file_is_pretty_json_array_with_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        log.append(Exchange::now("Olá", "Atenção à hidratação", true)).await.unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert!(raw.starts_with("[\n  {"));
        assert!(raw.contains("\"user\": \"Olá\""));
        assert!(raw.contains("Atenção"));
        assert!(!dir.path().join("historico_conversas.json.tmp").exists());
    }

    #[tokio::test]
    async fn recent_returns_last_entries_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        for i in 0..8 {
            log.append(Exchange::now(format!("q{i}"), format!("a{i}"), true))
                .await
                .unwrap();
        }

        let recent = log.recent(5).await.unwrap();
        let users: Vec<_> = recent.iter().map(|e| e.user_text.as_str()).collect();
        assert_eq!(users, vec!["q3", "q4", "q5", "q6", "q7"]);
        assert_eq!(log.count().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn missing_and_blank_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        assert!(log.recent(5).await.unwrap().is_empty());

        std::fs::write(log.path(), "  \n").unwrap();
        assert_eq!(log.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn corrupted_log_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        std::fs::write(log.path(), "[{\"timestamp\": ").unwrap();

        assert!(matches!(log.recent(5).await, Err(LogError::Corrupted(_))));
        assert!(log.append(Exchange::now("a", "b", true)).await.is_err());
        assert_eq!(std::fs::read_to_string(log.path()).unwrap(), "[{\"timestamp\": ");
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(log_in(&dir));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move {
                    log.append(Exchange::now(format!("q{i}"), "a", true)).await
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(log.count().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn reads_log_written_by_earlier_deployments() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        std::fs::write(
            log.path(),
            r#"[
  {
    "timestamp": "2025-01-10 14:02:11",
    "user": "Meu pai não quer tomar banho",
    "assistant": "- Ofereça escolhas simples",
    "safe": true
  }
]"#,
        )
        .unwrap();

        let entries = log.recent(5).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].assistant_text, "- Ofereça escolhas simples");
    }
}

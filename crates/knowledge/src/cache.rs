//! On-disk snapshot cache for the knowledge index.
//!
//! Layout: `<cache_dir>/<cache_name>/index.json`. A snapshot that is
//! unreadable, corrupt, or stale is never an error here; the caller simply
//! rebuilds.

use careguide_core::error::KnowledgeError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::index::IndexSnapshot;

const SNAPSHOT_FILE: &str = "index.json";

pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Load a snapshot valid for `fingerprint`, if one exists.
    pub async fn load(&self, fingerprint: &str) -> Option<IndexSnapshot> {
        let path = self.path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No cached knowledge index");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read cached knowledge index");
                return None;
            }
        };

        let snapshot: IndexSnapshot = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cached knowledge index is corrupt; rebuilding");
                return None;
            }
        };

        match snapshot.validate(fingerprint) {
            Ok(()) => Some(snapshot),
            Err(reason) => {
                warn!(path = %path.display(), %reason, "Cached knowledge index is stale; rebuilding");
                None
            }
        }
    }

    /// Persist a snapshot, replacing any previous one atomically.
    pub async fn save(&self, snapshot: &IndexSnapshot) -> Result<(), KnowledgeError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| KnowledgeError::Cache(format!("Failed to create cache directory: {e}")))?;

        let json = serde_json::to_vec(snapshot)
            .map_err(|e| KnowledgeError::Cache(format!("Failed to serialize snapshot: {e}")))?;

        write_atomic(&self.path(), &json)
            .await
            .map_err(|e| KnowledgeError::Cache(format!("Failed to write snapshot: {e}")))
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

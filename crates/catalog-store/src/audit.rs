//! Audit log sinks: in-memory (tests, default) and JSONL file (persistent).

use catalog_types::{AuditEntry, AuditStore, AuditStoreError};
use tokio::io::AsyncWriteExt;

/// In-memory implementation of `AuditStore` (process lifetime only).
pub struct InMemoryAuditStore {
    entries: tokio::sync::RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self {
            entries: tokio::sync::RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of everything recorded so far. Not part of the `AuditStore`
    /// contract; the mutation path never reads the log.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditStoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}

/// JSONL file-backed `AuditStore`: one entry per line, append-only, persists
/// across restarts.
pub struct JsonlAuditStore {
    path: std::path::PathBuf,
    append_lock: tokio::sync::Mutex<()>,
}

impl JsonlAuditStore {
    pub fn new(path: impl AsRef<std::path::Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            append_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait::async_trait]
impl AuditStore for JsonlAuditStore {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditStoreError> {
        let _guard = self.append_lock.lock().await;
        let line = serde_json::to_string(&entry)
            .map_err(|e| AuditStoreError::Other(e.to_string()))?;
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AuditStoreError::Other(e.to_string()))?;
        f.write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| AuditStoreError::Other(e.to_string()))?;
        Ok(())
    }
}

//! Implements ConnectionStorePort using a single JSON file.
//!
//! One record per file; a missing or unparsable file reads as "no connection".

use crate::domain::{DomainError, StoredConnection};
use crate::ports::ConnectionStorePort;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// JSON file-based connection store.
pub struct ConnectionJson {
    path: std::path::PathBuf,
}

impl ConnectionJson {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Atomic save using the write-replace pattern:
    /// 1. Write to temp file
    /// 2. sync_all() to ensure flush to disk
    /// 3. Atomic rename to target path
    /// The stored record is therefore always absent or one coherent snapshot,
    /// never a partial write.
    async fn write_atomic(&self, json: &str) -> Result<(), DomainError> {
        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Store(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::Store(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Store(format!("sync temp file: {}", e)))?;
        drop(f); // Close file handle before rename

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::Store(format!("atomic rename failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ConnectionStorePort for ConnectionJson {
    async fn save(&self, record: &StoredConnection) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Store(format!("create data dir: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| DomainError::Store(e.to_string()))?;
        self.write_atomic(&json).await
    }

    async fn load(&self) -> Result<Option<StoredConnection>, DomainError> {
        match fs::read_to_string(&self.path).await {
            // Unparsable content is treated as absent, not an error.
            Ok(s) => Ok(serde_json::from_str(&s).ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::Store(format!("read connection file: {}", e))),
        }
    }

    async fn clear(&self) -> Result<(), DomainError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "stored connection removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::Store(format!("remove connection file: {}", e))),
        }
    }
}
